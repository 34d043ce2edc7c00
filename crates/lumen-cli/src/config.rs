//! Layered configuration
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `LUMEN_ENVIRONMENT_ROOT`, `LUMEN_QUALITY`
//! 2. Project-local: `.lumen/config.toml`
//! 3. Global: `~/.lumen/config.toml`

use lumen_asset::join_url;
use lumen_core::{ConfigError, Result};
use lumen_environment::{BrdfLutSource, QualityTier, DEFAULT_LUT_SAMPLES, DEFAULT_LUT_SIZE, MAX_LUT_SIZE};
use lumen_shading::ShadingConfiguration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_SHADOW_DEPTH_RANGE: [f32; 2] = [0.5, 500.0];
const QUALITY_TIERS: [&str; 3] = ["auto", "full", "reduced"];
const BRDF_SOURCES: [&str; 2] = ["generated", "precomputed"];

/// Where environment packages live
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentSection {
    /// Directory or URL that package names are resolved against
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub packages: Vec<String>,
    /// Package used when a command is given none
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualitySection {
    /// `auto`, `full` or `reduced`
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub prefer_panorama: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadowSection {
    #[serde(default)]
    pub depth_range: Option<[f32; 2]>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrdfSection {
    /// `generated` or `precomputed`
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub samples: Option<u32>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LumenConfigFile {
    #[serde(default)]
    pub environment: EnvironmentSection,
    #[serde(default)]
    pub quality: QualitySection,
    /// Replaces the lower layer's shading block as a whole
    #[serde(default)]
    pub shading: Option<ShadingConfiguration>,
    #[serde(default)]
    pub shadow: ShadowSection,
    #[serde(default)]
    pub brdf: BrdfSection,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone)]
pub struct LumenConfig {
    pub environment_root: Option<String>,
    pub packages: Vec<String>,
    pub default_package: Option<String>,
    pub quality: QualityTier,
    pub prefer_panorama: bool,
    pub shading: ShadingConfiguration,
    pub shadow_depth_range: [f32; 2],
    pub brdf: BrdfLutSource,
}

impl Default for LumenConfig {
    fn default() -> Self {
        Self {
            environment_root: None,
            packages: Vec::new(),
            default_package: None,
            quality: QualityTier::Auto,
            prefer_panorama: false,
            shading: ShadingConfiguration::default(),
            shadow_depth_range: DEFAULT_SHADOW_DEPTH_RANGE,
            brdf: BrdfLutSource::default(),
        }
    }
}

impl LumenConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = LumenConfigFile::default();

        // Layer 1: Global config (~/.lumen/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        // Layer 2: Project-local config (.lumen/config.toml)
        let local_path = PathBuf::from(".lumen/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        // Layer 3: Environment variable overrides
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        Ok(Self::resolve(config)?)
    }

    /// Load config from a specific file path only
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(Self::resolve(config)?)
    }

    /// Validate a merged file into typed settings
    pub fn resolve(file: LumenConfigFile) -> std::result::Result<Self, ConfigError> {
        let quality = match file.quality.tier.as_deref() {
            Some(tier) => parse_quality_tier(tier)?,
            None => QualityTier::Auto,
        };

        let shading = file.shading.unwrap_or_default();
        shading.validate()?;

        let shadow_depth_range = file.shadow.depth_range.unwrap_or(DEFAULT_SHADOW_DEPTH_RANGE);
        let [near, far] = shadow_depth_range;
        if !(near > 0.0 && far > near) {
            return Err(ConfigError::Parse(format!(
                "shadow.depth_range must satisfy 0 < near < far, got [{}, {}]",
                near, far
            )));
        }

        Ok(LumenConfig {
            environment_root: file.environment.root,
            packages: file.environment.packages,
            default_package: file.environment.default,
            quality,
            prefer_panorama: file.quality.prefer_panorama.unwrap_or(false),
            shading,
            shadow_depth_range,
            brdf: resolve_brdf(&file.brdf)?,
        })
    }

    /// Base URL of a package: absolute paths and URLs pass through, bare
    /// names resolve against the environment root. Falls back to the
    /// configured default when `name` is absent.
    pub fn package_url(&self, name: Option<&str>) -> Option<String> {
        let name = name.or(self.default_package.as_deref())?;
        if name.contains("://") || Path::new(name).is_absolute() {
            return Some(name.to_string());
        }
        Some(match &self.environment_root {
            Some(root) => join_url(root, name),
            None => name.to_string(),
        })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".lumen").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<LumenConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let config: LumenConfigFile = toml::from_str(&content).map_err(|e| {
            ConfigError::Parse(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut LumenConfigFile, overlay: LumenConfigFile) {
        let env = overlay.environment;
        if env.root.is_some() {
            base.environment.root = env.root;
        }
        for package in env.packages {
            if !base.environment.packages.contains(&package) {
                base.environment.packages.push(package);
            }
        }
        if env.default.is_some() {
            base.environment.default = env.default;
        }

        if overlay.quality.tier.is_some() {
            base.quality.tier = overlay.quality.tier;
        }
        if overlay.quality.prefer_panorama.is_some() {
            base.quality.prefer_panorama = overlay.quality.prefer_panorama;
        }

        if overlay.shading.is_some() {
            base.shading = overlay.shading;
        }
        if overlay.shadow.depth_range.is_some() {
            base.shadow.depth_range = overlay.shadow.depth_range;
        }

        let brdf = overlay.brdf;
        if brdf.source.is_some() {
            base.brdf.source = brdf.source;
        }
        if brdf.path.is_some() {
            base.brdf.path = brdf.path;
        }
        if brdf.size.is_some() {
            base.brdf.size = brdf.size;
        }
        if brdf.samples.is_some() {
            base.brdf.samples = brdf.samples;
        }
    }

    fn apply_env_overrides(config: &mut LumenConfigFile, var: impl Fn(&str) -> Option<String>) {
        if let Some(root) = var("LUMEN_ENVIRONMENT_ROOT") {
            config.environment.root = Some(root);
        }
        if let Some(tier) = var("LUMEN_QUALITY") {
            config.quality.tier = Some(tier);
        }
    }
}

pub fn parse_quality_tier(value: &str) -> std::result::Result<QualityTier, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "auto" => Ok(QualityTier::Auto),
        "full" => Ok(QualityTier::Full),
        "reduced" => Ok(QualityTier::Reduced),
        _ => Err(ConfigError::InvalidOption {
            family: "quality.tier".to_string(),
            value: value.to_string(),
            allowed: QUALITY_TIERS.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

fn resolve_brdf(section: &BrdfSection) -> std::result::Result<BrdfLutSource, ConfigError> {
    let source = section.source.as_deref().unwrap_or("generated");
    match source {
        "generated" => {
            let size = section.size.unwrap_or(DEFAULT_LUT_SIZE);
            let samples = section.samples.unwrap_or(DEFAULT_LUT_SAMPLES);
            if size == 0 || samples == 0 {
                return Err(ConfigError::Parse(
                    "brdf.size and brdf.samples must be non-zero".to_string(),
                ));
            }
            if size > MAX_LUT_SIZE {
                return Err(ConfigError::Parse(format!(
                    "brdf.size {} exceeds the maximum of {}",
                    size, MAX_LUT_SIZE
                )));
            }
            Ok(BrdfLutSource::Generated { size, samples })
        }
        "precomputed" => match &section.path {
            Some(path) => Ok(BrdfLutSource::Precomputed { path: path.clone() }),
            None => Err(ConfigError::Parse(
                "brdf.source = \"precomputed\" needs brdf.path".to_string(),
            )),
        },
        other => Err(ConfigError::InvalidOption {
            family: "brdf.source".to_string(),
            value: other.to_string(),
            allowed: BRDF_SOURCES.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::LumenError;
    use lumen_shading::{Ndf, ToneMapping};

    fn temp_config(content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("lumen_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn parse(content: &str) -> LumenConfigFile {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_load_full_config() {
        let (dir, path) = temp_config(
            r#"
[environment]
root = "/srv/environments"
packages = ["studio", "forest"]
default = "studio"

[quality]
tier = "reduced"
prefer_panorama = true

[shading.equations]
ndf = "Beckmann"
tone_mapping = "Reinhard"

[shading.toggles]
specular_aa = true

[shadow]
depth_range = [1.0, 250.0]

[brdf]
source = "precomputed"
path = "brdf_ue4.png"
"#,
        );

        let config = LumenConfig::load_from_file(&path).unwrap();
        assert_eq!(config.packages, ["studio", "forest"]);
        assert_eq!(config.quality, QualityTier::Reduced);
        assert!(config.prefer_panorama);
        assert_eq!(config.shading.equations.ndf, Ndf::Beckmann);
        assert_eq!(config.shading.equations.tone_mapping, ToneMapping::Reinhard);
        assert!(config.shading.toggles.specular_aa);
        assert!(config.shading.toggles.enable_ibl);
        assert_eq!(config.shadow_depth_range, [1.0, 250.0]);
        assert_eq!(
            config.brdf,
            BrdfLutSource::Precomputed {
                path: "brdf_ue4.png".to_string()
            }
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = LumenConfig::resolve(parse("")).unwrap();
        assert_eq!(config.quality, QualityTier::Auto);
        assert_eq!(config.shading, ShadingConfiguration::default());
        assert_eq!(config.shadow_depth_range, DEFAULT_SHADOW_DEPTH_RANGE);
        assert_eq!(config.brdf, BrdfLutSource::default());
        assert_eq!(config.package_url(None), None);
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let (dir, path) = temp_config("[quality\ntier = ");
        match LumenConfig::load_from_file(&path) {
            Err(LumenError::Config(ConfigError::Parse(msg))) => {
                assert!(msg.contains("config.toml"), "{msg}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = LumenConfig::resolve(parse("[quality]\ntier = \"ultra\"")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOption { ref family, .. } if family == "quality.tier"));

        let err = LumenConfig::resolve(parse("[shading]\nenv_brightness = 3.5")).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));

        let err = LumenConfig::resolve(parse("[shadow]\ndepth_range = [10.0, 1.0]")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = LumenConfig::resolve(parse("[brdf]\nsource = \"precomputed\"")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = LumenConfig::resolve(parse("[brdf]\nsize = 40000")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(ref msg) if msg.contains("40000")));
        assert!(LumenConfig::resolve(parse("[brdf]\nsize = 4096")).is_ok());

        assert!(toml::from_str::<LumenConfigFile>("[shading.equations]\nndf = \"Phong\"").is_err());
    }

    #[test]
    fn test_local_layer_overrides_global() {
        let mut base = parse(
            r#"
[environment]
root = "/global"
packages = ["studio"]
[quality]
tier = "full"
prefer_panorama = true
[brdf]
size = 64
"#,
        );
        let overlay = parse(
            r#"
[environment]
packages = ["studio", "forest"]
[quality]
tier = "reduced"
[brdf]
samples = 32
"#,
        );
        LumenConfig::merge_into(&mut base, overlay);
        let config = LumenConfig::resolve(base).unwrap();

        assert_eq!(config.environment_root.as_deref(), Some("/global"));
        assert_eq!(config.packages, ["studio", "forest"]);
        assert_eq!(config.quality, QualityTier::Reduced);
        assert!(config.prefer_panorama);
        assert_eq!(config.brdf, BrdfLutSource::Generated { size: 64, samples: 32 });
    }

    #[test]
    fn test_env_overrides_win() {
        let mut file = parse("[environment]\nroot = \"/from-file\"\n[quality]\ntier = \"full\"");
        LumenConfig::apply_env_overrides(&mut file, |key| match key {
            "LUMEN_ENVIRONMENT_ROOT" => Some("https://cdn.example.com/env".to_string()),
            "LUMEN_QUALITY" => Some("Reduced".to_string()),
            _ => None,
        });
        let config = LumenConfig::resolve(file).unwrap();
        assert_eq!(config.environment_root.as_deref(), Some("https://cdn.example.com/env"));
        assert_eq!(config.quality, QualityTier::Reduced);
    }

    #[test]
    fn test_package_url_resolution() {
        let config = LumenConfig {
            environment_root: Some("https://cdn.example.com/env/".to_string()),
            default_package: Some("studio".to_string()),
            ..LumenConfig::default()
        };
        assert_eq!(
            config.package_url(None).as_deref(),
            Some("https://cdn.example.com/env/studio")
        );
        assert_eq!(
            config.package_url(Some("forest")).as_deref(),
            Some("https://cdn.example.com/env/forest")
        );
        assert_eq!(
            config.package_url(Some("/tmp/local")).as_deref(),
            Some("/tmp/local")
        );
        assert_eq!(
            config.package_url(Some("http://other/pkg")).as_deref(),
            Some("http://other/pkg")
        );
    }
}
