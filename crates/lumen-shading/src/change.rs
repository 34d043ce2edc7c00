//! Control intents applied to a shading configuration

use crate::config::ShadingConfiguration;
use lumen_core::ConfigError;
use std::fmt;
use std::str::FromStr;

/// A boolean feature toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    Ibl,
    Light,
    EnergyCompensation,
    SpecularAa,
    MsSpecularAo,
    MsDiffuseAo,
}

impl Toggle {
    pub const ALL: [Toggle; 6] = [
        Toggle::Ibl,
        Toggle::Light,
        Toggle::EnergyCompensation,
        Toggle::SpecularAa,
        Toggle::MsSpecularAo,
        Toggle::MsDiffuseAo,
    ];

    /// Configuration key
    pub fn key(self) -> &'static str {
        match self {
            Toggle::Ibl => "enable_ibl",
            Toggle::Light => "enable_light",
            Toggle::EnergyCompensation => "energy_compensation",
            Toggle::SpecularAa => "specular_aa",
            Toggle::MsSpecularAo => "ms_specular_ao",
            Toggle::MsDiffuseAo => "ms_diffuse_ao",
        }
    }

    /// Preprocessor symbol set while the toggle is on
    pub fn symbol(self) -> &'static str {
        match self {
            Toggle::Ibl => "ENABLE_IBL",
            Toggle::Light => "ENABLE_LIGHT",
            Toggle::EnergyCompensation => "ENERGY_COMPENSATION",
            Toggle::SpecularAa => "GEOMETRIC_SPECULAR_AA",
            Toggle::MsSpecularAo => "MS_SPECULAR_AO",
            Toggle::MsDiffuseAo => "MS_DIFFUSE_AO",
        }
    }

    pub fn get(self, config: &ShadingConfiguration) -> bool {
        let t = &config.toggles;
        match self {
            Toggle::Ibl => t.enable_ibl,
            Toggle::Light => t.enable_light,
            Toggle::EnergyCompensation => t.energy_compensation,
            Toggle::SpecularAa => t.specular_aa,
            Toggle::MsSpecularAo => t.ms_specular_ao,
            Toggle::MsDiffuseAo => t.ms_diffuse_ao,
        }
    }

    fn set(self, config: &mut ShadingConfiguration, enabled: bool) {
        let t = &mut config.toggles;
        match self {
            Toggle::Ibl => t.enable_ibl = enabled,
            Toggle::Light => t.enable_light = enabled,
            Toggle::EnergyCompensation => t.energy_compensation = enabled,
            Toggle::SpecularAa => t.specular_aa = enabled,
            Toggle::MsSpecularAo => t.ms_specular_ao = enabled,
            Toggle::MsDiffuseAo => t.ms_diffuse_ao = enabled,
        }
    }
}

impl FromStr for Toggle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Toggle::ALL
            .into_iter()
            .find(|t| t.key() == s)
            .ok_or_else(|| ConfigError::InvalidOption {
                family: "toggle".to_string(),
                value: s.to_string(),
                allowed: Toggle::ALL.iter().map(|t| t.key().to_string()).collect(),
            })
    }
}

/// One requested change to a [`ShadingConfiguration`].
///
/// Control surfaces emit these instead of mutating engine state directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ShadingChange {
    Equation { family: String, value: String },
    Toggle { toggle: Toggle, enabled: bool },
    EnvRotation(f32),
    EnvBrightness(f32),
    Metalness(Option<f32>),
    Roughness(Option<f32>),
    SpecularAaVariance(f32),
    SpecularAaThreshold(f32),
}

impl ShadingChange {
    /// Whether applying this change can alter the compiled define set
    pub fn affects_permutation(&self) -> bool {
        matches!(self, ShadingChange::Equation { .. } | ShadingChange::Toggle { .. })
    }

    fn apply_to(&self, config: &mut ShadingConfiguration) -> Result<(), ConfigError> {
        match self {
            ShadingChange::Equation { family, value } => config.set_equation(family, value),
            ShadingChange::Toggle { toggle, enabled } => {
                toggle.set(config, *enabled);
                Ok(())
            }
            ShadingChange::EnvRotation(v) => config.set_env_rotation(*v),
            ShadingChange::EnvBrightness(v) => config.set_env_brightness(*v),
            ShadingChange::Metalness(v) => config.set_metalness_override(*v),
            ShadingChange::Roughness(v) => config.set_roughness_override(*v),
            ShadingChange::SpecularAaVariance(v) => config.set_specular_aa_variance(*v),
            ShadingChange::SpecularAaThreshold(v) => config.set_specular_aa_threshold(*v),
        }
    }
}

impl ShadingConfiguration {
    /// Apply a batch of changes atomically.
    ///
    /// Either every change is applied or, on the first invalid one, the
    /// configuration is left exactly as it was. Returns whether the
    /// permutation-relevant state changed.
    pub fn apply(&mut self, changes: &[ShadingChange]) -> Result<bool, ConfigError> {
        let mut next = self.clone();
        for change in changes {
            change.apply_to(&mut next)?;
        }
        let recompile = !self.same_permutation(&next);
        *self = next;
        Ok(recompile)
    }
}

/// Parses `key=value` assignments as typed on a command line
impl FromStr for ShadingChange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::Parse(format!("expected key=value, got '{}'", s)))?;
        let (key, value) = (key.trim(), value.trim());

        if crate::FAMILIES.contains(&key) {
            return Ok(ShadingChange::Equation {
                family: key.to_string(),
                value: value.to_string(),
            });
        }

        match key {
            "env_rotation" => Ok(ShadingChange::EnvRotation(parse_f32(key, value)?)),
            "env_brightness" => Ok(ShadingChange::EnvBrightness(parse_f32(key, value)?)),
            "metalness" => Ok(ShadingChange::Metalness(parse_override(key, value)?)),
            "roughness" => Ok(ShadingChange::Roughness(parse_override(key, value)?)),
            "specular_aa_variance" => Ok(ShadingChange::SpecularAaVariance(parse_f32(key, value)?)),
            "specular_aa_threshold" => {
                Ok(ShadingChange::SpecularAaThreshold(parse_f32(key, value)?))
            }
            _ => {
                let toggle: Toggle = key.parse()?;
                let enabled = value.parse::<bool>().map_err(|_| {
                    ConfigError::Parse(format!("{} expects true or false, got '{}'", key, value))
                })?;
                Ok(ShadingChange::Toggle { toggle, enabled })
            }
        }
    }
}

impl fmt::Display for ShadingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadingChange::Equation { family, value } => write!(f, "{}={}", family, value),
            ShadingChange::Toggle { toggle, enabled } => write!(f, "{}={}", toggle.key(), enabled),
            ShadingChange::EnvRotation(v) => write!(f, "env_rotation={}", v),
            ShadingChange::EnvBrightness(v) => write!(f, "env_brightness={}", v),
            ShadingChange::Metalness(v) => write!(f, "metalness={}", fmt_override(*v)),
            ShadingChange::Roughness(v) => write!(f, "roughness={}", fmt_override(*v)),
            ShadingChange::SpecularAaVariance(v) => write!(f, "specular_aa_variance={}", v),
            ShadingChange::SpecularAaThreshold(v) => write!(f, "specular_aa_threshold={}", v),
        }
    }
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Parse(format!("{} expects a number, got '{}'", key, value)))
}

fn parse_override(key: &str, value: &str) -> Result<Option<f32>, ConfigError> {
    if value.eq_ignore_ascii_case("none") {
        Ok(None)
    } else {
        parse_f32(key, value).map(Some)
    }
}

fn fmt_override(value: Option<f32>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}
