//! Shading configuration value object

use crate::equations::{Diffuse, Fresnel, Ndf, SpecularAo, ToneMapping, Visibility, FAMILIES};
use lumen_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Accepted environment brightness multipliers
pub const BRIGHTNESS_RANGE: (f32, f32) = (0.0, 2.0);
/// Accepted environment rotation, in radians
pub const ROTATION_RANGE: (f32, f32) = (-PI, PI);
pub(crate) const UNIT_RANGE: (f32, f32) = (0.0, 1.0);

/// Boolean feature toggles that compile to defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub enable_ibl: bool,
    pub enable_light: bool,
    pub energy_compensation: bool,
    pub specular_aa: bool,
    pub ms_specular_ao: bool,
    pub ms_diffuse_ao: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            enable_ibl: true,
            enable_light: true,
            energy_compensation: true,
            specular_aa: false,
            ms_specular_ao: false,
            ms_diffuse_ao: false,
        }
    }
}

/// One active equation per family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EquationSelection {
    pub diffuse: Diffuse,
    pub fresnel: Fresnel,
    pub ndf: Ndf,
    pub visibility: Visibility,
    pub specular_ao: SpecularAo,
    pub tone_mapping: ToneMapping,
}

impl EquationSelection {
    /// The selected symbol of every family
    pub fn defines(&self) -> [String; 6] {
        [
            self.diffuse.define(),
            self.fresnel.define(),
            self.ndf.define(),
            self.visibility.define(),
            self.specular_ao.define(),
            self.tone_mapping.define(),
        ]
    }
}

/// User-selected shading equations, toggles, and continuous parameters.
///
/// Toggles and equations are the permutation-relevant part: two
/// configurations that agree on them compile to the same define set.
/// Continuous parameters only ever reach uniforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfiguration {
    pub toggles: FeatureToggles,
    pub equations: EquationSelection,
    env_rotation: f32,
    env_brightness: f32,
    metalness_override: Option<f32>,
    roughness_override: Option<f32>,
    specular_aa_variance: f32,
    specular_aa_threshold: f32,
}

impl Default for ShadingConfiguration {
    fn default() -> Self {
        Self {
            toggles: FeatureToggles::default(),
            equations: EquationSelection::default(),
            env_rotation: 0.0,
            env_brightness: 1.0,
            metalness_override: None,
            roughness_override: None,
            specular_aa_variance: 0.15,
            specular_aa_threshold: 0.2,
        }
    }
}

impl ShadingConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an equation by family and value name
    pub fn set_equation(&mut self, family: &str, value: &str) -> Result<(), ConfigError> {
        match family {
            Diffuse::FAMILY => self.equations.diffuse = value.parse()?,
            Fresnel::FAMILY => self.equations.fresnel = value.parse()?,
            Ndf::FAMILY => self.equations.ndf = value.parse()?,
            Visibility::FAMILY => self.equations.visibility = value.parse()?,
            SpecularAo::FAMILY => self.equations.specular_ao = value.parse()?,
            ToneMapping::FAMILY => self.equations.tone_mapping = value.parse()?,
            _ => {
                return Err(ConfigError::InvalidOption {
                    family: "family".to_string(),
                    value: family.to_string(),
                    allowed: FAMILIES.iter().map(|f| f.to_string()).collect(),
                })
            }
        }
        Ok(())
    }

    /// Name of the active equation in `family`
    pub fn equation(&self, family: &str) -> Option<&'static str> {
        let eq = &self.equations;
        match family {
            Diffuse::FAMILY => Some(eq.diffuse.name()),
            Fresnel::FAMILY => Some(eq.fresnel.name()),
            Ndf::FAMILY => Some(eq.ndf.name()),
            Visibility::FAMILY => Some(eq.visibility.name()),
            SpecularAo::FAMILY => Some(eq.specular_ao.name()),
            ToneMapping::FAMILY => Some(eq.tone_mapping.name()),
            _ => None,
        }
    }

    /// Environment rotation around +Y, in radians
    pub fn env_rotation(&self) -> f32 {
        self.env_rotation
    }

    pub fn set_env_rotation(&mut self, radians: f32) -> Result<(), ConfigError> {
        self.env_rotation = check_range("env_rotation", ROTATION_RANGE, radians)?;
        Ok(())
    }

    pub fn env_brightness(&self) -> f32 {
        self.env_brightness
    }

    pub fn set_env_brightness(&mut self, brightness: f32) -> Result<(), ConfigError> {
        self.env_brightness = check_range("env_brightness", BRIGHTNESS_RANGE, brightness)?;
        Ok(())
    }

    pub fn metalness_override(&self) -> Option<f32> {
        self.metalness_override
    }

    pub fn set_metalness_override(&mut self, value: Option<f32>) -> Result<(), ConfigError> {
        self.metalness_override = check_optional("metalness", value)?;
        Ok(())
    }

    pub fn roughness_override(&self) -> Option<f32> {
        self.roughness_override
    }

    pub fn set_roughness_override(&mut self, value: Option<f32>) -> Result<(), ConfigError> {
        self.roughness_override = check_optional("roughness", value)?;
        Ok(())
    }

    pub fn specular_aa_variance(&self) -> f32 {
        self.specular_aa_variance
    }

    pub fn set_specular_aa_variance(&mut self, value: f32) -> Result<(), ConfigError> {
        self.specular_aa_variance = check_range("specular_aa_variance", UNIT_RANGE, value)?;
        Ok(())
    }

    pub fn specular_aa_threshold(&self) -> f32 {
        self.specular_aa_threshold
    }

    pub fn set_specular_aa_threshold(&mut self, value: f32) -> Result<(), ConfigError> {
        self.specular_aa_threshold = check_range("specular_aa_threshold", UNIT_RANGE, value)?;
        Ok(())
    }

    /// Re-check every continuous parameter.
    ///
    /// Deserialized configurations bypass the setters, so loaders call
    /// this before handing a configuration to the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("env_rotation", ROTATION_RANGE, self.env_rotation)?;
        check_range("env_brightness", BRIGHTNESS_RANGE, self.env_brightness)?;
        check_optional("metalness", self.metalness_override)?;
        check_optional("roughness", self.roughness_override)?;
        check_range("specular_aa_variance", UNIT_RANGE, self.specular_aa_variance)?;
        check_range("specular_aa_threshold", UNIT_RANGE, self.specular_aa_threshold)?;
        Ok(())
    }

    /// Whether `other` compiles to the same permutation
    pub fn same_permutation(&self, other: &Self) -> bool {
        self.toggles == other.toggles && self.equations == other.equations
    }
}

/// `value` if it is finite and inside `[min, max]`
pub fn check_range(field: &str, (min, max): (f32, f32), value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value,
        })
    }
}

fn check_optional(field: &str, value: Option<f32>) -> Result<Option<f32>, ConfigError> {
    value.map(|v| check_range(field, UNIT_RANGE, v)).transpose()
}
