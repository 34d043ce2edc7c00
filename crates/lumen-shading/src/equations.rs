//! Closed sets of shading equations, one enum per family

use lumen_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Family names accepted by [`crate::ShadingConfiguration::set_equation`]
pub const FAMILIES: [&str; 6] = [
    Diffuse::FAMILY,
    Fresnel::FAMILY,
    Ndf::FAMILY,
    Visibility::FAMILY,
    SpecularAo::FAMILY,
    ToneMapping::FAMILY,
];

macro_rules! equation_family {
    (
        $(#[$meta:meta])*
        $name:ident, family = $family:literal, prefix = $prefix:literal,
        { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Family name used in configuration and error messages
            pub const FAMILY: &'static str = $family;
            /// Define prefix owned by this family
            pub const PREFIX: &'static str = $prefix;
            /// Every value, in declaration order; the first is the default
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// The preprocessor symbol selecting this equation
            pub fn define(self) -> String {
                format!("{}{}", Self::PREFIX, self.name().to_uppercase())
            }

            pub fn allowed() -> Vec<String> {
                Self::ALL.iter().map(|v| v.name().to_string()).collect()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ConfigError::InvalidOption {
                        family: Self::FAMILY.to_string(),
                        value: s.to_string(),
                        allowed: Self::allowed(),
                    })
            }
        }
    };
}

equation_family! {
    /// Diffuse BRDF
    Diffuse, family = "diffuse", prefix = "DIFFUSE_", {
        Lambert => "Lambert",
        Burley => "Burley",
        OrenNayar => "OrenNayar",
    }
}

equation_family! {
    /// Specular Fresnel term
    Fresnel, family = "fresnel", prefix = "F_", {
        Schlick => "Schlick",
        CookTorrance => "CookTorrance",
        SphericalGaussian => "SphericalGaussian",
    }
}

equation_family! {
    /// Specular normal distribution function
    Ndf, family = "ndf", prefix = "NDF_", {
        Ggx => "GGX",
        BlinnPhong => "BlinnPhong",
        Beckmann => "Beckmann",
    }
}

equation_family! {
    /// Specular visibility (geometry) term
    Visibility, family = "visibility", prefix = "V_", {
        SmithCorrelated => "SmithCorrelated",
        SmithCorrelatedFast => "SmithCorrelatedFast",
        Kelemen => "Kelemen",
        Neubelt => "Neubelt",
        Implicit => "Implicit",
    }
}

equation_family! {
    /// Specular ambient occlusion approximation
    SpecularAo, family = "specular_ao", prefix = "SPECULAR_AO_", {
        Lagarde => "Lagarde",
        Simple => "Simple",
        Off => "Off",
    }
}

equation_family! {
    /// Output tone mapping operator
    ToneMapping, family = "tone_mapping", prefix = "TONE_MAPPING_", {
        Linear => "Linear",
        Reinhard => "Reinhard",
        Cineon => "Cineon",
        AcesFilmic => "ACESFilmic",
    }
}
