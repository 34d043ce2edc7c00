//! Lumen Shading - Equation selection and shader permutations
//!
//! A [`ShadingConfiguration`] captures which shading equations and feature
//! toggles are active. The [`PermutationCompiler`] turns a configuration
//! snapshot into a [`DefineSet`], always clearing the permutation-owned
//! symbols of the previous set before adding new ones.

mod change;
mod config;
mod defines;
mod equations;
mod permutation;

pub use change::{ShadingChange, Toggle};
pub use config::{
    check_range, EquationSelection, FeatureToggles, ShadingConfiguration, BRIGHTNESS_RANGE,
    ROTATION_RANGE,
};
pub use defines::DefineSet;
pub use equations::{Diffuse, Fresnel, Ndf, SpecularAo, ToneMapping, Visibility, FAMILIES};
pub use permutation::{PermutationCompiler, RESERVED_PREFIXES, TOGGLE_SYMBOLS};
