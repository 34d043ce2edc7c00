//! Configuration to define-set compilation

use crate::change::Toggle;
use crate::config::ShadingConfiguration;
use crate::defines::DefineSet;
use crate::equations::{Diffuse, Fresnel, Ndf, SpecularAo, ToneMapping, Visibility};

/// Symbols owned by the boolean feature toggles
pub const TOGGLE_SYMBOLS: [&str; 6] = [
    "ENABLE_IBL",
    "ENABLE_LIGHT",
    "ENERGY_COMPENSATION",
    "GEOMETRIC_SPECULAR_AA",
    "MS_SPECULAR_AO",
    "MS_DIFFUSE_AO",
];

/// Prefixes owned by the equation families
pub const RESERVED_PREFIXES: [&str; 6] = [
    Diffuse::PREFIX,
    Fresnel::PREFIX,
    Ndf::PREFIX,
    Visibility::PREFIX,
    SpecularAo::PREFIX,
    ToneMapping::PREFIX,
];

/// Compiles a [`ShadingConfiguration`] into a [`DefineSet`].
///
/// Compilation is pure: the previous set is always supplied by the caller
/// and every permutation-owned symbol in it is dropped before the
/// configuration's symbols are added. Symbols outside that namespace
/// (workflow or quality defines) pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermutationCompiler;

impl PermutationCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Whether `symbol` belongs to the permutation-owned namespace
    pub fn is_reserved(symbol: &str) -> bool {
        TOGGLE_SYMBOLS.contains(&symbol)
            || RESERVED_PREFIXES
                .iter()
                .any(|prefix| symbol.starts_with(prefix))
    }

    pub fn compile(&self, config: &ShadingConfiguration, previous: &DefineSet) -> DefineSet {
        let mut defines = previous.clone();
        defines.retain(|symbol| !Self::is_reserved(symbol));

        for toggle in Toggle::ALL {
            if toggle.get(config) {
                defines.insert(toggle.symbol());
            }
        }
        defines.extend(config.equations.defines());

        if log::log_enabled!(log::Level::Debug) && defines != *previous {
            let dropped: Vec<&str> = previous.missing_from(&defines).collect();
            let added: Vec<&str> = defines.missing_from(previous).collect();
            log::debug!("Permutation defines: dropped {:?}, added {:?}", dropped, added);
        }

        defines
    }
}
