//! Lumen Render - wgpu side of the IBL pipeline
//!
//! [`WgpuBackend`] uploads packed environment payloads as cube and 2D
//! textures. The PBR shader is a single WGSL library specialized by
//! [`preprocess`] for each [`DefineSet`](lumen_shading::DefineSet);
//! [`PermutationCache`] keeps one compiled module per distinct set.

mod backend;
mod context;
mod preprocess;
mod shader_cache;
mod uniforms;

pub use backend::{GpuTexture, WgpuBackend, ENVIRONMENT_TEXTURE_FORMAT};
pub use context::{GpuContext, RenderError};
pub use preprocess::preprocess;
pub use shader_cache::{PermutationCache, PBR_IBL_SHADER};
pub use uniforms::EnvironmentBlock;

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_shading::{
        DefineSet, Diffuse, Fresnel, Ndf, PermutationCompiler, ShadingChange, ShadingConfiguration,
        SpecularAo, Toggle, ToneMapping, Visibility, TOGGLE_SYMBOLS,
    };

    fn parse(defines: &DefineSet) {
        let wgsl = preprocess(PBR_IBL_SHADER, defines).expect("pbr_ibl.wgsl failed to preprocess");
        if let Err(err) = naga::front::wgsl::parse_str(&wgsl) {
            panic!("pbr_ibl.wgsl failed to parse with [{defines}]: {}", err.emit_to_string(&wgsl));
        }
    }

    fn compiled(config: &ShadingConfiguration, extra: &[&str]) -> DefineSet {
        let previous: DefineSet = extra.iter().copied().collect();
        PermutationCompiler::new().compile(config, &previous)
    }

    #[test]
    fn pbr_ibl_wgsl_parses_for_every_equation() {
        let families: [(&str, Vec<&str>); 6] = [
            ("diffuse", Diffuse::ALL.iter().map(|v| v.name()).collect()),
            ("fresnel", Fresnel::ALL.iter().map(|v| v.name()).collect()),
            ("ndf", Ndf::ALL.iter().map(|v| v.name()).collect()),
            ("visibility", Visibility::ALL.iter().map(|v| v.name()).collect()),
            ("specular_ao", SpecularAo::ALL.iter().map(|v| v.name()).collect()),
            ("tone_mapping", ToneMapping::ALL.iter().map(|v| v.name()).collect()),
        ];
        for (family, values) in families {
            for value in values {
                let mut config = ShadingConfiguration::default();
                config.set_equation(family, value).unwrap();
                parse(&compiled(&config, &[]));
            }
        }
    }

    #[test]
    fn pbr_ibl_wgsl_parses_with_all_toggles() {
        let mut all_on = ShadingConfiguration::default();
        for toggle in Toggle::ALL {
            let change = ShadingChange::Toggle { toggle, enabled: true };
            let mut single = ShadingConfiguration::default();
            single.apply(std::slice::from_ref(&change)).unwrap();
            parse(&compiled(&single, &[]));
            all_on.apply(&[change]).unwrap();
        }
        let defines = compiled(&all_on, &[]);
        assert!(TOGGLE_SYMBOLS.iter().all(|s| defines.contains(s)));
        parse(&defines);
    }

    #[test]
    fn pbr_ibl_wgsl_parses_for_surface_variants() {
        let config = ShadingConfiguration::default();
        parse(&compiled(&config, &["MOBILE"]));
        parse(&compiled(&config, &["ENVMAP_PANORAMA", "MOBILE"]));
        parse(&compiled(
            &config,
            &[
                "USE_MAP",
                "USE_NORMALMAP",
                "USE_ROUGHNESSMAP",
                "USE_METALNESSMAP",
                "USE_AOMAP",
                "USE_EMISSIVEMAP",
            ],
        ));
        parse(&compiled(
            &config,
            &["SPECULAR_GLOSSINESS", "USE_SPECULARMAP", "USE_GLOSSINESSMAP", "USE_MAP"],
        ));
    }
}
