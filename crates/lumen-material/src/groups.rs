//! Standard uniform groups and PBR defaults

use crate::uniforms::{names, UniformTable, UniformValue};

/// Uniform groups merged into every PBR material, in merge order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardGroup {
    Common,
    NormalMap,
    LightMap,
    BumpMap,
    RoughnessMap,
    MetalnessMap,
    AoMap,
    EmissiveMap,
    DisplacementMap,
    EnvMap,
    Fog,
    Lights,
}

impl StandardGroup {
    pub const ALL: [StandardGroup; 12] = [
        StandardGroup::Common,
        StandardGroup::NormalMap,
        StandardGroup::LightMap,
        StandardGroup::BumpMap,
        StandardGroup::RoughnessMap,
        StandardGroup::MetalnessMap,
        StandardGroup::AoMap,
        StandardGroup::EmissiveMap,
        StandardGroup::DisplacementMap,
        StandardGroup::EnvMap,
        StandardGroup::Fog,
        StandardGroup::Lights,
    ];

    pub fn uniforms<T>(self) -> UniformTable<T> {
        use UniformValue::*;
        let table = UniformTable::new();
        match self {
            StandardGroup::Common => table
                .with(names::DIFFUSE, Color(lumen_core::Color::WHITE))
                .with(names::OPACITY, Float(1.0))
                .with("map", Texture(None))
                .with("uvTransform", Mat3(glam::Mat3::IDENTITY))
                .with("uv2Transform", Mat3(glam::Mat3::IDENTITY))
                .with("alphaMap", Texture(None))
                .with("alphaTest", Float(0.0)),
            StandardGroup::NormalMap => table
                .with("normalMap", Texture(None))
                .with("normalScale", Vec2([1.0, 1.0])),
            StandardGroup::LightMap => table
                .with("lightMap", Texture(None))
                .with("lightMapIntensity", Float(1.0)),
            StandardGroup::BumpMap => table
                .with("bumpMap", Texture(None))
                .with("bumpScale", Float(1.0)),
            StandardGroup::RoughnessMap => table.with("roughnessMap", Texture(None)),
            StandardGroup::MetalnessMap => table.with("metalnessMap", Texture(None)),
            StandardGroup::AoMap => table
                .with("aoMap", Texture(None))
                .with("aoMapIntensity", Float(1.0)),
            StandardGroup::EmissiveMap => table.with("emissiveMap", Texture(None)),
            StandardGroup::DisplacementMap => table
                .with("displacementMap", Texture(None))
                .with("displacementScale", Float(1.0))
                .with("displacementBias", Float(0.0)),
            StandardGroup::EnvMap => table
                .with(names::ENV_MAP, Texture(None))
                .with("flipEnvMap", Float(-1.0))
                .with("reflectivity", Float(1.0))
                .with("refractionRatio", Float(0.98)),
            StandardGroup::Fog => table
                .with("fogDensity", Float(0.00025))
                .with("fogNear", Float(1.0))
                .with("fogFar", Float(2000.0))
                .with("fogColor", Color(lumen_core::Color::WHITE)),
            StandardGroup::Lights => table
                .with("ambientLightColor", Vec3([0.0; 3]))
                .with(names::SUN_COLOR, Color(lumen_core::Color::WHITE))
                .with(names::SUN_DIRECTION, Vec3([0.0, 1.0, 0.0]))
                .with(names::SUN_INTENSITY, Float(0.0)),
        }
    }
}

/// PBR-specific uniforms, layered over the standard groups
pub fn pbr_defaults<T>() -> UniformTable<T> {
    use UniformValue::*;
    UniformTable::new()
        .with(names::EMISSIVE, Color(lumen_core::Color::BLACK))
        .with(names::ROUGHNESS, Float(1.0))
        .with(names::METALNESS, Float(0.0))
        .with(names::SPECULAR_AA_VARIANCE, Float(0.15))
        .with(names::SPECULAR_AA_THRESHOLD, Float(0.2))
        .with(names::ENVIRONMENT_TRANSFORM, Mat4(glam::Mat4::IDENTITY))
        .with(names::ENV_BRIGHTNESS, Float(1.0))
        .with(names::ENVIRONMENT_SH, SphericalHarmonics([[0.0; 3]; 9]))
        .with(names::ENVIRONMENT_LOD_RANGE, Vec2([0.0, 0.0]))
        .with(names::ENVIRONMENT_SIZE, Vec2([0.0, 0.0]))
        .with(names::INTEGRATE_BRDF, Texture(None))
        .with(names::SHADOW_DEPTH_RANGE, Vec2([0.5, 500.0]))
        .with(names::MODEL_NORMAL_MATRIX, Mat3(glam::Mat3::IDENTITY))
}

/// Every standard group followed by the PBR defaults
pub(crate) fn merged_defaults<T>() -> UniformTable<T> {
    let mut table = UniformTable::new();
    for group in StandardGroup::ALL {
        table.merge(group.uniforms());
    }
    table.merge(pbr_defaults());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_do_not_overlap() {
        let mut seen = std::collections::HashSet::new();
        for group in StandardGroup::ALL {
            for name in group.uniforms::<()>().names() {
                assert!(seen.insert(name.to_string()), "{name} declared twice");
            }
        }
    }

    #[test]
    fn test_merged_defaults_cover_environment_slots() {
        let table = merged_defaults::<()>();
        for name in [
            names::ENVIRONMENT_SH,
            names::ENVIRONMENT_LOD_RANGE,
            names::ENVIRONMENT_SIZE,
            names::INTEGRATE_BRDF,
            names::SHADOW_DEPTH_RANGE,
            names::MODEL_NORMAL_MATRIX,
            names::ENV_MAP,
            "fogColor",
            "displacementBias",
        ] {
            assert!(table.contains(name), "missing {name}");
        }
        assert_eq!(table.float(names::ROUGHNESS), Some(1.0));
    }
}
