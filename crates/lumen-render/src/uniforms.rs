//! GPU uniform block for the PBR/IBL shader

use bytemuck::{Pod, Zeroable};
use lumen_material::{names, MaterialInstance, UniformTable};

/// Per-material uniforms, laid out to match `EnvironmentBlock` in
/// `pbr_ibl.wgsl`. Every member is 16-byte aligned; scalars are packed
/// into `vec4`s.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct EnvironmentBlock {
    /// Band-normalized SH coefficients, rgb + padding
    pub spherical_harmonics: [[f32; 4]; 9],
    pub environment_transform: [[f32; 4]; 4],
    /// `mat3x3<f32>` columns, each padded to a vec4
    pub model_normal_matrix: [[f32; 4]; 3],
    pub diffuse: [f32; 4],
    /// rgb + unused
    pub emissive: [f32; 4],
    /// rgb + unused
    pub sun_color: [f32; 4],
    /// Direction towards the sun + intensity
    pub sun_direction: [f32; 4],
    /// max lod, min lod, environment size, brightness
    pub environment: [f32; 4],
    /// metalness, roughness, opacity, alpha test
    pub surface: [f32; 4],
    /// specular AA variance, threshold, shadow near, shadow far
    pub specular_aa_shadow: [f32; 4],
    /// Specular/glossiness workflow: specular rgb + glossiness
    pub specular_glossiness: [f32; 4],
}

impl EnvironmentBlock {
    pub fn from_instance<T>(instance: &MaterialInstance<T>) -> Self {
        let u = instance.uniforms();

        let mut spherical_harmonics = [[0.0; 4]; 9];
        if let Some(sh) = u.get(names::ENVIRONMENT_SH).and_then(|v| v.as_harmonics()) {
            for (dst, src) in spherical_harmonics.iter_mut().zip(sh) {
                *dst = [src[0], src[1], src[2], 0.0];
            }
        }

        let normal = instance.normal_matrix();
        let [max_lod, min_lod] = vec2(u, names::ENVIRONMENT_LOD_RANGE, [0.0, 0.0]);
        let [size, _] = vec2(u, names::ENVIRONMENT_SIZE, [0.0, 0.0]);
        let [near, far] = vec2(u, names::SHADOW_DEPTH_RANGE, [0.5, 500.0]);
        let diffuse = u
            .get(names::DIFFUSE)
            .and_then(|v| v.as_color())
            .map_or([1.0; 4], |c| c.to_array());

        Self {
            spherical_harmonics,
            environment_transform: instance.environment_transform().to_cols_array_2d(),
            model_normal_matrix: [
                normal.x_axis.extend(0.0).to_array(),
                normal.y_axis.extend(0.0).to_array(),
                normal.z_axis.extend(0.0).to_array(),
            ],
            diffuse,
            emissive: vec4(vec3(u, names::EMISSIVE), 0.0),
            sun_color: vec4(vec3(u, names::SUN_COLOR), 0.0),
            sun_direction: vec4(vec3(u, names::SUN_DIRECTION), scalar(u, names::SUN_INTENSITY, 0.0)),
            environment: [max_lod, min_lod, size, instance.environment_brightness()],
            surface: [
                scalar(u, names::METALNESS, 0.0),
                scalar(u, names::ROUGHNESS, 1.0),
                scalar(u, names::OPACITY, 1.0),
                scalar(u, "alphaTest", 0.0),
            ],
            specular_aa_shadow: [
                scalar(u, names::SPECULAR_AA_VARIANCE, 0.15),
                scalar(u, names::SPECULAR_AA_THRESHOLD, 0.2),
                near,
                far,
            ],
            specular_glossiness: vec4(
                vec3(u, names::SPECULAR_FACTOR),
                scalar(u, names::GLOSSINESS_FACTOR, 0.0),
            ),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

fn scalar<T>(table: &UniformTable<T>, name: &str, default: f32) -> f32 {
    table.float(name).unwrap_or(default)
}

fn vec2<T>(table: &UniformTable<T>, name: &str, default: [f32; 2]) -> [f32; 2] {
    table.get(name).and_then(|v| v.as_vec2()).unwrap_or(default)
}

fn vec3<T>(table: &UniformTable<T>, name: &str) -> [f32; 3] {
    table.get(name).and_then(|v| v.as_vec3()).unwrap_or([0.0; 3])
}

fn vec4(xyz: [f32; 3], w: f32) -> [f32; 4] {
    [xyz[0], xyz[1], xyz[2], w]
}
