//! Uniform values and tables

use glam::{Mat3, Mat4};
use lumen_core::{Color, Shared};
use std::collections::BTreeMap;

/// Uniform names written by the binder
pub mod names {
    pub const DIFFUSE: &str = "diffuse";
    pub const OPACITY: &str = "opacity";
    pub const METALNESS: &str = "metalness";
    pub const ROUGHNESS: &str = "roughness";
    pub const EMISSIVE: &str = "emissive";
    pub const ENV_MAP: &str = "envMap";
    pub const SPECULAR_AA_VARIANCE: &str = "specularAAVariance";
    pub const SPECULAR_AA_THRESHOLD: &str = "specularAAThreshold";

    pub const ENVIRONMENT_SH: &str = "uEnvironmentSphericalHarmonics";
    pub const ENVIRONMENT_LOD_RANGE: &str = "uEnvironmentLodRange";
    pub const ENVIRONMENT_SIZE: &str = "uEnvironmentSize";
    pub const ENVIRONMENT_TRANSFORM: &str = "uEnvironmentTransform";
    pub const ENV_BRIGHTNESS: &str = "uEnvBrightness";
    pub const INTEGRATE_BRDF: &str = "uIntegrateBRDF";
    pub const SHADOW_DEPTH_RANGE: &str = "uShadowDepthRange";
    pub const MODEL_NORMAL_MATRIX: &str = "uModelNormalMatrix";

    pub const SUN_COLOR: &str = "directionalLightColor";
    pub const SUN_DIRECTION: &str = "directionalLightDirection";
    pub const SUN_INTENSITY: &str = "directionalLightIntensity";

    pub const SPECULAR_FACTOR: &str = "specularFactor";
    pub const GLOSSINESS_FACTOR: &str = "glossinessFactor";
    pub const SPECULAR_MAP: &str = "specularMap";
    pub const GLOSSINESS_MAP: &str = "glossinessMap";
}

/// A single uniform slot.
///
/// `Shared*` variants read through to a handle owned by an external
/// controller, so writes to the handle show up without rebinding.
#[derive(Debug, Clone)]
pub enum UniformValue<T> {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Color(Color),
    Mat3(Mat3),
    Mat4(Mat4),
    Texture(Option<T>),
    SphericalHarmonics([[f32; 3]; 9]),
    SharedFloat(Shared<f32>),
    SharedMat4(Shared<Mat4>),
}

impl<T> UniformValue<T> {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            UniformValue::Float(v) => Some(*v),
            UniformValue::SharedFloat(v) => Some(v.get()),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<[f32; 2]> {
        match self {
            UniformValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<[f32; 3]> {
        match self {
            UniformValue::Vec3(v) => Some(*v),
            UniformValue::Color(c) => Some(c.to_rgb()),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            UniformValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_mat3(&self) -> Option<Mat3> {
        match self {
            UniformValue::Mat3(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_mat4(&self) -> Option<Mat4> {
        match self {
            UniformValue::Mat4(m) => Some(*m),
            UniformValue::SharedMat4(m) => Some(m.get()),
            _ => None,
        }
    }

    /// The bound texture, `None` for empty slots and non-texture uniforms
    pub fn as_texture(&self) -> Option<&T> {
        match self {
            UniformValue::Texture(t) => t.as_ref(),
            _ => None,
        }
    }

    pub fn as_harmonics(&self) -> Option<&[[f32; 3]; 9]> {
        match self {
            UniformValue::SphericalHarmonics(sh) => Some(sh),
            _ => None,
        }
    }
}

/// Named uniforms of one material, kept in name order
#[derive(Debug, Clone)]
pub struct UniformTable<T> {
    entries: BTreeMap<String, UniformValue<T>>,
}

impl<T> Default for UniformTable<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> UniformTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: UniformValue<T>) {
        self.entries.insert(name.into(), value);
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: UniformValue<T>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue<T>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Overlay `other`; its entries win on name clashes
    pub fn merge(&mut self, other: UniformTable<T>) {
        self.entries.extend(other.entries);
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.get(name)?.as_float()
    }

    pub fn texture(&self, name: &str) -> Option<&T> {
        self.get(name)?.as_texture()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue<T>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
