//! Source surface materials

use lumen_core::Color;
use std::collections::HashMap;

/// A parameter read from a source material
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue<T> {
    Float(f32),
    Vec2([f32; 2]),
    Color(Color),
    Texture(T),
}

/// Specular/glossiness parameterization of a source material
#[derive(Debug, Clone, PartialEq)]
pub struct SpecularGlossiness<T> {
    pub specular: Color,
    pub glossiness: f32,
    pub specular_map: Option<T>,
    pub glossiness_map: Option<T>,
}

/// The material a surface was imported with.
///
/// Parameters are looked up by name; workflow support is reported through
/// capability methods rather than by concrete type.
pub trait SourceMaterial<T> {
    fn name(&self) -> &str;

    fn parameter(&self, key: &str) -> Option<ParamValue<T>>;

    /// Base color, if the material declares one
    fn color(&self) -> Option<Color> {
        match self.parameter("color") {
            Some(ParamValue::Color(c)) => Some(c),
            _ => None,
        }
    }

    /// Present when the material uses the specular/glossiness workflow
    fn specular_glossiness(&self) -> Option<SpecularGlossiness<T>> {
        None
    }

    fn is_unlit(&self) -> bool {
        false
    }

    fn is_transparent(&self) -> bool {
        false
    }

    fn is_double_sided(&self) -> bool {
        false
    }
}

/// A plain, table-backed source material
#[derive(Debug, Clone)]
pub struct SurfaceMaterial<T> {
    pub name: String,
    params: HashMap<String, ParamValue<T>>,
    specular_glossiness: Option<SpecularGlossiness<T>>,
    pub unlit: bool,
    pub transparent: bool,
    pub double_sided: bool,
}

impl<T> SurfaceMaterial<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: HashMap::new(),
            specular_glossiness: None,
            unlit: false,
            transparent: false,
            double_sided: false,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue<T>) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_color(self, color: Color) -> Self {
        self.with_param("color", ParamValue::Color(color))
    }

    pub fn with_specular_glossiness(mut self, sg: SpecularGlossiness<T>) -> Self {
        self.specular_glossiness = Some(sg);
        self
    }

    pub fn unlit(mut self) -> Self {
        self.unlit = true;
        self
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: ParamValue<T>) {
        self.params.insert(key.into(), value);
    }
}

impl<T: Clone> SourceMaterial<T> for SurfaceMaterial<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter(&self, key: &str) -> Option<ParamValue<T>> {
        self.params.get(key).cloned()
    }

    fn specular_glossiness(&self) -> Option<SpecularGlossiness<T>> {
        self.specular_glossiness.clone()
    }

    fn is_unlit(&self) -> bool {
        self.unlit
    }

    fn is_transparent(&self) -> bool {
        self.transparent
    }

    fn is_double_sided(&self) -> bool {
        self.double_sided
    }
}
