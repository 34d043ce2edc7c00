//! Per-surface bound material

use crate::uniforms::{names, UniformTable, UniformValue};
use glam::{Mat3, Mat4};
use lumen_shading::DefineSet;

/// A surface's PBR material: uniforms, defines, and recompile state
#[derive(Debug, Clone)]
pub struct MaterialInstance<T> {
    pub(crate) name: String,
    pub(crate) uniforms: UniformTable<T>,
    pub(crate) defines: DefineSet,
    pub(crate) needs_recompile: bool,
    pub(crate) transparent: bool,
    pub(crate) double_sided: bool,
    /// Source values restored when an override is lifted
    pub(crate) base_metalness: f32,
    pub(crate) base_roughness: f32,
}

impl<T> MaterialInstance<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniforms(&self) -> &UniformTable<T> {
        &self.uniforms
    }

    /// Direct uniform access; writes never trigger recompilation
    pub fn uniforms_mut(&mut self) -> &mut UniformTable<T> {
        &mut self.uniforms
    }

    pub fn defines(&self) -> &DefineSet {
        &self.defines
    }

    pub fn needs_recompile(&self) -> bool {
        self.needs_recompile
    }

    /// Acknowledge that the shader for the current defines is built
    pub fn mark_compiled(&mut self) {
        self.needs_recompile = false;
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn is_double_sided(&self) -> bool {
        self.double_sided
    }

    /// Write `uModelNormalMatrix` for the surface's world transform
    pub fn update_normal_matrix(&mut self, model: &Mat4) {
        self.uniforms
            .set(names::MODEL_NORMAL_MATRIX, UniformValue::Mat3(normal_matrix(model)));
    }

    pub fn normal_matrix(&self) -> Mat3 {
        self.uniforms
            .get(names::MODEL_NORMAL_MATRIX)
            .and_then(UniformValue::as_mat3)
            .unwrap_or(Mat3::IDENTITY)
    }

    /// Current value of the shared environment rotation
    pub fn environment_transform(&self) -> Mat4 {
        self.uniforms
            .get(names::ENVIRONMENT_TRANSFORM)
            .and_then(UniformValue::as_mat4)
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Current value of the shared environment brightness
    pub fn environment_brightness(&self) -> f32 {
        self.uniforms.float(names::ENV_BRIGHTNESS).unwrap_or(1.0)
    }
}

/// Inverse-transpose of the upper 3x3; identity for singular transforms
pub(crate) fn normal_matrix(model: &Mat4) -> Mat3 {
    let m = Mat3::from_mat4(*model);
    let det = m.determinant();
    if det.abs() <= f32::EPSILON || !det.is_finite() {
        return Mat3::IDENTITY;
    }
    m.inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_normal_matrix_of_rotation_is_rotation() {
        let rot = Mat4::from_rotation_y(0.7);
        let n = normal_matrix(&rot);
        assert!(n.abs_diff_eq(Mat3::from_mat4(rot), 1e-5));
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(&model);
        assert!((n.x_axis.x - 0.5).abs() < 1e-6);
        assert!((n.y_axis.y - 1.0).abs() < 1e-6);
        // Translation does not leak in
        let moved = Mat4::from_scale_rotation_translation(Vec3::new(2.0, 1.0, 1.0), glam::Quat::IDENTITY, Vec3::splat(5.0));
        assert!(normal_matrix(&moved).abs_diff_eq(n, 1e-6));
    }

    #[test]
    fn test_singular_transform_falls_back_to_identity() {
        let flat = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(normal_matrix(&flat), Mat3::IDENTITY);
    }
}
