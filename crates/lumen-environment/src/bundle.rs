//! Lighting data published by a probe load

use crate::environment_map::EnvironmentMap;
use crate::harmonics::SphericalHarmonics;
use crate::lod::LodRange;
use lumen_asset::LightDescriptor;
use lumen_core::{Color, Vec3};

/// Directional sun light taken from the manifest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunLight {
    pub color: Color,
    /// Direction towards the light
    pub direction: Vec3,
    pub intensity: f32,
}

impl SunLight {
    /// Manifests store the direction light travels; the sun points back at its source
    pub fn from_descriptor(light: &LightDescriptor) -> Self {
        Self {
            color: light.color,
            direction: -light.direction,
            intensity: light.luminosity,
        }
    }

    /// The sun under the environment rotation
    pub fn rotated(&self, rotation: &glam::Mat4) -> Self {
        let direction = rotation.transform_vector3(self.direction.into());
        Self {
            direction: direction.into(),
            ..*self
        }
    }
}

/// Everything a material needs to be lit by one environment
#[derive(Debug, Clone)]
pub struct LightingBundle<T> {
    pub specular: EnvironmentMap<T>,
    /// Always a cubemap, sampled directly without mip filtering
    pub background: EnvironmentMap<T>,
    /// Absent on reduced-quality devices
    pub brdf_lut: Option<T>,
    pub harmonics: SphericalHarmonics,
    pub lod_range: LodRange,
    pub environment_size: u32,
    pub background_size: u32,
    pub sun: Option<SunLight>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn light() -> LightDescriptor {
        LightDescriptor {
            color: Color::from_rgb([1.0, 0.5, 0.25]),
            direction: Vec3::new(0.0, -1.0, 1.0),
            luminosity: 2.5,
        }
    }

    #[test]
    fn test_direction_is_negated() {
        let sun = SunLight::from_descriptor(&light());
        assert_eq!(sun.direction, Vec3::new(0.0, 1.0, -1.0));
        assert_eq!(sun.color, light().color);
        assert_eq!(sun.intensity, 2.5);
    }

    #[test]
    fn test_rotation_about_y() {
        let sun = SunLight {
            color: Color::WHITE,
            direction: Vec3::new(1.0, 0.5, 0.0),
            intensity: 1.0,
        };
        let rotated = sun.rotated(&glam::Mat4::from_rotation_y(FRAC_PI_2));
        assert!((rotated.direction.x - 0.0).abs() < 1e-6);
        assert!((rotated.direction.y - 0.5).abs() < 1e-6);
        assert!((rotated.direction.z + 1.0).abs() < 1e-6);
        assert_eq!(rotated.intensity, sun.intensity);
    }
}
