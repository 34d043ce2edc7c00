//! Writer side of the shared environment uniforms

use crate::binder::SharedUniforms;
use glam::Mat4;
use lumen_core::{ConfigError, Shared};
use lumen_environment::SunLight;
use lumen_shading::{check_range, ShadingChange, ShadingConfiguration, BRIGHTNESS_RANGE, ROTATION_RANGE};
use std::f32::consts::{PI, TAU};

/// The single writer of the environment rotation and brightness.
///
/// Every bound [`MaterialInstance`](crate::MaterialInstance) holds the same
/// handles, so a write here is seen by all of them on the next frame.
#[derive(Debug, Clone)]
pub struct EnvironmentControls {
    transform: Shared<Mat4>,
    brightness: Shared<f32>,
    rotation: f32,
}

impl EnvironmentControls {
    pub fn new(shared: &SharedUniforms) -> Self {
        Self {
            transform: shared.environment_transform.clone(),
            brightness: shared.environment_brightness.clone(),
            rotation: 0.0,
        }
    }

    /// Rotation around +Y, in radians
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn brightness(&self) -> f32 {
        self.brightness.get()
    }

    pub fn transform(&self) -> Mat4 {
        self.transform.get()
    }

    pub fn set_rotation(&mut self, radians: f32) -> Result<(), ConfigError> {
        self.rotation = check_range("env_rotation", ROTATION_RANGE, radians)?;
        self.transform.set(Mat4::from_rotation_y(self.rotation));
        Ok(())
    }

    /// Turn by `delta`, wrapping into `[-PI, PI]`
    pub fn rotate_by(&mut self, delta: f32) -> Result<(), ConfigError> {
        if !delta.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "env_rotation".to_string(),
                min: -PI,
                max: PI,
                value: delta,
            });
        }
        let wrapped = (self.rotation + delta + PI).rem_euclid(TAU) - PI;
        self.set_rotation(wrapped)
    }

    pub fn set_brightness(&mut self, brightness: f32) -> Result<(), ConfigError> {
        let brightness = check_range("env_brightness", BRIGHTNESS_RANGE, brightness)?;
        self.brightness.set(brightness);
        Ok(())
    }

    /// Write the configuration's rotation and brightness
    pub fn apply_configuration(&mut self, config: &ShadingConfiguration) -> Result<(), ConfigError> {
        self.set_rotation(config.env_rotation())?;
        self.set_brightness(config.env_brightness())
    }

    /// Handle a control intent; returns whether it touched the shared handles
    pub fn handle(&mut self, change: &ShadingChange) -> Result<bool, ConfigError> {
        match change {
            ShadingChange::EnvRotation(radians) => self.set_rotation(*radians).map(|_| true),
            ShadingChange::EnvBrightness(value) => self.set_brightness(*value).map(|_| true),
            _ => Ok(false),
        }
    }

    /// `sun` as seen under the current rotation
    pub fn sun(&self, sun: &SunLight) -> SunLight {
        sun.rotated(&self.transform.get())
    }
}
