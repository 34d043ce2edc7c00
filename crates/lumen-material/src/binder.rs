//! Binding source materials and lighting bundles into material instances

use crate::groups::merged_defaults;
use crate::instance::MaterialInstance;
use crate::surface::{ParamValue, SourceMaterial};
use crate::uniforms::{names, UniformTable, UniformValue};
use glam::Mat4;
use lumen_core::{Color, MaterialError, Shared};
use lumen_environment::{EnvironmentFormat, LightingBundle};
use lumen_shading::{DefineSet, PermutationCompiler, ShadingConfiguration};

/// Texture parameters copied from the source material
pub const SYNC_MAPS: [&str; 10] = [
    "map",
    "alphaMap",
    "normalMap",
    "roughnessMap",
    "metalnessMap",
    "aoMap",
    "emissiveMap",
    "displacementMap",
    "lightMap",
    "bumpMap",
];

/// Scalar and color parameters copied from the source material
pub const SYNC_UNIFORMS: [&str; 12] = [
    "opacity",
    "alphaTest",
    "roughness",
    "metalness",
    "emissive",
    "normalScale",
    "aoMapIntensity",
    "lightMapIntensity",
    "bumpScale",
    "displacementScale",
    "displacementBias",
    "envMapIntensity",
];

/// Values shared by every bound material, written by one controller
#[derive(Debug, Clone)]
pub struct SharedUniforms {
    pub environment_transform: Shared<Mat4>,
    pub environment_brightness: Shared<f32>,
    /// Sun shadow camera `[near, far]`
    pub shadow_depth_range: [f32; 2],
}

impl Default for SharedUniforms {
    fn default() -> Self {
        Self {
            environment_transform: Shared::new(Mat4::IDENTITY),
            environment_brightness: Shared::new(1.0),
            shadow_depth_range: [0.5, 500.0],
        }
    }
}

/// Builds and refreshes [`MaterialInstance`]s.
///
/// `bind` rebuilds an instance from scratch; `refresh` only recompiles
/// defines and rewrites the configuration's continuous parameters.
#[derive(Debug, Clone, Default)]
pub struct MaterialBinder {
    compiler: PermutationCompiler,
    config: ShadingConfiguration,
    reduced_quality: bool,
}

impl MaterialBinder {
    pub fn new(config: ShadingConfiguration, reduced_quality: bool) -> Self {
        Self {
            compiler: PermutationCompiler::new(),
            config,
            reduced_quality,
        }
    }

    /// Configuration used by subsequent binds
    pub fn configuration(&self) -> &ShadingConfiguration {
        &self.config
    }

    pub fn set_configuration(&mut self, config: ShadingConfiguration) {
        self.config = config;
    }

    pub fn reduced_quality(&self) -> bool {
        self.reduced_quality
    }

    pub fn bind<T, S>(
        &self,
        surface: &S,
        bundle: &LightingBundle<T>,
        shared: &SharedUniforms,
    ) -> Result<MaterialInstance<T>, MaterialError>
    where
        T: Clone,
        S: SourceMaterial<T> + ?Sized,
    {
        if surface.is_unlit() {
            return Err(MaterialError::UnsupportedWorkflow(format!(
                "'{}' is unlit",
                surface.name()
            )));
        }

        let mut uniforms: UniformTable<T> = merged_defaults();
        let mut defines = DefineSet::new();

        sync_parameters(surface, &mut uniforms, &mut defines);
        bind_environment(bundle, shared, &mut uniforms, &mut defines);

        if let Some(sg) = surface.specular_glossiness() {
            defines.insert("SPECULAR_GLOSSINESS");
            if let Some(map) = sg.specular_map {
                defines.insert("USE_SPECULARMAP");
                uniforms.set(names::SPECULAR_MAP, UniformValue::Texture(Some(map)));
            }
            if let Some(map) = sg.glossiness_map {
                defines.insert("USE_GLOSSINESSMAP");
                uniforms.set(names::GLOSSINESS_MAP, UniformValue::Texture(Some(map)));
            }
            uniforms.set(names::SPECULAR_FACTOR, UniformValue::Color(sg.specular));
            uniforms.set(names::GLOSSINESS_FACTOR, UniformValue::Float(sg.glossiness));
        }

        if self.reduced_quality {
            defines.insert("MOBILE");
        }

        let defines = self.compiler.compile(&self.config, &defines);
        log::debug!("Bound '{}' with defines [{}]", surface.name(), defines);

        let mut instance = MaterialInstance {
            name: surface.name().to_string(),
            base_metalness: uniforms.float(names::METALNESS).unwrap_or(0.0),
            base_roughness: uniforms.float(names::ROUGHNESS).unwrap_or(1.0),
            uniforms,
            defines,
            needs_recompile: true,
            transparent: surface.is_transparent(),
            double_sided: surface.is_double_sided(),
        };
        write_continuous(&mut instance, &self.config);
        Ok(instance)
    }

    /// Patch `instance` for a new configuration.
    ///
    /// Returns `true` when the define set changed and the instance now
    /// needs recompilation.
    pub fn refresh<T>(&self, instance: &mut MaterialInstance<T>, config: &ShadingConfiguration) -> bool {
        let next = self.compiler.compile(config, &instance.defines);
        let changed = next != instance.defines;
        if changed {
            log::debug!(
                "Defines of '{}' changed: [{}] -> [{}]",
                instance.name,
                instance.defines,
                next
            );
            instance.defines = next;
            instance.needs_recompile = true;
        }
        write_continuous(instance, config);
        changed
    }
}

fn sync_parameters<T, S>(surface: &S, uniforms: &mut UniformTable<T>, defines: &mut DefineSet)
where
    S: SourceMaterial<T> + ?Sized,
{
    for key in SYNC_MAPS {
        match surface.parameter(key) {
            Some(ParamValue::Texture(texture)) => {
                uniforms.set(key, UniformValue::Texture(Some(texture)));
                defines.insert(format!("USE_{}", key.to_uppercase()));
            }
            Some(_) => log::debug!("'{}': {} is not a texture, skipped", surface.name(), key),
            None => {}
        }
    }

    for key in SYNC_UNIFORMS {
        let value = match surface.parameter(key) {
            Some(ParamValue::Float(v)) => UniformValue::Float(v),
            Some(ParamValue::Vec2(v)) => UniformValue::Vec2(v),
            Some(ParamValue::Color(c)) => UniformValue::Color(c),
            Some(ParamValue::Texture(_)) => {
                log::debug!("'{}': {} is a texture, skipped", surface.name(), key);
                continue;
            }
            None => continue,
        };
        uniforms.set(key, value);
    }

    let diffuse = surface.color().unwrap_or(Color::WHITE);
    uniforms.set(names::DIFFUSE, UniformValue::Color(diffuse));
}

fn bind_environment<T: Clone>(
    bundle: &LightingBundle<T>,
    shared: &SharedUniforms,
    uniforms: &mut UniformTable<T>,
    defines: &mut DefineSet,
) {
    let size = bundle.environment_size as f32;
    uniforms.set(names::ENV_MAP, UniformValue::Texture(Some(bundle.specular.texture().clone())));
    uniforms.set(
        names::ENVIRONMENT_SH,
        UniformValue::SphericalHarmonics(*bundle.harmonics.coefficients()),
    );
    uniforms.set(names::ENVIRONMENT_LOD_RANGE, UniformValue::Vec2(bundle.lod_range.to_array()));
    uniforms.set(names::ENVIRONMENT_SIZE, UniformValue::Vec2([size, size]));
    uniforms.set(names::INTEGRATE_BRDF, UniformValue::Texture(bundle.brdf_lut.clone()));
    uniforms.set(names::SHADOW_DEPTH_RANGE, UniformValue::Vec2(shared.shadow_depth_range));
    uniforms.set(
        names::ENVIRONMENT_TRANSFORM,
        UniformValue::SharedMat4(shared.environment_transform.clone()),
    );
    uniforms.set(
        names::ENV_BRIGHTNESS,
        UniformValue::SharedFloat(shared.environment_brightness.clone()),
    );

    if let Some(sun) = &bundle.sun {
        uniforms.set(names::SUN_COLOR, UniformValue::Color(sun.color));
        uniforms.set(names::SUN_DIRECTION, UniformValue::Vec3(sun.direction.to_array()));
        uniforms.set(names::SUN_INTENSITY, UniformValue::Float(sun.intensity));
    }

    if bundle.specular.format() == EnvironmentFormat::Panorama {
        defines.insert("ENVMAP_PANORAMA");
    }
}

/// Configuration parameters that live in uniforms rather than defines
fn write_continuous<T>(instance: &mut MaterialInstance<T>, config: &ShadingConfiguration) {
    let metalness = config.metalness_override().unwrap_or(instance.base_metalness);
    let roughness = config.roughness_override().unwrap_or(instance.base_roughness);
    let u = &mut instance.uniforms;
    u.set(names::METALNESS, UniformValue::Float(metalness));
    u.set(names::ROUGHNESS, UniformValue::Float(roughness));
    u.set(
        names::SPECULAR_AA_VARIANCE,
        UniformValue::Float(config.specular_aa_variance()),
    );
    u.set(
        names::SPECULAR_AA_THRESHOLD,
        UniformValue::Float(config.specular_aa_threshold()),
    );
}
