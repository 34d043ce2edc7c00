//! Probe command

use super::{is_remote, package_base};
use crate::config::LumenConfig;
use anyhow::{Context, Result};
use lumen_asset::{AssetFetcher, FileFetcher, HttpFetcher};
use lumen_core::Vec3;
use lumen_environment::{BrdfLutCache, CpuBackend, EnvironmentProbe, LightingBundle, QualityTier, RenderBackend};
use lumen_material::{EnvironmentControls, MaterialBinder, MaterialInstance, SharedUniforms, SurfaceMaterial};
use lumen_render::{EnvironmentBlock, GpuContext, PermutationCache, WgpuBackend};

pub struct ProbeArgs {
    pub package: Option<String>,
    pub gpu: bool,
    pub quality: Option<QualityTier>,
    pub panorama: bool,
}

pub fn run(config: &LumenConfig, args: ProbeArgs) -> Result<()> {
    let base = package_base(config, args.package.as_deref())?;
    let tier = args.quality.unwrap_or(config.quality);
    let prefer_panorama = args.panorama || config.prefer_panorama;

    if args.gpu {
        let context = GpuContext::headless_blocking().context("Failed to create headless GPU device")?;
        println!(
            "Device: {} ({:?})",
            context.adapter_info.name, context.adapter_info.backend
        );
        let reduced = tier.is_reduced(context.detect_reduced_quality());
        let backend = WgpuBackend::new(&context).with_prefer_panorama(prefer_panorama);

        let instance = if is_remote(&base) {
            load_and_bind(backend, HttpFetcher::new(), &base, reduced, config)?
        } else {
            load_and_bind(backend, FileFetcher::new(), &base, reduced, config)?
        };

        let block = EnvironmentBlock::from_instance(&instance);
        let mut cache = PermutationCache::pbr_ibl();
        cache
            .shader_module(&context.device, instance.defines())
            .context("Preview surface shader failed to compile")?;
        println!(
            "Shader: compiled, uniform block {} bytes",
            block.as_bytes().len()
        );
    } else {
        let reduced = tier.is_reduced(false);
        let backend = CpuBackend::new(!prefer_panorama);
        if is_remote(&base) {
            load_and_bind(backend, HttpFetcher::new(), &base, reduced, config)?;
        } else {
            load_and_bind(backend, FileFetcher::new(), &base, reduced, config)?;
        }
    }

    Ok(())
}

/// Load the package, print what arrived, and bind a default surface to it
fn load_and_bind<B, F>(
    backend: B,
    fetcher: F,
    base: &str,
    reduced_quality: bool,
    config: &LumenConfig,
) -> Result<MaterialInstance<B::Texture>>
where
    B: RenderBackend,
    F: AssetFetcher,
{
    let probe = EnvironmentProbe::new(backend, fetcher).with_brdf(config.brdf.clone(), BrdfLutCache::new());
    let capabilities = probe.capabilities(reduced_quality);
    let bundle = pollster::block_on(probe.load(base, capabilities))
        .with_context(|| format!("Failed to load environment {}", base))?;
    println!("{}", describe(base, &*bundle));

    let shared = SharedUniforms {
        shadow_depth_range: config.shadow_depth_range,
        ..SharedUniforms::default()
    };
    let mut controls = EnvironmentControls::new(&shared);
    controls.apply_configuration(&config.shading)?;

    let binder = MaterialBinder::new(config.shading.clone(), capabilities.reduced_quality);
    let surface = SurfaceMaterial::new("preview");
    let instance = binder.bind(&surface, &*bundle, &shared)?;
    println!("Preview defines: {}", instance.defines());

    if let Some(sun) = &bundle.sun {
        let sun = controls.sun(sun);
        println!("Sun (rotated): {:?}", sun.direction.to_array());
    }

    Ok(instance)
}

fn describe<T>(base: &str, bundle: &LightingBundle<T>) -> String {
    let up = bundle.harmonics.irradiance(Vec3::UP);
    let mut out = format!("Environment: {}\n", base);
    out.push_str(&format!(
        "  Specular:   {} {}px, {} levels, LOD {}..{}\n",
        bundle.specular.format(),
        bundle.environment_size,
        bundle.specular.level_count(),
        bundle.lod_range.min_lod,
        bundle.lod_range.max_lod
    ));
    out.push_str(&format!("  Background: cubemap {}px\n", bundle.background_size));
    out.push_str(&format!(
        "  BRDF LUT:   {}\n",
        if bundle.brdf_lut.is_some() { "bound" } else { "skipped (reduced quality)" }
    ));
    out.push_str(&format!(
        "  Irradiance: [{:.3}, {:.3}, {:.3}] (up)",
        up[0], up[1], up[2]
    ));
    if let Some(sun) = &bundle.sun {
        out.push_str(&format!(
            "\n  Sun:        {:?} x {}",
            sun.direction.to_array(),
            sun.intensity
        ));
    }
    out
}
