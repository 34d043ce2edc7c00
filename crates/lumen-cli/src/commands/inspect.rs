//! Inspect command

use super::{is_remote, package_base};
use crate::config::LumenConfig;
use anyhow::{Context, Result};
use lumen_asset::{AssetFetcher, AssetManifest, FileFetcher, HttpFetcher};
use lumen_environment::{EnvironmentFormat, LodRange, SphericalHarmonics, BACKGROUND_KIND, LUV_ENCODING, SPECULAR_KIND};
use serde_json::{json, Value};

pub fn run(config: &LumenConfig, package: Option<&str>, format: &str) -> Result<()> {
    let base = package_base(config, package)?;
    let manifest = if is_remote(&base) {
        load_manifest(&HttpFetcher::new(), &base)
    } else {
        load_manifest(&FileFetcher::new(), &base)
    }
    .with_context(|| format!("Failed to load manifest from {}", base))?;

    let output = match format {
        "json" => serde_json::to_string_pretty(&manifest_summary(&manifest))?,
        "text" => format_text(&base, &manifest),
        _ => anyhow::bail!("Unknown format: {}", format),
    };
    println!("{}", output);

    Ok(())
}

fn load_manifest<F: AssetFetcher>(fetcher: &F, base: &str) -> Result<AssetManifest, lumen_core::AssetError> {
    pollster::block_on(AssetManifest::load(fetcher, base))
}

/// Which specular layouts a probe could pick from this package
fn loadable_formats(manifest: &AssetManifest) -> Vec<&'static str> {
    let has_background = manifest
        .find(BACKGROUND_KIND, LUV_ENCODING, EnvironmentFormat::Cubemap.as_str())
        .is_some();
    [EnvironmentFormat::Cubemap, EnvironmentFormat::Panorama]
        .into_iter()
        .filter(|format| {
            has_background
                && manifest
                    .find(SPECULAR_KIND, LUV_ENCODING, format.as_str())
                    .and_then(|t| LodRange::from_dimensions(t.width, t.limit_size_or_default()).ok())
                    .is_some()
        })
        .map(EnvironmentFormat::as_str)
        .collect()
}

fn manifest_summary(manifest: &AssetManifest) -> Value {
    let textures: Vec<Value> = manifest
        .textures()
        .iter()
        .map(|t| {
            json!({
                "type": t.kind,
                "encoding": t.encoding,
                "format": t.format,
                "width": t.width,
                "limitSize": t.limit_size_or_default(),
                "file": t.file_path,
            })
        })
        .collect();
    let lights: Vec<Value> = manifest
        .lights()
        .iter()
        .map(|l| {
            json!({
                "color": l.color.to_rgb(),
                "direction": l.direction.to_array(),
                "luminosity": l.luminosity,
            })
        })
        .collect();
    let harmonics = SphericalHarmonics::from_raw(manifest.diffuse_sph());

    json!({
        "textures": textures,
        "diffuseSPH": manifest.diffuse_sph(),
        "irradianceUp": harmonics.irradiance(lumen_core::Vec3::UP),
        "lights": lights,
        "loadable": loadable_formats(manifest),
    })
}

fn format_text(base: &str, manifest: &AssetManifest) -> String {
    let mut out = format!("Environment package: {}\n", base);

    out.push_str(&format!("Textures ({}):\n", manifest.textures().len()));
    for t in manifest.textures() {
        out.push_str(&format!(
            "  {:<14} {:<6} {:<9} {:>5}px  limit {:<4} {}\n",
            t.kind,
            t.encoding,
            t.format,
            t.width,
            t.limit_size_or_default(),
            t.file_path
        ));
    }

    let up = SphericalHarmonics::from_raw(manifest.diffuse_sph()).irradiance(lumen_core::Vec3::UP);
    out.push_str(&format!(
        "Irradiance (up): [{:.3}, {:.3}, {:.3}]\n",
        up[0], up[1], up[2]
    ));

    match manifest.sun_light() {
        Some(sun) => out.push_str(&format!(
            "Sun: direction {:?}, luminosity {}, {} light(s) declared\n",
            sun.direction.to_array(),
            sun.luminosity,
            manifest.lights().len()
        )),
        None => out.push_str("Sun: none\n"),
    }

    let formats = loadable_formats(manifest);
    if formats.is_empty() {
        out.push_str("Loadable: no (missing luv specular or background texture)");
    } else {
        out.push_str(&format!("Loadable: {}", formats.join(", ")));
    }
    out
}
