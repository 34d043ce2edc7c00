//! Environment probe: manifest to lighting bundle

use crate::backend::{Capabilities, EnvironmentFormat, RenderBackend, TextureFilter};
use crate::brdf::{BrdfLutCache, BrdfLutSource};
use crate::bundle::{LightingBundle, SunLight};
use crate::environment_map::EnvironmentMap;
use crate::harmonics::SphericalHarmonics;
use crate::lod::LodRange;
use crate::payload::{PackedCubemap, PackedPanorama};
use lumen_asset::{join_url, AssetFetcher, AssetManifest, TextureDescriptor};
use lumen_core::ProbeError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

/// Manifest type of the prefiltered specular map
pub const SPECULAR_KIND: &str = "specular_ue4";
/// Manifest type of the background map
pub const BACKGROUND_KIND: &str = "background";
/// The only texel encoding the probe decodes
pub const LUV_ENCODING: &str = "luv";

/// Clears the in-flight flag when a load finishes or is dropped
struct LoadGuard<'a>(&'a Cell<bool>);

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Loads environment packages and keeps the current lighting bundle.
///
/// Only one load may be in flight at a time. A failed or abandoned load
/// never replaces the current bundle.
pub struct EnvironmentProbe<B: RenderBackend, F: AssetFetcher> {
    backend: B,
    fetcher: F,
    brdf_source: BrdfLutSource,
    brdf_cache: BrdfLutCache<B::Texture>,
    loading: Cell<bool>,
    current: RefCell<Option<Rc<LightingBundle<B::Texture>>>>,
}

impl<B: RenderBackend, F: AssetFetcher> EnvironmentProbe<B, F> {
    pub fn new(backend: B, fetcher: F) -> Self {
        Self {
            backend,
            fetcher,
            brdf_source: BrdfLutSource::default(),
            brdf_cache: BrdfLutCache::new(),
            loading: Cell::new(false),
            current: RefCell::new(None),
        }
    }

    /// Use `source` for the BRDF table and share `cache` with other probes
    pub fn with_brdf(mut self, source: BrdfLutSource, cache: BrdfLutCache<B::Texture>) -> Self {
        self.brdf_source = source;
        self.brdf_cache = cache;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn brdf_cache(&self) -> &BrdfLutCache<B::Texture> {
        &self.brdf_cache
    }

    /// Capability snapshot for the next load
    pub fn capabilities(&self, reduced_quality: bool) -> Capabilities {
        Capabilities::query(&self.backend, reduced_quality)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// The most recently published bundle
    pub fn current(&self) -> Option<Rc<LightingBundle<B::Texture>>> {
        self.current.borrow().clone()
    }

    /// Load the environment package at `base_url`.
    ///
    /// Specular, background and BRDF work run concurrently after the
    /// manifest arrives. Any failure aborts the whole load.
    pub async fn load(
        &self,
        base_url: &str,
        capabilities: Capabilities,
    ) -> Result<Rc<LightingBundle<B::Texture>>, ProbeError> {
        if self.loading.replace(true) {
            return Err(ProbeError::AlreadyLoading);
        }
        let _guard = LoadGuard(&self.loading);

        let manifest = AssetManifest::load(&self.fetcher, base_url).await?;

        let format = capabilities.specular_format();
        let specular_desc = find_required(&manifest, SPECULAR_KIND, format.as_str())?;
        let background_desc = find_required(&manifest, BACKGROUND_KIND, EnvironmentFormat::Cubemap.as_str())?;
        let lod_range = LodRange::from_dimensions(specular_desc.width, specular_desc.limit_size_or_default())?;

        let (specular, background, brdf_lut) = futures::try_join!(
            self.load_specular(base_url, specular_desc, format),
            self.load_background(base_url, background_desc),
            self.load_brdf(capabilities),
        )?;

        if specular.level_count() < lod_range.required_levels() {
            return Err(ProbeError::InvalidPayload {
                path: join_url(base_url, &specular_desc.file_path),
                reason: format!(
                    "{} mip levels, the LOD range samples {}",
                    specular.level_count(),
                    lod_range.required_levels()
                ),
            });
        }

        let bundle = Rc::new(LightingBundle {
            environment_size: specular.size(),
            background_size: background.size(),
            specular,
            background,
            brdf_lut,
            harmonics: SphericalHarmonics::from_raw(manifest.diffuse_sph()),
            lod_range,
            sun: manifest.sun_light().map(SunLight::from_descriptor),
        });

        *self.current.borrow_mut() = Some(Rc::clone(&bundle));
        log::info!(
            "Loaded environment {} ({} {}, LOD {}..{})",
            base_url,
            format,
            bundle.environment_size,
            lod_range.min_lod,
            lod_range.max_lod
        );
        Ok(bundle)
    }

    async fn load_specular(
        &self,
        base_url: &str,
        desc: &TextureDescriptor,
        format: EnvironmentFormat,
    ) -> Result<EnvironmentMap<B::Texture>, ProbeError> {
        let path = join_url(base_url, &desc.file_path);
        let bytes = self.fetcher.fetch(&path).await?;

        let map = match format {
            EnvironmentFormat::Cubemap => {
                let payload = PackedCubemap::from_bytes(&path, desc.width, bytes)?;
                let texture = self
                    .backend
                    .create_cubemap("environment.specular", &payload, TextureFilter::Trilinear);
                EnvironmentMap::Cubemap {
                    texture,
                    payload: Arc::new(payload),
                }
            }
            EnvironmentFormat::Panorama => {
                let payload = PackedPanorama::from_bytes(&path, desc.width, bytes)?;
                let texture = self.backend.create_panorama("environment.specular", &payload);
                EnvironmentMap::Panorama {
                    texture,
                    payload: Arc::new(payload),
                }
            }
        };
        Ok(map)
    }

    async fn load_background(
        &self,
        base_url: &str,
        desc: &TextureDescriptor,
    ) -> Result<EnvironmentMap<B::Texture>, ProbeError> {
        let path = join_url(base_url, &desc.file_path);
        let bytes = self.fetcher.fetch(&path).await?;
        let payload = PackedCubemap::from_bytes(&path, desc.width, bytes)?;
        let texture = self
            .backend
            .create_cubemap("environment.background", &payload, TextureFilter::Linear);
        Ok(EnvironmentMap::Cubemap {
            texture,
            payload: Arc::new(payload),
        })
    }

    async fn load_brdf(&self, capabilities: Capabilities) -> Result<Option<B::Texture>, ProbeError> {
        if capabilities.reduced_quality {
            log::warn!("Reduced quality: skipping BRDF integration table");
            return Ok(None);
        }
        if let Some(texture) = self.brdf_cache.get() {
            log::debug!("BRDF table cache hit");
            return Ok(Some(texture));
        }

        let lut = self.brdf_source.produce(&self.fetcher).await?;
        let texture = self
            .backend
            .create_texture_2d("environment.brdf", lut.width, lut.height, &lut.rgba);
        Ok(Some(self.brdf_cache.get_or_insert(texture)))
    }
}

fn find_required<'a>(
    manifest: &'a AssetManifest,
    kind: &str,
    format: &str,
) -> Result<&'a TextureDescriptor, ProbeError> {
    manifest
        .find(kind, LUV_ENCODING, format)
        .ok_or_else(|| ProbeError::MissingAsset {
            kind: kind.to_string(),
            encoding: LUV_ENCODING.to_string(),
            format: format.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use futures::FutureExt;
    use lumen_asset::MemoryFetcher;
    use lumen_core::{AssetError, Vec3};
    use std::future::Future;

    const BASE: &str = "envs/studio/";

    fn generated_lut() -> BrdfLutSource {
        BrdfLutSource::Generated { size: 8, samples: 16 }
    }

    fn manifest(specular_formats: &[&str], with_background: bool) -> String {
        let mut textures: Vec<String> = specular_formats
            .iter()
            .map(|format| {
                format!(
                    r#"{{ "type": "specular_ue4", "encoding": "luv", "format": "{format}", "limitSize": 4,
                         "images": [{{ "file": "specular_{format}.bin", "width": 16 }}] }}"#
                )
            })
            .collect();
        if with_background {
            textures.push(
                r#"{ "type": "background", "encoding": "luv", "format": "cubemap",
                     "images": [{ "file": "background.bin", "width": 8 }] }"#
                    .to_string(),
            );
        }
        let sph: Vec<String> = (0..9).map(|i| format!("[{}, {}, {}]", i, i, i)).collect();
        format!(
            r#"{{ "textures": [{}], "diffuseSPH": [{}],
                 "Lights": [{{ "color": [1, 1, 0.9], "direction": [0.5, -1, 0.25], "luminosity": 4 }}] }}"#,
            textures.join(","),
            sph.join(",")
        )
    }

    fn package(specular_formats: &[&str], with_background: bool) -> MemoryFetcher {
        let mut fetcher = MemoryFetcher::new().with(
            format!("{BASE}config.json"),
            manifest(specular_formats, with_background).into_bytes(),
        );
        fetcher.insert(
            format!("{BASE}specular_cubemap.bin"),
            PackedCubemap::filled(16, 5, [128, 128, 127, 0]).data().to_vec(),
        );
        fetcher.insert(
            format!("{BASE}specular_panorama.bin"),
            PackedPanorama::filled(16, 5, [128, 128, 127, 0]).data().to_vec(),
        );
        fetcher.insert(
            format!("{BASE}background.bin"),
            PackedCubemap::filled(8, 1, [128, 128, 127, 0]).data().to_vec(),
        );
        fetcher
    }

    fn probe(shader_lod: bool, fetcher: MemoryFetcher) -> EnvironmentProbe<CpuBackend, MemoryFetcher> {
        EnvironmentProbe::new(CpuBackend::new(shader_lod), fetcher).with_brdf(generated_lut(), BrdfLutCache::new())
    }

    #[test]
    fn test_full_load() {
        let probe = probe(true, package(&["cubemap", "panorama"], true));
        let caps = probe.capabilities(false);
        let bundle = pollster::block_on(probe.load(BASE, caps)).unwrap();

        assert_eq!(bundle.specular.format(), EnvironmentFormat::Cubemap);
        assert_eq!(bundle.background.format(), EnvironmentFormat::Cubemap);
        assert_eq!(bundle.lod_range, LodRange { max_lod: 4.0, min_lod: 2.0 });
        assert_eq!(bundle.environment_size, 16);
        assert_eq!(bundle.background_size, 8);
        assert!(bundle.brdf_lut.is_some());

        let sun = bundle.sun.unwrap();
        assert_eq!(sun.direction, Vec3::new(-0.5, 1.0, -0.25));
        assert_eq!(sun.intensity, 4.0);

        assert!(Rc::ptr_eq(&probe.current().unwrap(), &bundle));
        assert!(!probe.is_loading());
    }

    #[test]
    fn test_panorama_fallback_without_lod_support() {
        let probe = probe(false, package(&["panorama"], true));
        let caps = probe.capabilities(false);
        let bundle = pollster::block_on(probe.load(BASE, caps)).unwrap();
        assert_eq!(bundle.specular.format(), EnvironmentFormat::Panorama);
        assert_eq!(bundle.background.format(), EnvironmentFormat::Cubemap);
    }

    #[test]
    fn test_missing_specular_format() {
        let probe = probe(true, package(&["panorama"], true));
        let err = pollster::block_on(probe.load(BASE, Capabilities::full())).unwrap_err();
        assert!(matches!(err, ProbeError::MissingAsset { ref format, .. } if format == "cubemap"));
    }

    #[test]
    fn test_failed_load_keeps_previous_bundle() {
        let mut fetcher = package(&["cubemap"], true);
        fetcher.insert(
            "envs/broken/config.json",
            manifest(&["cubemap"], false).into_bytes(),
        );
        let probe = probe(true, fetcher);

        let first = pollster::block_on(probe.load(BASE, Capabilities::full())).unwrap();
        let err = pollster::block_on(probe.load("envs/broken", Capabilities::full())).unwrap_err();
        assert!(matches!(err, ProbeError::MissingAsset { ref kind, .. } if kind == "background"));
        assert!(Rc::ptr_eq(&probe.current().unwrap(), &first));
        assert!(!probe.is_loading());
    }

    #[test]
    fn test_fetch_failure_surfaces() {
        let probe = probe(true, MemoryFetcher::new());
        let err = pollster::block_on(probe.load(BASE, Capabilities::full())).unwrap_err();
        assert!(matches!(err, ProbeError::Asset(AssetError::FetchFailed { .. })));
        assert!(probe.current().is_none());
    }

    #[test]
    fn test_reduced_quality_skips_brdf() {
        let probe = probe(true, package(&["cubemap"], true));
        let caps = probe.capabilities(true);
        let bundle = pollster::block_on(probe.load(BASE, caps)).unwrap();
        assert!(bundle.brdf_lut.is_none());
        assert!(!probe.brdf_cache().is_populated());
    }

    #[test]
    fn test_brdf_is_created_once_across_loads() {
        let probe = probe(true, package(&["cubemap"], true));
        pollster::block_on(probe.load(BASE, Capabilities::full())).unwrap();
        pollster::block_on(probe.load(BASE, Capabilities::full())).unwrap();

        let lut_textures = probe
            .backend()
            .created()
            .iter()
            .filter(|t| t.label == "environment.brdf")
            .count();
        assert_eq!(lut_textures, 1);
    }

    #[test]
    fn test_shared_brdf_cache_across_probes() {
        let cache = BrdfLutCache::new();
        let first = EnvironmentProbe::new(CpuBackend::new(true), package(&["cubemap"], true))
            .with_brdf(generated_lut(), cache.clone());
        pollster::block_on(first.load(BASE, Capabilities::full())).unwrap();

        // No table source can succeed here; the shared cache must be used
        let second = EnvironmentProbe::new(CpuBackend::new(true), package(&["cubemap"], true)).with_brdf(
            BrdfLutSource::Precomputed {
                path: "missing.png".to_string(),
            },
            cache,
        );
        let bundle = pollster::block_on(second.load(BASE, Capabilities::full())).unwrap();
        assert!(bundle.brdf_lut.is_some());
    }

    #[test]
    fn test_invalid_payload() {
        let mut fetcher = package(&["cubemap"], true);
        fetcher.insert(format!("{BASE}specular_cubemap.bin"), vec![0u8; 100]);
        let probe = probe(true, fetcher);
        let err = pollster::block_on(probe.load(BASE, Capabilities::full())).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidPayload { .. }));
    }

    fn with_limit_one(mut fetcher: MemoryFetcher) -> MemoryFetcher {
        let config = manifest(&["cubemap"], true).replace(r#""limitSize": 4"#, r#""limitSize": 1"#);
        fetcher.insert(format!("{BASE}config.json"), config.into_bytes());
        fetcher
    }

    #[test]
    fn test_short_mip_chain_rejected() {
        let mut fetcher = with_limit_one(package(&["cubemap"], true));
        fetcher.insert(
            format!("{BASE}specular_cubemap.bin"),
            PackedCubemap::filled(16, 1, [128, 128, 127, 0]).data().to_vec(),
        );
        let probe = probe(true, fetcher);
        let err = pollster::block_on(probe.load(BASE, Capabilities::full())).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::InvalidPayload { ref path, .. } if path == "envs/studio/specular_cubemap.bin"
        ));
        assert!(probe.current().is_none());
        assert!(!probe.is_loading());
    }

    #[test]
    fn test_full_chain_with_limit_one() {
        let probe = probe(true, with_limit_one(package(&["cubemap"], true)));
        let bundle = pollster::block_on(probe.load(BASE, Capabilities::full())).unwrap();
        assert_eq!(bundle.lod_range, LodRange { max_lod: 4.0, min_lod: 4.0 });
        assert_eq!(bundle.specular.level_count(), 5);
    }

    /// Never resolves, standing in for a slow network
    struct PendingFetcher;

    impl AssetFetcher for PendingFetcher {
        fn fetch(&self, _path: &str) -> impl Future<Output = Result<Vec<u8>, AssetError>> {
            futures::future::pending()
        }
    }

    #[test]
    fn test_second_load_while_in_flight_is_rejected() {
        let probe = EnvironmentProbe::new(CpuBackend::new(true), PendingFetcher);
        let mut first = Box::pin(probe.load(BASE, Capabilities::full()));
        assert!((&mut first).now_or_never().is_none());
        assert!(probe.is_loading());

        let second = pollster::block_on(probe.load(BASE, Capabilities::full()));
        assert!(matches!(second, Err(ProbeError::AlreadyLoading)));

        // Abandoning the first load frees the probe and publishes nothing
        drop(first);
        assert!(!probe.is_loading());
        assert!(probe.current().is_none());
    }
}
