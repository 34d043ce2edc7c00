//! Split-sum BRDF integration lookup table

use glam::Vec3;
use lumen_asset::AssetFetcher;
use lumen_core::{AssetError, ProbeError};
use std::cell::RefCell;
use std::f32::consts::PI;
use std::fmt;
use std::rc::Rc;

/// Edge length of a generated table
pub const DEFAULT_LUT_SIZE: u32 = 128;
/// Hammersley samples per generated texel
pub const DEFAULT_LUT_SAMPLES: u32 = 256;
/// Largest edge length [`generate_brdf_lut`] will produce
pub const MAX_LUT_SIZE: u32 = 4096;

/// RGBA8 lookup table: red holds the Fresnel scale, green the bias.
///
/// Columns are `n.v` and rows are roughness, both increasing from the
/// origin at the first texel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrdfLut {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl BrdfLut {
    /// Decode a precomputed table from an encoded image (PNG, JPEG, ...)
    pub fn from_image_bytes(path: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| AssetError::InvalidImage {
                path: path.to_string(),
                reason: e.to_string(),
            })?
            .to_rgba8();
        Ok(Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        })
    }

    /// The table as an image, for writing to disk
    pub fn to_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
    }

    /// Nearest `(scale, bias)` entry
    pub fn lookup(&self, n_dot_v: f32, roughness: f32) -> (f32, f32) {
        if self.width == 0 || self.height == 0 {
            return (0.0, 0.0);
        }
        let x = ((n_dot_v.clamp(0.0, 1.0) * self.width as f32) as u32).min(self.width - 1);
        let y = ((roughness.clamp(0.0, 1.0) * self.height as f32) as u32).min(self.height - 1);
        let i = (y as usize * self.width as usize + x as usize) * 4;
        match self.rgba.get(i..i + 2) {
            Some(t) => (t[0] as f32 / 255.0, t[1] as f32 / 255.0),
            None => (0.0, 0.0),
        }
    }
}

/// Integrate the split-sum table on the CPU
pub fn generate_brdf_lut(size: u32, samples: u32) -> BrdfLut {
    let size = size.clamp(1, MAX_LUT_SIZE);
    let samples = samples.max(1);
    let mut rgba = Vec::with_capacity(size as usize * size as usize * 4);

    for y in 0..size {
        let roughness = (y as f32 + 0.5) / size as f32;
        for x in 0..size {
            let n_dot_v = (x as f32 + 0.5) / size as f32;
            let (scale, bias) = integrate(n_dot_v, roughness, samples);
            rgba.extend_from_slice(&[to_unorm(scale), to_unorm(bias), 0, 255]);
        }
    }

    BrdfLut {
        width: size,
        height: size,
        rgba,
    }
}

fn to_unorm(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn integrate(n_dot_v: f32, roughness: f32, samples: u32) -> (f32, f32) {
    let v = Vec3::new((1.0 - n_dot_v * n_dot_v).max(0.0).sqrt(), 0.0, n_dot_v);
    let alpha = roughness * roughness;
    let (mut scale, mut bias) = (0.0f32, 0.0f32);

    for i in 0..samples {
        let (u1, u2) = hammersley(i, samples);
        let h = sample_ggx(u1, u2, alpha);
        let l = 2.0 * v.dot(h) * h - v;

        let n_dot_l = l.z.max(0.0);
        if n_dot_l <= 0.0 {
            continue;
        }
        let n_dot_h = h.z.max(0.0);
        let v_dot_h = v.dot(h).max(0.0);

        let g = smith_ibl(n_dot_v, alpha) * smith_ibl(n_dot_l, alpha);
        let g_vis = g * v_dot_h / (n_dot_h * n_dot_v).max(1e-4);
        let fc = (1.0 - v_dot_h).powi(5);
        scale += (1.0 - fc) * g_vis;
        bias += fc * g_vis;
    }

    let n = samples as f32;
    (scale / n, bias / n)
}

/// Tangent-space half vector for GGX with `alpha = roughness^2`
fn sample_ggx(u1: f32, u2: f32, alpha: f32) -> Vec3 {
    let phi = 2.0 * PI * u1;
    let a2 = alpha * alpha;
    let cos_theta = ((1.0 - u2) / (1.0 + (a2 - 1.0) * u2)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Schlick-Smith G1 with the image-based-lighting remap `k = alpha / 2`
fn smith_ibl(n_dot_x: f32, alpha: f32) -> f32 {
    let k = alpha * 0.5;
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

fn hammersley(i: u32, n: u32) -> (f32, f32) {
    (i as f32 / n as f32, i.reverse_bits() as f32 * 2.328_306_4e-10)
}

/// Where the BRDF integration table comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrdfLutSource {
    /// An encoded image, fetched through the asset fetcher
    Precomputed { path: String },
    /// Integrated on the CPU at first use
    Generated { size: u32, samples: u32 },
}

impl Default for BrdfLutSource {
    fn default() -> Self {
        BrdfLutSource::Generated {
            size: DEFAULT_LUT_SIZE,
            samples: DEFAULT_LUT_SAMPLES,
        }
    }
}

impl BrdfLutSource {
    pub async fn produce<F: AssetFetcher + ?Sized>(&self, fetcher: &F) -> Result<BrdfLut, ProbeError> {
        match self {
            BrdfLutSource::Precomputed { path } => {
                let bytes = fetcher.fetch(path).await?;
                Ok(BrdfLut::from_image_bytes(path, &bytes)?)
            }
            BrdfLutSource::Generated { size, samples } => {
                log::debug!("Integrating {}x{} BRDF table ({} samples)", size, size, samples);
                Ok(generate_brdf_lut(*size, *samples))
            }
        }
    }
}

/// Shared slot for the created BRDF texture.
///
/// Clones share one slot, so the first successful table is reused by every
/// probe holding the cache.
pub struct BrdfLutCache<T>(Rc<RefCell<Option<T>>>);

impl<T: Clone> BrdfLutCache<T> {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    pub fn get(&self) -> Option<T> {
        self.0.borrow().clone()
    }

    /// Store `texture` unless a table is already cached; returns the cached one
    pub fn get_or_insert(&self, texture: T) -> T {
        self.0.borrow_mut().get_or_insert(texture).clone()
    }

    pub fn is_populated(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().take();
    }
}

impl<T: Clone> Default for BrdfLutCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BrdfLutCache<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for BrdfLutCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrdfLutCache")
            .field("populated", &self.0.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_asset::MemoryFetcher;

    #[test]
    fn test_generated_table_shape() {
        let lut = generate_brdf_lut(16, 128);
        assert_eq!(lut.rgba.len(), 16 * 16 * 4);
        assert!(lut.rgba.chunks_exact(4).all(|t| t[2] == 0 && t[3] == 255));
    }

    #[test]
    fn test_generated_table_values() {
        let lut = generate_brdf_lut(16, 256);
        // Smooth surface seen head-on: full reflectance scale, no bias
        let (scale, bias) = lut.lookup(0.99, 0.0);
        assert!(scale > 0.9, "scale {scale}");
        assert!(bias < 0.1, "bias {bias}");
        // Grazing angles pick up Fresnel bias
        let (_, grazing_bias) = lut.lookup(0.0, 0.0);
        assert!(grazing_bias > bias);
        // Rough surfaces lose energy
        let (rough_scale, _) = lut.lookup(0.99, 0.99);
        assert!(rough_scale < scale);
    }

    #[test]
    fn test_lookup_past_u32_texel_range() {
        let lut = BrdfLut {
            width: 70_000,
            height: 70_000,
            rgba: Vec::new(),
        };
        assert_eq!(lut.lookup(0.5, 1.0), (0.0, 0.0));
    }

    #[test]
    fn test_hammersley_radical_inverse() {
        assert_eq!(hammersley(0, 4), (0.0, 0.0));
        assert!((hammersley(1, 4).1 - 0.5).abs() < 1e-6);
        assert!((hammersley(2, 4).1 - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_precomputed_source_decodes_png() {
        let lut = generate_brdf_lut(4, 16);
        let mut png = Vec::new();
        lut.to_image()
            .unwrap()
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let fetcher = MemoryFetcher::new().with("brdf.png", png);
        let source = BrdfLutSource::Precomputed {
            path: "brdf.png".to_string(),
        };
        let decoded = pollster::block_on(source.produce(&fetcher)).unwrap();
        assert_eq!(decoded, lut);
    }

    #[test]
    fn test_precomputed_source_rejects_garbage() {
        let fetcher = MemoryFetcher::new().with("brdf.png", b"not an image".to_vec());
        let source = BrdfLutSource::Precomputed {
            path: "brdf.png".to_string(),
        };
        let err = pollster::block_on(source.produce(&fetcher)).unwrap_err();
        assert!(matches!(err, ProbeError::Asset(AssetError::InvalidImage { .. })));
    }

    #[test]
    fn test_cache_is_shared_between_clones() {
        let cache: BrdfLutCache<u32> = BrdfLutCache::new();
        let other = cache.clone();
        assert_eq!(cache.get_or_insert(7), 7);
        assert_eq!(other.get_or_insert(9), 7);
        assert!(other.is_populated());
        other.clear();
        assert!(!cache.is_populated());
    }
}
