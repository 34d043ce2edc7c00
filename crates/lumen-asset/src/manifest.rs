//! Environment package manifest (`config.json`)

use crate::fetch::{join_url, AssetFetcher};
use lumen_core::{AssetError, Color, Vec3};
use serde::Deserialize;

/// File name of the manifest inside every environment package
pub const MANIFEST_FILE: &str = "config.json";

/// One lighting texture variant declared by the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Logical texture type (`specular_ue4`, `background`, `brdf_ue4`, ...)
    pub kind: String,
    /// Texel encoding (`luv`, `rgbm`, `float`, ...)
    pub encoding: String,
    /// Layout (`cubemap` or `panorama`)
    pub format: String,
    /// Width in texels of the largest mip level
    pub width: u32,
    /// Smallest usable mip dimension, if the manifest declares one
    pub limit_size: Option<u32>,
    /// Path of the payload, relative to the package base
    pub file_path: String,
}

impl TextureDescriptor {
    /// Smallest usable mip dimension, defaulting to the full chain
    pub fn limit_size_or_default(&self) -> u32 {
        self.limit_size.unwrap_or(1)
    }

    fn matches(&self, kind: &str, encoding: &str, format: &str) -> bool {
        self.kind == kind && self.encoding == encoding && self.format == format
    }
}

/// A directional light declared by the manifest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDescriptor {
    pub color: Color,
    /// Direction the light travels, as declared
    pub direction: Vec3,
    pub luminosity: f32,
}

/// Parsed environment package manifest
#[derive(Debug, Clone, PartialEq)]
pub struct AssetManifest {
    textures: Vec<TextureDescriptor>,
    diffuse_sph: [[f32; 3]; 9],
    lights: Vec<LightDescriptor>,
}

impl AssetManifest {
    /// Fetch and parse `<base_url>/config.json`
    pub async fn load<F: AssetFetcher + ?Sized>(
        fetcher: &F,
        base_url: &str,
    ) -> Result<Self, AssetError> {
        let path = join_url(base_url, MANIFEST_FILE);
        let bytes = fetcher.fetch(&path).await?;
        let manifest = Self::parse(&bytes)?;
        log::debug!(
            "Loaded manifest {} ({} textures, {} lights)",
            path,
            manifest.textures.len(),
            manifest.lights.len()
        );
        Ok(manifest)
    }

    /// Parse a manifest document
    pub fn parse(bytes: &[u8]) -> Result<Self, AssetError> {
        let raw: RawManifest = serde_json::from_slice(bytes)
            .map_err(|e| AssetError::InvalidManifest(e.to_string()))?;

        let textures = raw
            .textures
            .into_iter()
            .enumerate()
            .map(|(index, t)| t.into_descriptor(index))
            .collect::<Result<Vec<_>, _>>()?;

        let diffuse_sph = raw.diffuse_sph.into_coefficients()?;

        let lights = raw
            .lights
            .unwrap_or_default()
            .into_iter()
            .map(|l| LightDescriptor {
                color: Color::from_rgb(l.color),
                direction: Vec3::from_array(l.direction),
                luminosity: l.luminosity,
            })
            .collect();

        Ok(Self {
            textures,
            diffuse_sph,
            lights,
        })
    }

    /// First descriptor matching all three keys, in declaration order
    pub fn find(&self, kind: &str, encoding: &str, format: &str) -> Option<&TextureDescriptor> {
        self.textures
            .iter()
            .find(|t| t.matches(kind, encoding, format))
    }

    /// All descriptors of one logical type
    pub fn textures_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a TextureDescriptor> {
        self.textures.iter().filter(move |t| t.kind == kind)
    }

    pub fn textures(&self) -> &[TextureDescriptor] {
        &self.textures
    }

    /// Raw (un-normalized) diffuse spherical-harmonics coefficients
    pub fn diffuse_sph(&self) -> &[[f32; 3]; 9] {
        &self.diffuse_sph
    }

    pub fn lights(&self) -> &[LightDescriptor] {
        &self.lights
    }

    /// The first declared light, used as the sun
    pub fn sun_light(&self) -> Option<&LightDescriptor> {
        self.lights.first()
    }
}

#[derive(Deserialize)]
struct RawManifest {
    textures: Vec<RawTexture>,
    #[serde(rename = "diffuseSPH")]
    diffuse_sph: RawHarmonics,
    #[serde(rename = "Lights", alias = "lights", default)]
    lights: Option<Vec<RawLight>>,
}

#[derive(Deserialize)]
struct RawTexture {
    #[serde(rename = "type")]
    kind: Option<String>,
    encoding: Option<String>,
    format: Option<String>,
    #[serde(rename = "limitSize")]
    limit_size: Option<u32>,
    file: Option<String>,
    width: Option<u32>,
    #[serde(default)]
    images: Vec<RawImage>,
}

#[derive(Deserialize)]
struct RawImage {
    file: Option<String>,
    width: Option<u32>,
}

impl RawTexture {
    fn into_descriptor(self, index: usize) -> Result<TextureDescriptor, AssetError> {
        let missing =
            |field: &str| AssetError::InvalidManifest(format!("textures[{}] is missing '{}'", index, field));

        let image = self.images.into_iter().next();
        let (image_file, image_width) = match image {
            Some(image) => (image.file, image.width),
            None => (None, None),
        };

        Ok(TextureDescriptor {
            kind: self.kind.ok_or_else(|| missing("type"))?,
            encoding: self.encoding.ok_or_else(|| missing("encoding"))?,
            format: self.format.ok_or_else(|| missing("format"))?,
            width: self.width.or(image_width).ok_or_else(|| missing("width"))?,
            limit_size: self.limit_size,
            file_path: self.file.or(image_file).ok_or_else(|| missing("file"))?,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawHarmonics {
    Triples(Vec<[f32; 3]>),
    Flat(Vec<f32>),
}

impl RawHarmonics {
    fn into_coefficients(self) -> Result<[[f32; 3]; 9], AssetError> {
        let mut out = [[0.0f32; 3]; 9];
        match self {
            RawHarmonics::Triples(triples) if triples.len() == 9 => {
                out.copy_from_slice(&triples);
            }
            RawHarmonics::Flat(flat) if flat.len() == 27 => {
                for (slot, chunk) in out.iter_mut().zip(flat.chunks_exact(3)) {
                    slot.copy_from_slice(chunk);
                }
            }
            RawHarmonics::Triples(triples) => {
                return Err(AssetError::InvalidManifest(format!(
                    "diffuseSPH must hold 9 coefficients, found {}",
                    triples.len()
                )));
            }
            RawHarmonics::Flat(flat) => {
                return Err(AssetError::InvalidManifest(format!(
                    "diffuseSPH must hold 27 values, found {}",
                    flat.len()
                )));
            }
        }
        if out.iter().flatten().any(|v| !v.is_finite()) {
            return Err(AssetError::InvalidManifest(
                "diffuseSPH contains non-finite values".to_string(),
            ));
        }
        Ok(out)
    }
}

#[derive(Deserialize)]
struct RawLight {
    color: [f32; 3],
    direction: [f32; 3],
    luminosity: f32,
}
