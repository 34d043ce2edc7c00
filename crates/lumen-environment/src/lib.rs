//! Lumen Environment - Image-based lighting probes
//!
//! An [`EnvironmentProbe`] reads an environment package manifest, picks the
//! specular layout the backend can sample, fetches the specular and
//! background payloads concurrently, derives the LOD range, and publishes a
//! [`LightingBundle`] for materials to bind.

mod backend;
mod brdf;
mod bundle;
mod environment_map;
mod harmonics;
mod lod;
mod payload;
mod probe;

pub use backend::{Capabilities, CpuBackend, CpuTexture, EnvironmentFormat, QualityTier, RenderBackend, TextureFilter};
pub use brdf::{
    generate_brdf_lut, BrdfLut, BrdfLutCache, BrdfLutSource, DEFAULT_LUT_SAMPLES, DEFAULT_LUT_SIZE,
    MAX_LUT_SIZE,
};
pub use bundle::{LightingBundle, SunLight};
pub use environment_map::{decode_luv, EnvironmentMap};
pub use harmonics::{SphericalHarmonics, SH_BAND_CONSTANTS};
pub use lod::LodRange;
pub use payload::{CubeFace, MipLevel, PackedCubemap, PackedPanorama};
pub use probe::{EnvironmentProbe, BACKGROUND_KIND, LUV_ENCODING, SPECULAR_KIND};
