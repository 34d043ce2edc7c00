//! Rendering backend seam

use crate::payload::{PackedCubemap, PackedPanorama};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Layout of an environment texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentFormat {
    Cubemap,
    Panorama,
}

impl EnvironmentFormat {
    /// Name used in manifest descriptors
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentFormat::Cubemap => "cubemap",
            EnvironmentFormat::Panorama => "panorama",
        }
    }
}

impl fmt::Display for EnvironmentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampler filtering for created textures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Nearest,
    Linear,
    /// Linear within and between mip levels
    Trilinear,
}

/// Requested device tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityTier {
    /// Let the backend decide
    #[default]
    Auto,
    Full,
    Reduced,
}

impl QualityTier {
    /// Resolve to a reduced-quality flag, using `detected` for `Auto`
    pub fn is_reduced(self, detected: bool) -> bool {
        match self {
            QualityTier::Auto => detected,
            QualityTier::Full => false,
            QualityTier::Reduced => true,
        }
    }
}

/// One-time capability snapshot taken before a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Explicit-LOD sampling is available in shaders
    pub shader_lod: bool,
    /// Constrained device: skip optional assets, compile reduced shaders
    pub reduced_quality: bool,
}

impl Capabilities {
    pub fn full() -> Self {
        Self {
            shader_lod: true,
            reduced_quality: false,
        }
    }

    pub fn query<B: RenderBackend + ?Sized>(backend: &B, reduced_quality: bool) -> Self {
        Self {
            shader_lod: backend.supports_shader_lod(),
            reduced_quality,
        }
    }

    /// Cubemap when the shader can pick mip levels, panorama otherwise
    pub fn specular_format(&self) -> EnvironmentFormat {
        if self.shader_lod {
            EnvironmentFormat::Cubemap
        } else {
            EnvironmentFormat::Panorama
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// GPU resource construction provided by the rendering layer
pub trait RenderBackend {
    /// Handle to a created texture; cheap to clone
    type Texture: Clone;

    fn supports_shader_lod(&self) -> bool;

    fn create_cubemap(&self, label: &str, payload: &PackedCubemap, filter: TextureFilter) -> Self::Texture;

    fn create_panorama(&self, label: &str, payload: &PackedPanorama) -> Self::Texture;

    /// RGBA8 2D texture without mips
    fn create_texture_2d(&self, label: &str, width: u32, height: u32, rgba: &[u8]) -> Self::Texture;
}

impl<B: RenderBackend + ?Sized> RenderBackend for &B {
    type Texture = B::Texture;

    fn supports_shader_lod(&self) -> bool {
        (**self).supports_shader_lod()
    }

    fn create_cubemap(&self, label: &str, payload: &PackedCubemap, filter: TextureFilter) -> Self::Texture {
        (**self).create_cubemap(label, payload, filter)
    }

    fn create_panorama(&self, label: &str, payload: &PackedPanorama) -> Self::Texture {
        (**self).create_panorama(label, payload)
    }

    fn create_texture_2d(&self, label: &str, width: u32, height: u32, rgba: &[u8]) -> Self::Texture {
        (**self).create_texture_2d(label, width, height, rgba)
    }
}

/// Shape of a texture created by [`CpuBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuTexture {
    pub label: String,
    pub format: Option<EnvironmentFormat>,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub filter: TextureFilter,
}

/// A backend without a GPU.
///
/// Records the textures it is asked to create; used by tools that only
/// inspect lighting data and by tests.
#[derive(Debug, Default)]
pub struct CpuBackend {
    shader_lod: bool,
    created: RefCell<Vec<Rc<CpuTexture>>>,
}

impl CpuBackend {
    pub fn new(shader_lod: bool) -> Self {
        Self {
            shader_lod,
            created: RefCell::new(Vec::new()),
        }
    }

    /// Every texture created so far, in creation order
    pub fn created(&self) -> Vec<Rc<CpuTexture>> {
        self.created.borrow().clone()
    }

    fn record(&self, texture: CpuTexture) -> Rc<CpuTexture> {
        let texture = Rc::new(texture);
        self.created.borrow_mut().push(Rc::clone(&texture));
        texture
    }
}

impl RenderBackend for CpuBackend {
    type Texture = Rc<CpuTexture>;

    fn supports_shader_lod(&self) -> bool {
        self.shader_lod
    }

    fn create_cubemap(&self, label: &str, payload: &PackedCubemap, filter: TextureFilter) -> Self::Texture {
        self.record(CpuTexture {
            label: label.to_string(),
            format: Some(EnvironmentFormat::Cubemap),
            width: payload.size(),
            height: payload.size(),
            mip_levels: payload.level_count(),
            filter,
        })
    }

    fn create_panorama(&self, label: &str, payload: &PackedPanorama) -> Self::Texture {
        let height = payload.levels().first().map_or(0, |l| l.height);
        self.record(CpuTexture {
            label: label.to_string(),
            format: Some(EnvironmentFormat::Panorama),
            width: payload.width(),
            height,
            mip_levels: payload.level_count(),
            filter: TextureFilter::Trilinear,
        })
    }

    fn create_texture_2d(&self, label: &str, width: u32, height: u32, _rgba: &[u8]) -> Self::Texture {
        self.record(CpuTexture {
            label: label.to_string(),
            format: None,
            width,
            height,
            mip_levels: 1,
            filter: TextureFilter::Linear,
        })
    }
}
