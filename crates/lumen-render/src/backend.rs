//! wgpu implementation of the environment texture seam

use crate::context::GpuContext;
use lumen_environment::{MipLevel, PackedCubemap, PackedPanorama, RenderBackend, TextureFilter};
use std::sync::Arc;

/// LogLuv payloads are decoded in the shader, so texels stay linear bytes
pub const ENVIRONMENT_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A GPU-resident texture with its view and sampler
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Creates environment textures on a [`GpuContext`]
pub struct WgpuBackend<'a> {
    context: &'a GpuContext,
    prefer_panorama: bool,
}

impl<'a> WgpuBackend<'a> {
    pub fn new(context: &'a GpuContext) -> Self {
        Self {
            context,
            prefer_panorama: false,
        }
    }

    /// Report no explicit-LOD support so probes pick the panorama layout
    pub fn with_prefer_panorama(mut self, prefer: bool) -> Self {
        self.prefer_panorama = prefer;
        self
    }

    fn sampler(&self, label: &str, filter: TextureFilter, address: wgpu::AddressMode) -> wgpu::Sampler {
        let (filter_mode, mipmap_filter) = filter_modes(filter);
        self.context.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: address,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter_mode,
            min_filter: filter_mode,
            mipmap_filter,
            ..Default::default()
        })
    }

    fn write_level(&self, texture: &wgpu::Texture, mip_level: u32, layer: u32, level: &MipLevel, texels: &[u8]) {
        self.context.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
                aspect: wgpu::TextureAspect::All,
            },
            texels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(level.width * 4),
                rows_per_image: Some(level.height),
            },
            wgpu::Extent3d {
                width: level.width,
                height: level.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

fn filter_modes(filter: TextureFilter) -> (wgpu::FilterMode, wgpu::FilterMode) {
    match filter {
        TextureFilter::Nearest => (wgpu::FilterMode::Nearest, wgpu::FilterMode::Nearest),
        TextureFilter::Linear => (wgpu::FilterMode::Linear, wgpu::FilterMode::Nearest),
        TextureFilter::Trilinear => (wgpu::FilterMode::Linear, wgpu::FilterMode::Linear),
    }
}

impl RenderBackend for WgpuBackend<'_> {
    type Texture = Arc<GpuTexture>;

    fn supports_shader_lod(&self) -> bool {
        !self.prefer_panorama
    }

    fn create_cubemap(&self, label: &str, payload: &PackedCubemap, filter: TextureFilter) -> Self::Texture {
        let mip_levels = payload.level_count().max(1);
        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: payload.size(),
                height: payload.size(),
                depth_or_array_layers: 6,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ENVIRONMENT_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (index, level) in payload.levels().iter().enumerate() {
            for face in lumen_environment::CubeFace::ALL {
                if let Some(texels) = payload.face(index, face) {
                    self.write_level(&texture, index as u32, face.index() as u32, level, texels);
                }
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{} Cube View", label)),
            format: Some(ENVIRONMENT_TEXTURE_FORMAT),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(mip_levels),
            base_array_layer: 0,
            array_layer_count: Some(6),
        });
        let sampler = self.sampler(label, filter, wgpu::AddressMode::ClampToEdge);

        log::debug!("Uploaded cubemap '{}' ({}px, {} mips)", label, payload.size(), mip_levels);
        Arc::new(GpuTexture {
            texture,
            view,
            sampler,
        })
    }

    fn create_panorama(&self, label: &str, payload: &PackedPanorama) -> Self::Texture {
        let mip_levels = payload.level_count().max(1);
        let height = payload.levels().first().map_or(1, |l| l.height);
        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: payload.width(),
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ENVIRONMENT_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (index, level) in payload.levels().iter().enumerate() {
            if let Some(texels) = payload.image(index) {
                self.write_level(&texture, index as u32, 0, level, texels);
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Panorama mips are sampled with an explicit, shader-computed level
        let sampler = self.sampler(label, TextureFilter::Linear, wgpu::AddressMode::Repeat);

        log::debug!("Uploaded panorama '{}' ({}x{}, {} mips)", label, payload.width(), height, mip_levels);
        Arc::new(GpuTexture {
            texture,
            view,
            sampler,
        })
    }

    fn create_texture_2d(&self, label: &str, width: u32, height: u32, rgba: &[u8]) -> Self::Texture {
        let texture = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let level = MipLevel {
            width,
            height,
            offset: 0,
        };
        self.write_level(&texture, 0, 0, &level, rgba);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.sampler(label, TextureFilter::Linear, wgpu::AddressMode::ClampToEdge);

        Arc::new(GpuTexture {
            texture,
            view,
            sampler,
        })
    }
}
