//! wgpu device setup without a window

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to get adapter")]
    AdapterNotFound,
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),
    #[error("Shader preprocess error at line {line}: {reason}")]
    Preprocess { line: usize, reason: String },
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),
}

/// Device and queue used to create environment textures and shader modules
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Create a context on the default adapter, with no surface attached
    pub async fn headless() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterNotFound)?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using adapter '{}' ({:?}, {:?})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.device_type
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Lumen Headless Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }

    /// Blocking form of [`headless`](Self::headless) for tools
    pub fn headless_blocking() -> Result<Self, RenderError> {
        pollster::block_on(Self::headless())
    }

    /// Software rasterizers and GL-only devices get the reduced tier
    pub fn detect_reduced_quality(&self) -> bool {
        is_constrained(&self.adapter_info)
    }
}

fn is_constrained(info: &wgpu::AdapterInfo) -> bool {
    info.device_type == wgpu::DeviceType::Cpu || info.backend == wgpu::Backend::Gl
}
