use anyhow::{anyhow, Context, Result};
use wgpu::{Adapter, Device, Instance, Queue, TextureFormat};

/// Colour format of every render target and panel texture.
pub const OUTPUT_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

/// A shared context for all GPU operations.
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Initializes WGPU headless, preferring a hardware adapter and falling back to a
    /// software one (e.g. lavapipe, WARP) when none is available.
    pub fn init() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match pollster::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            },
        )) {
            Some(adapter) => adapter,
            None => pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: None,
                force_fallback_adapter: true,
            }))
            .ok_or_else(|| anyhow!("no suitable GPU adapter found (hardware or fallback)"))?,
        };

        let info = adapter.get_info();
        tracing::info!(
            "Using GPU adapter '{}' ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Mapreel Headless GPU Device"),
                // sample counts other than 1 and 4 need adapter-specific format features
                required_features: adapter.features()
                    & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
            },
            None,
        ))
        .context("failed to request wgpu device")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Whether render targets of [`OUTPUT_FORMAT`] can use `samples` samples per pixel.
    pub fn supports_sample_count(&self, samples: u32) -> bool {
        if samples <= 1 || samples == 4 {
            return true;
        }
        if !self
            .device
            .features()
            .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES)
        {
            return false;
        }
        self.adapter
            .get_texture_format_features(OUTPUT_FORMAT)
            .flags
            .sample_count_supported(samples)
    }

    /// Largest texture side the device accepts.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}
