//! GPU resources of one textured panel.

use wgpu::util::DeviceExt;

use mapreel_core::{Color, Mat4, MapreelError, MapreelResult};

use crate::gpu::{GpuContext, OUTPUT_FORMAT};
use crate::layout::PanelPlacement;
use crate::shader;

/// Uniform block shared by every panel shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PanelUniforms {
    pub vertex_matrix: [[f32; 4]; 4],
    pub texture_width: f32,
    pub texture_height: f32,
    pub texel_width: f32,
    pub texel_height: f32,
}

impl PanelUniforms {
    pub fn new(matrix: &Mat4, placement: &PanelPlacement) -> Self {
        Self {
            vertex_matrix: matrix.to_cols_array_f32(),
            texture_width: placement.texture_width as f32,
            texture_height: placement.texture_height as f32,
            texel_width: placement.texel_width() as f32,
            texel_height: placement.texel_height() as f32,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texture_coordinate: [f32; 2],
}

/// Triangle strip covering a texture-sized quad centred on the origin, top row of the
/// texture at +y.
pub fn quad_vertices(width: u32, height: u32) -> [Vertex; 4] {
    let half_w = width as f32 / 2.0;
    let half_h = height as f32 / 2.0;
    [
        Vertex {
            position: [-half_w, half_h, 0.0],
            texture_coordinate: [0.0, 0.0],
        },
        Vertex {
            position: [half_w, half_h, 0.0],
            texture_coordinate: [1.0, 0.0],
        },
        Vertex {
            position: [-half_w, -half_h, 0.0],
            texture_coordinate: [0.0, 1.0],
        },
        Vertex {
            position: [half_w, -half_h, 0.0],
            texture_coordinate: [1.0, 1.0],
        },
    ]
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SolidUniforms {
    color: [f32; 4],
}

/// Layouts, sampler and the solid-fill pipeline used by every panel.
pub struct PanelShared {
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
    pub sampler: wgpu::Sampler,
    pub solid_bind_group_layout: wgpu::BindGroupLayout,
    pub solid_pipeline: wgpu::RenderPipeline,
    pub sample_count: u32,
}

impl PanelShared {
    pub fn new(gpu: &GpuContext, sample_count: u32) -> MapreelResult<Self> {
        let device = &gpu.device;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("panel_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("panel_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("panel_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let solid_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("solid_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let solid_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("solid_pipeline_layout"),
            bind_group_layouts: &[&solid_bind_group_layout],
            push_constant_ranges: &[],
        });

        let solid_module = shader::compile(device, "solid", shader::SOLID_SHADER)?;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let solid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("solid_pipeline"),
            layout: Some(&solid_layout),
            vertex: wgpu::VertexState {
                module: &solid_module,
                entry_point: shader::VERTEX_ENTRY_POINT,
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &solid_module,
                entry_point: shader::FRAGMENT_ENTRY_POINT,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OUTPUT_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(MapreelError::Resource(format!(
                "cannot create solid pipeline: {}",
                error
            )));
        }

        Ok(Self {
            bind_group_layout,
            pipeline_layout,
            sampler,
            solid_bind_group_layout,
            solid_pipeline,
            sample_count,
        })
    }
}

/// A textured quad with its own pipeline, placement and clear colour.
pub struct GpuPanel {
    pub placement: PanelPlacement,
    label: String,
    texture: wgpu::Texture,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    clear_buffer: wgpu::Buffer,
    clear_bind_group: wgpu::BindGroup,
}

impl GpuPanel {
    /// Create a panel with an empty `width`x`height` texture drawn by the given WGSL source.
    pub fn new(
        gpu: &GpuContext,
        shared: &PanelShared,
        label: &str,
        width: u32,
        height: u32,
        shader_source: &str,
    ) -> MapreelResult<Self> {
        let device = &gpu.device;
        let max = gpu.max_texture_dimension();
        if width == 0 || height == 0 || width > max || height > max {
            return Err(MapreelError::Resource(format!(
                "{} texture size {}x{} is outside 1..={}",
                label, width, height, max
            )));
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}_vertices", label)),
            contents: bytemuck::cast_slice(&quad_vertices(width, height)),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let placement = PanelPlacement::new(width, height);
        let uniforms = PanelUniforms::new(&Mat4::identity(), &placement);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}_uniforms", label)),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}_bind_group", label)),
            layout: &shared.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shared.sampler),
                },
            ],
        });

        let clear_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}_clear_color", label)),
            contents: bytemuck::cast_slice(&[SolidUniforms {
                color: placement.clear_color.to_array(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let clear_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}_clear_bind_group", label)),
            layout: &shared.solid_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: clear_buffer.as_entire_binding(),
            }],
        });

        let module = shader::compile(device, label, shader_source)?;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{}_pipeline", label)),
            layout: Some(&shared.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: shader::VERTEX_ENTRY_POINT,
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: shader::FRAGMENT_ENTRY_POINT,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: OUTPUT_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: shared.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(MapreelError::Resource(format!(
                "cannot create {} pipeline: {}",
                label, error
            )));
        }

        tracing::debug!("Created {} panel ({}x{})", label, width, height);

        Ok(Self {
            placement,
            label: label.to_string(),
            texture,
            vertex_buffer,
            uniform_buffer,
            bind_group,
            pipeline,
            clear_buffer,
            clear_bind_group,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Copy tightly packed or padded RGBA rows into the panel texture.
    pub fn upload(
        &self,
        gpu: &GpuContext,
        data: &[u8],
        stride: usize,
        width: u32,
        height: u32,
    ) -> MapreelResult<()> {
        let placement = &self.placement;
        if width != placement.texture_width || height != placement.texture_height {
            return Err(MapreelError::InvalidArgument(format!(
                "{} frame is {}x{}, texture is {}x{}",
                self.label, width, height, placement.texture_width, placement.texture_height
            )));
        }
        let row_bytes = width as usize * 4;
        if stride < row_bytes {
            return Err(MapreelError::InvalidArgument(format!(
                "stride {} is shorter than a {} byte row",
                stride, row_bytes
            )));
        }
        let needed = stride * (height as usize - 1) + row_bytes;
        if data.len() < needed {
            return Err(MapreelError::InvalidArgument(format!(
                "{} frame holds {} bytes, {} needed",
                self.label,
                data.len(),
                needed
            )));
        }

        gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data[..needed],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(stride as u32),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Write this frame's transform and the current clear colour.
    pub fn write_uniforms(&self, gpu: &GpuContext, matrix: &Mat4) {
        let uniforms = PanelUniforms::new(matrix, &self.placement);
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        let clear = SolidUniforms {
            color: self.placement.clear_color.to_array(),
        };
        gpu.queue
            .write_buffer(&self.clear_buffer, 0, bytemuck::cast_slice(&[clear]));
    }

    pub fn clear_color(&self) -> Color {
        self.placement.clear_color
    }

    /// Fill the current scissor rectangle with the clear colour.
    pub fn draw_clear<'a>(&'a self, shared: &'a PanelShared, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&shared.solid_pipeline);
        pass.set_bind_group(0, &self.clear_bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..4, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_block_layout() {
        assert_eq!(std::mem::size_of::<PanelUniforms>(), 80);
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
    }

    #[test]
    fn test_quad_covers_texture() {
        let quad = quad_vertices(640, 360);
        assert_eq!(quad[0].position, [-320.0, 180.0, 0.0]);
        assert_eq!(quad[0].texture_coordinate, [0.0, 0.0]);
        assert_eq!(quad[3].position, [320.0, -180.0, 0.0]);
        assert_eq!(quad[3].texture_coordinate, [1.0, 1.0]);
    }

    #[test]
    fn test_uniforms_from_placement() {
        let placement = PanelPlacement::new(200, 100);
        let uniforms = PanelUniforms::new(&Mat4::identity(), &placement);
        assert_eq!(uniforms.vertex_matrix[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(uniforms.texture_width, 200.0);
        assert_eq!(uniforms.texel_height, 0.01);
    }
}
