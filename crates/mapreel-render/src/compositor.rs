//! Composites the video panel, the map panel and the overlay into an offscreen target.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use mapreel_core::{
    DecodedFrame, FrameBuffer, MapreelConfig, MapreelError, MapreelResult, PanelConfig,
    RenderMode, RenderedFrame, RouteSource, ScrollMode, Stabilization,
};

use crate::gpu::{GpuContext, OUTPUT_FORMAT};
use crate::layout::{
    layout_for, map_split_x, place_map, place_video, route_transform, PanelFrame,
    PanelPlacement, Viewport,
};
use crate::overlay::{self, OverlayPainter};
use crate::panel::{GpuPanel, PanelShared};
use crate::shader;
use crate::telemetry::{FrameTimings, InfoContext, Telemetry};
use crate::video_decoder::{FrameSource, VideoDecoder};

/// Per-frame inputs owned by the driver.
pub struct FrameInputs<'a> {
    pub stabilization: &'a dyn Stabilization,
    pub route: &'a dyn RouteSource,
    pub scroll_mode: ScrollMode,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct OverlayUniforms {
    flip: u32,
    height: u32,
    _pad: [u32; 2],
}

/// Multisampled target, its single-sample resolve target and the readback buffer.
struct RenderTargets {
    width: u32,
    height: u32,
    multisample_view: Option<wgpu::TextureView>,
    output: wgpu::Texture,
    output_view: wgpu::TextureView,
    readback: wgpu::Buffer,
    padded_row_length: u32,
}

impl RenderTargets {
    fn new(gpu: &GpuContext, width: u32, height: u32, sample_count: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let multisample_view = (sample_count > 1).then(|| {
            gpu.device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("compositor_multisample_target"),
                    size,
                    mip_level_count: 1,
                    sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format: OUTPUT_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        let output = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("compositor_output_target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let output_view = output.create_view(&wgpu::TextureViewDescriptor::default());

        let padded_row_length = padded_row_length(width);
        let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("compositor_readback"),
            size: padded_row_length as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            width,
            height,
            multisample_view,
            output,
            output_view,
            readback,
            padded_row_length,
        }
    }

    /// The view panels are drawn into.
    fn render_view(&self) -> &wgpu::TextureView {
        self.multisample_view.as_ref().unwrap_or(&self.output_view)
    }
}

/// Row length of the readback buffer, aligned for texture to buffer copies.
pub fn padded_row_length(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

fn wgpu_color(color: &mapreel_core::Color) -> wgpu::Color {
    let [r, g, b, a] = color.to_f64_array();
    wgpu::Color { r, g, b, a }
}

fn apply_panel_config(placement: &mut PanelPlacement, config: &PanelConfig) {
    placement.clear_color = config.background_color;
    placement.clipping_enabled = config.enable_clipping;
    placement.clearing_enabled = config.enable_clearing;
    placement.user_x = config.x;
    placement.user_y = config.y;
    placement.user_angle = config.angle;
    placement.user_scale = config.scale;
}

fn set_scissor(pass: &mut wgpu::RenderPass<'_>, rect: &crate::layout::ClipRect) {
    pass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
}

pub struct Compositor {
    gpu: Arc<GpuContext>,
    shared: PanelShared,
    video: GpuPanel,
    map: GpuPanel,
    overlay_layout: wgpu::BindGroupLayout,
    overlay_pipeline: wgpu::RenderPipeline,
    overlay_uniforms: wgpu::Buffer,
    overlay_texture: wgpu::Texture,
    overlay_bind_group: wgpu::BindGroup,
    painter: OverlayPainter,
    targets: RenderTargets,
    readback_data: Vec<u8>,
    telemetry: Telemetry,
    render_mode: RenderMode,
    flip_output: bool,
    is_encoding: bool,
    show_info_panel: bool,
    full_clear_pending: bool,
    full_clear_count: u64,
}

impl Compositor {
    /// Build the compositor for the stream `decoder` has open.
    pub fn initialize<S: FrameSource>(
        gpu: Arc<GpuContext>,
        decoder: &VideoDecoder<S>,
        map_image: &FrameBuffer,
        config: &MapreelConfig,
    ) -> MapreelResult<Self> {
        if !decoder.is_initialized() {
            return Err(MapreelError::InvalidArgument(
                "video decoder is not initialized".into(),
            ));
        }
        Self::with_video_size(
            gpu,
            decoder.frame_width(),
            decoder.frame_height(),
            map_image,
            config,
        )
    }

    pub fn with_video_size(
        gpu: Arc<GpuContext>,
        video_width: u32,
        video_height: u32,
        map_image: &FrameBuffer,
        config: &MapreelConfig,
    ) -> MapreelResult<Self> {
        let result = Self::build(gpu, video_width, video_height, map_image, config);
        if let Err(e) = &result {
            tracing::error!("Could not initialize compositor: {}", e);
        }
        result
    }

    fn build(
        gpu: Arc<GpuContext>,
        video_width: u32,
        video_height: u32,
        map_image: &FrameBuffer,
        config: &MapreelConfig,
    ) -> MapreelResult<Self> {
        config.validate()?;
        let width = config.window.width;
        let height = config.window.height;
        check_target_size(&gpu, width, height)?;

        let mut sample_count = config.window.multisamples.max(1);
        if !gpu.supports_sample_count(sample_count) {
            tracing::warn!(
                "{}x multisampling is not supported, rendering without it",
                sample_count
            );
            sample_count = 1;
        }

        let shared = PanelShared::new(&gpu, sample_count)?;
        let shader_dir = &config.shaders.directory;

        let video_shader = shader::load_panel_shader(shader_dir, &config.video.rescale_shader)?;
        let mut video = GpuPanel::new(&gpu, &shared, "video", video_width, video_height, &video_shader)?;
        apply_panel_config(&mut video.placement, &config.video);

        let map_shader = shader::load_panel_shader(shader_dir, &config.map.panel.rescale_shader)?;
        let mut map = GpuPanel::new(&gpu, &shared, "map", map_image.width, map_image.height, &map_shader)?;
        apply_panel_config(&mut map.placement, &config.map.panel);
        map.placement.relative_width = config.map.relative_width;
        video.placement.relative_width = config.map.relative_width;
        map.upload(&gpu, &map_image.data, map_image.stride(), map_image.width, map_image.height)?;

        let overlay_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
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
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });
        let overlay_pipeline = create_overlay_pipeline(&gpu, &overlay_layout, sample_count)?;
        let overlay_uniforms = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay_uniforms"),
            contents: bytemuck::cast_slice(&[OverlayUniforms {
                flip: 0,
                height,
                _pad: [0; 2],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let (overlay_texture, overlay_bind_group) =
            create_overlay_texture(&gpu, &overlay_layout, &overlay_uniforms, width, height);

        let font = overlay::find_font(config.info_panel.font_path.as_deref());
        let painter = OverlayPainter::new(width, height, font)?;
        let targets = RenderTargets::new(&gpu, width, height, sample_count);

        tracing::info!(
            "Compositor ready: {}x{} output, {}x multisampling, video {}x{}, map {}x{}",
            width,
            height,
            sample_count,
            video_width,
            video_height,
            map_image.width,
            map_image.height
        );

        Ok(Self {
            gpu,
            shared,
            video,
            map,
            overlay_layout,
            overlay_pipeline,
            overlay_uniforms,
            overlay_texture,
            overlay_bind_group,
            painter,
            targets,
            readback_data: Vec::new(),
            telemetry: Telemetry::new(),
            render_mode: RenderMode::default(),
            flip_output: config.window.flip_output,
            is_encoding: false,
            show_info_panel: config.window.show_info_panel,
            full_clear_pending: true,
            full_clear_count: 0,
        })
    }

    /// Recreate the output targets at a new size and schedule a full clear.
    pub fn window_resized(&mut self, width: u32, height: u32) -> MapreelResult<()> {
        check_target_size(&self.gpu, width, height)?;

        self.targets = RenderTargets::new(&self.gpu, width, height, self.shared.sample_count);
        let (texture, bind_group) = create_overlay_texture(
            &self.gpu,
            &self.overlay_layout,
            &self.overlay_uniforms,
            width,
            height,
        );
        self.overlay_texture = texture;
        self.overlay_bind_group = bind_group;
        self.painter.resize(width, height)?;
        self.readback_data.clear();
        self.full_clear_pending = true;

        tracing::debug!("Compositor resized to {}x{}", width, height);
        Ok(())
    }

    /// Copy a decoded frame into the video texture.
    pub fn upload_frame_data(&mut self, frame: &DecodedFrame<'_>) -> MapreelResult<()> {
        self.video
            .upload(&self.gpu, frame.data, frame.stride, frame.width, frame.height)
    }

    pub fn start_rendering(&mut self, timings: &FrameTimings) {
        self.telemetry.start_rendering(timings);
    }

    /// Stop measuring the render time; returns it in milliseconds.
    pub fn stop_rendering(&mut self) -> f64 {
        self.telemetry.stop_rendering()
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.targets.width, self.targets.height, self.flip_output)
    }

    /// Draw every visible panel and the overlay into the output targets.
    pub fn render_all(&mut self, inputs: &FrameInputs<'_>) {
        let layout = layout_for(self.render_mode);
        let viewport = self.viewport();
        let route_placement = inputs.route.placement();
        let map_relative_width = self.map.placement.relative_width;
        self.video.placement.relative_width = map_relative_width;

        let video_frame = (layout.shows_video() && self.video.placement.enabled).then(|| {
            place_video(
                layout,
                &mut self.video.placement,
                map_relative_width,
                &viewport,
                inputs.stabilization.offset(),
            )
        });
        let map_frame = (layout.shows_map() && self.map.placement.enabled)
            .then(|| place_map(layout, &mut self.map.placement, &viewport, &route_placement));

        if let Some(frame) = &video_frame {
            self.video.write_uniforms(&self.gpu, &frame.matrix);
        }
        if let Some(frame) = &map_frame {
            self.map.write_uniforms(&self.gpu, &frame.matrix);
        }

        self.painter.clear();
        if map_frame.is_some() {
            let route = inputs.route.route();
            if !route.is_empty() {
                let transform = route_transform(&self.map.placement, &viewport, &route_placement);
                let clip_width = (self.render_mode != RenderMode::Map)
                    .then(|| (map_relative_width * viewport.width as f64 + 0.5) as u32);
                self.painter.draw_route(route, transform, clip_width);
            }
            if let Some(split) = map_split_x(layout, &self.map.placement, &viewport) {
                self.painter.draw_divider(split);
            }
        }
        if self.show_info_panel {
            let route = inputs.route.route();
            let context = InfoContext {
                is_encoding: self.is_encoding,
                render_mode: self.render_mode,
                scroll_mode: inputs.scroll_mode,
                video_scale: self.video.placement.user_scale,
                map_scale: self.map.placement.user_scale,
                route_scale: route.user_scale,
                control_time_offset: route.control_time_offset,
                runner_time_offset: route.runner_time_offset,
            };
            let lines = self.telemetry.info_lines(&context);
            self.painter.draw_info_panel(&lines);
        }
        let overlay_active = self.painter.has_content();
        if overlay_active {
            self.upload_overlay(&viewport);
        }

        let full_clear_color = if layout.shows_video() {
            self.video.clear_color()
        } else {
            self.map.clear_color()
        };
        let load = if self.full_clear_pending {
            wgpu::LoadOp::Clear(wgpu_color(&full_clear_color))
        } else {
            wgpu::LoadOp::Load
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("compositor_render_all"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("compositor_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.targets.render_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for (panel, frame) in [(&self.video, video_frame), (&self.map, map_frame)] {
                if let Some(frame) = &frame {
                    draw_panel(&mut pass, &self.shared, panel, frame, &viewport);
                }
            }

            if overlay_active {
                pass.set_scissor_rect(0, 0, viewport.width, viewport.height);
                pass.set_pipeline(&self.overlay_pipeline);
                pass.set_bind_group(0, &self.overlay_bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }
        self.gpu.queue.submit(Some(encoder.finish()));

        if self.full_clear_pending {
            self.full_clear_pending = false;
            self.full_clear_count += 1;
        }
    }

    fn upload_overlay(&self, viewport: &Viewport) {
        let uniforms = OverlayUniforms {
            flip: viewport.flip as u32,
            height: viewport.height,
            _pad: [0; 2],
        };
        self.gpu
            .queue
            .write_buffer(&self.overlay_uniforms, 0, bytemuck::cast_slice(&[uniforms]));
        self.gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.overlay_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            self.painter.data(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.painter.width() * 4),
                rows_per_image: Some(self.painter.height()),
            },
            wgpu::Extent3d {
                width: self.painter.width(),
                height: self.painter.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    /// Resolve the multisampled target into the output texture. No-op without multisampling.
    pub fn resolve_output(&self) {
        let Some(multisample_view) = &self.targets.multisample_view else {
            return;
        };
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("compositor_resolve"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("compositor_resolve_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: multisample_view,
                    resolve_target: Some(&self.targets.output_view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.gpu.queue.submit(Some(encoder.finish()));
    }

    /// Read the composited frame back. Blocks until the GPU is done.
    ///
    /// The returned frame borrows a buffer the next call overwrites.
    pub fn get_rendered_frame(&mut self) -> MapreelResult<RenderedFrame<'_>> {
        self.resolve_output();

        let targets = &self.targets;
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("compositor_readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &targets.output,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &targets.readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(targets.padded_row_length),
                    rows_per_image: Some(targets.height),
                },
            },
            wgpu::Extent3d {
                width: targets.width,
                height: targets.height,
                depth_or_array_layers: 1,
            },
        );
        self.gpu.queue.submit(Some(encoder.finish()));

        let slice = targets.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.gpu.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(MapreelError::Resource(format!(
                    "cannot map readback buffer: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(MapreelError::Resource(
                    "readback buffer mapping was dropped".into(),
                ))
            }
        }

        {
            let mapped = slice.get_mapped_range();
            self.readback_data.clear();
            self.readback_data.extend_from_slice(&mapped);
        }
        targets.readback.unmap();

        Ok(RenderedFrame {
            data: &self.readback_data,
            row_length: targets.padded_row_length as usize,
            width: targets.width,
            height: targets.height,
        })
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        if mode != self.render_mode {
            self.render_mode = mode;
            self.full_clear_pending = true;
        }
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_flip_output(&mut self, flip: bool) {
        if flip != self.flip_output {
            self.flip_output = flip;
            self.full_clear_pending = true;
        }
    }

    pub fn flip_output(&self) -> bool {
        self.flip_output
    }

    pub fn set_is_encoding(&mut self, is_encoding: bool) {
        self.is_encoding = is_encoding;
    }

    pub fn is_encoding(&self) -> bool {
        self.is_encoding
    }

    pub fn toggle_show_info_panel(&mut self) {
        self.show_info_panel = !self.show_info_panel;
        self.full_clear_pending = true;
    }

    pub fn show_info_panel(&self) -> bool {
        self.show_info_panel
    }

    pub fn request_full_clear(&mut self) {
        self.full_clear_pending = true;
    }

    pub fn full_clear_pending(&self) -> bool {
        self.full_clear_pending
    }

    /// Number of full clears performed so far.
    pub fn full_clear_count(&self) -> u64 {
        self.full_clear_count
    }

    pub fn video_panel(&self) -> &GpuPanel {
        &self.video
    }

    pub fn video_panel_mut(&mut self) -> &mut GpuPanel {
        &mut self.video
    }

    pub fn map_panel(&self) -> &GpuPanel {
        &self.map
    }

    pub fn map_panel_mut(&mut self) -> &mut GpuPanel {
        &mut self.map
    }

    /// Single-sample texture holding the latest resolved frame.
    pub fn output_texture(&self) -> &wgpu::Texture {
        &self.targets.output
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.targets.width, self.targets.height)
    }

    pub fn sample_count(&self) -> u32 {
        self.shared.sample_count
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
}

fn check_target_size(gpu: &GpuContext, width: u32, height: u32) -> MapreelResult<()> {
    let max = gpu.max_texture_dimension();
    if width == 0 || height == 0 {
        return Err(MapreelError::InvalidArgument(format!(
            "output size {}x{} has a zero dimension",
            width, height
        )));
    }
    if width > max || height > max {
        return Err(MapreelError::Resource(format!(
            "output size {}x{} exceeds the device limit of {}",
            width, height, max
        )));
    }
    Ok(())
}

/// Partially clear then draw one panel inside its scissor rectangle.
fn draw_panel<'a>(
    pass: &mut wgpu::RenderPass<'a>,
    shared: &'a PanelShared,
    panel: &'a GpuPanel,
    frame: &PanelFrame,
    viewport: &Viewport,
) {
    let Some(rect) = frame.clear_rect(viewport) else {
        return;
    };
    set_scissor(pass, &rect);
    if panel.placement.clearing_enabled {
        panel.draw_clear(shared, pass);
    }
    panel.draw(pass);
}

fn create_overlay_texture(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    uniforms: &wgpu::Buffer,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::BindGroup) {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("overlay_texture"),
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
    let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("overlay_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&view),
            },
        ],
    });
    (texture, bind_group)
}

fn create_overlay_pipeline(
    gpu: &GpuContext,
    layout: &wgpu::BindGroupLayout,
    sample_count: u32,
) -> MapreelResult<wgpu::RenderPipeline> {
    let device = &gpu.device;
    let module = shader::compile(device, "overlay", shader::OVERLAY_SHADER)?;
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("overlay_pipeline_layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("overlay_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: shader::VERTEX_ENTRY_POINT,
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: shader::FRAGMENT_ENTRY_POINT,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: OUTPUT_FORMAT,
                blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
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
    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(MapreelError::Resource(format!(
            "cannot create overlay pipeline: {}",
            error
        ))),
        None => Ok(pipeline),
    }
}
