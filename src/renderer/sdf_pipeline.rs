//! SDF-based WebGPU render pipeline
//!
//! Draws the whole range in the fragment shader: target faces as concentric
//! scoring rings, particles as soft additive discs. Geometry arrives already
//! projected to pixels (see [`super::frame`]).

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::frame::{FrameData, build_frame};
use super::{MAX_RINGS, MAX_SPRITES, RenderBackend};
use crate::consts::BACKGROUND;
use crate::error::RangeError;
use crate::sim::camera::{Camera, Viewport};
use crate::sim::scene::Scene;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2], // offset 0
    time: f32,            // offset 8
    target_count: u32,    // offset 12
    sprite_count: u32,    // offset 16
    _pad: [u32; 3],       // offset 20 - align background to 16 bytes
    background: [f32; 4], // offset 32
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct TargetData {
    center: [f32; 2],
    radius: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SpriteData {
    pos: [f32; 2],
    size: f32,
    opacity: f32,
    color: [f32; 4],
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    targets_buffer: wgpu::Buffer,
    sprites_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    start_time: f64,
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, RangeError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                // Two storage buffers: the WebGL2 downlevel limits allow none
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .map_err(|err| RangeError::Platform(format!("failed to create device: {err}")))?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);
        log::info!("Surface alpha modes: {:?}", surface_caps.alpha_modes);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RangeError::Platform("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::info!("Surface config: {}x{}, alpha: {:?}", config.width, config.height, config.alpha_mode);
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [config.width as f32, config.height as f32],
                time: 0.0,
                target_count: 0,
                sprite_count: 0,
                _pad: [0; 3],
                background: [BACKGROUND[0], BACKGROUND[1], BACKGROUND[2], 1.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let targets_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("targets"),
            size: (std::mem::size_of::<TargetData>() * MAX_RINGS) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sprites_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprites"),
            size: (std::mem::size_of::<SpriteData>() * MAX_SPRITES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
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
                storage_entry(1),
                storage_entry(2),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: targets_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: sprites_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let size = (config.width, config.height);
        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            targets_buffer,
            sprites_buffer,
            bind_group,
            size,
            start_time: 0.0,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Upload a projected frame and draw it. `scale` converts the frame's
    /// CSS pixels into surface pixels.
    pub fn render(&mut self, frame: &FrameData, scale: f32, time: f64) -> Result<(), wgpu::SurfaceError> {
        let elapsed = ((time - self.start_time) / 1000.0) as f32;
        let target_count = frame.rings.len().min(MAX_RINGS);
        let sprite_count = frame.sprites.len().min(MAX_SPRITES);

        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            time: elapsed,
            target_count: target_count as u32,
            sprite_count: sprite_count as u32,
            _pad: [0; 3],
            background: [BACKGROUND[0], BACKGROUND[1], BACKGROUND[2], 1.0],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        if target_count > 0 {
            let targets: Vec<TargetData> = frame
                .rings
                .iter()
                .take(target_count)
                .map(|ring| TargetData {
                    center: (ring.center * scale).to_array(),
                    radius: ring.radius * scale,
                    _pad: 0.0,
                })
                .collect();
            self.queue
                .write_buffer(&self.targets_buffer, 0, bytemuck::cast_slice(&targets));
        }

        if sprite_count > 0 {
            let sprites: Vec<SpriteData> = frame
                .sprites
                .iter()
                .take(sprite_count)
                .map(|sprite| SpriteData {
                    pos: (sprite.position * scale).to_array(),
                    size: sprite.size * scale,
                    opacity: sprite.opacity,
                    color: [sprite.color[0], sprite.color[1], sprite.color[2], 1.0],
                })
                .collect();
            self.queue
                .write_buffer(&self.sprites_buffer, 0, bytemuck::cast_slice(&sprites));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Free buffers and the device now instead of waiting for GC
    pub fn destroy(self) {
        self.globals_buffer.destroy();
        self.targets_buffer.destroy();
        self.sprites_buffer.destroy();
        self.device.destroy();
    }
}

/// [`RenderBackend`] over the WebGPU pipeline
pub struct GpuBackend {
    state: Option<SdfRenderState>,
    viewport: Viewport,
    /// Device pixel ratio
    pixel_ratio: f32,
}

impl GpuBackend {
    pub fn new(state: SdfRenderState, viewport: Viewport, pixel_ratio: f32) -> Self {
        Self {
            state: Some(state),
            viewport,
            pixel_ratio: pixel_ratio.max(1.0),
        }
    }

    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.pixel_ratio = pixel_ratio.max(1.0);
    }

    /// Surface size in physical pixels
    pub fn surface_size(&self) -> (u32, u32) {
        (
            (self.viewport.width * self.pixel_ratio) as u32,
            (self.viewport.height * self.pixel_ratio) as u32,
        )
    }
}

impl RenderBackend for GpuBackend {
    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let (width, height) = self.surface_size();
        if let Some(state) = self.state.as_mut() {
            state.resize(width, height);
        }
    }

    fn render(&mut self, scene: &Scene, camera: &Camera, time: f64) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let frame = build_frame(scene, camera, self.viewport, MAX_RINGS, MAX_SPRITES);
        match state.render(&frame, self.pixel_ratio, time) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                state.resize(state.size.0, state.size.1);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory!");
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }

    fn dispose(&mut self) {
        if let Some(state) = self.state.take() {
            state.destroy();
            log::info!("GPU resources released");
        }
    }
}
