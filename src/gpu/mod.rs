//! wgpu renderer for the two camera passes.
//!
//! Every system gets its own set of vertex buffers (positions, alpha,
//! colors), a uniform buffer and a bind group holding its sprite texture.
//! Point systems draw as instanced camera-facing quads, six vertices per
//! particle; line systems draw their buffer as a line list.
//!
//! The backdrop pass clears the frame. The light pass loads it and draws on
//! top, so the beam column always composites over the backdrop.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::{Blend, Sprite};
use crate::driver::{DrawItem, PassFrame, Renderer};
use crate::error::ViewerError;
use crate::families::Primitive;
use crate::textures::SpriteTexture;

const SHADER_SOURCE: &str = include_str!("sprite.wgsl");

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

const POSITION_STRIDE: wgpu::BufferAddress = std::mem::size_of::<Vec3>() as wgpu::BufferAddress;
const ALPHA_STRIDE: wgpu::BufferAddress = std::mem::size_of::<f32>() as wgpu::BufferAddress;

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const ALPHA_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Uniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

impl Uniforms {
    fn new(pass: &PassFrame, item: &DrawItem) -> Self {
        let style = &item.style;
        Self {
            view: pass.view.to_cols_array_2d(),
            proj: pass.projection.to_cols_array_2d(),
            model: item.model.to_cols_array_2d(),
            color: style.color.extend(style.opacity.clamp(0.0, 1.0)).to_array(),
            params: [
                sprite_half_extent(style.size, pass.size_scale),
                if style.vertex_colors { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }
}

/// Half the world-space edge of a sprite with attenuated point size `size`.
fn sprite_half_extent(size: f32, size_scale: f32) -> f32 {
    size * size_scale * 0.5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SpriteKey {
    sprite: Sprite,
    blur_bits: u32,
}

impl SpriteKey {
    fn new(sprite: Sprite, blur: f32) -> Self {
        // Only the blurred dots depend on the blur parameter
        let blur = match sprite {
            Sprite::Blurry | Sprite::Brain => blur,
            Sprite::Glowing | Sprite::SoftDisc => 0.0,
        };
        Self {
            sprite,
            blur_bits: blur.to_bits(),
        }
    }
}

struct Pipelines {
    points_normal: wgpu::RenderPipeline,
    points_additive: wgpu::RenderPipeline,
    lines_normal: wgpu::RenderPipeline,
    lines_additive: wgpu::RenderPipeline,
}

impl Pipelines {
    fn get(&self, primitive: Primitive, blend: Blend) -> &wgpu::RenderPipeline {
        match (primitive, blend) {
            (Primitive::Points, Blend::Normal) => &self.points_normal,
            (Primitive::Points, Blend::Additive) => &self.points_additive,
            (Primitive::Lines, Blend::Normal) => &self.lines_normal,
            (Primitive::Lines, Blend::Additive) => &self.lines_additive,
        }
    }
}

/// GPU resources of one system.
struct GpuLayer {
    positions: wgpu::Buffer,
    alpha: wgpu::Buffer,
    colors: wgpu::Buffer,
    capacity: usize,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    sprite: SpriteKey,
}

/// Renders [`PassFrame`]s to a window surface.
pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    pipelines: Pipelines,
    sprites: HashMap<SpriteKey, wgpu::TextureView>,
    layers: HashMap<String, GpuLayer>,
    last_error: Option<wgpu::SurfaceError>,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, ViewerError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ViewerError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colors are authored in sRGB hex, so write them as-is
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(ViewerError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layer Bind Group Layout"),
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

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipelines = create_pipelines(&device, &bind_group_layout, config.format);

        log::info!(
            "renderer ready: {}x{} {:?} on {}",
            config.width,
            config.height,
            config.format,
            adapter.get_info().name
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            bind_group_layout,
            sampler,
            pipelines,
            sprites: HashMap::new(),
            layers: HashMap::new(),
            last_error: None,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Surface error from the most recent [`Renderer::render`] call.
    pub fn take_error(&mut self) -> Option<wgpu::SurfaceError> {
        self.last_error.take()
    }

    /// Draw both passes and present.
    pub fn draw(&mut self, passes: &[PassFrame<'_>]) -> Result<(), wgpu::SurfaceError> {
        for pass in passes {
            for item in &pass.items {
                if item.buffer.is_empty() {
                    continue;
                }
                self.prepare_layer(item);
                if let Some(layer) = self.layers.get(item.name) {
                    let uniforms = Uniforms::new(pass, item);
                    self.queue
                        .write_buffer(&layer.uniforms, 0, bytemuck::bytes_of(&uniforms));
                }
            }
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        for (i, pass) in passes.iter().enumerate() {
            let load = if i == 0 {
                wgpu::LoadOp::Clear(CLEAR_COLOR)
            } else {
                wgpu::LoadOp::Load
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Layer Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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

            for item in &pass.items {
                let Some(layer) = self.layers.get(item.name) else {
                    continue;
                };
                let count = item.buffer.len() as u32;
                if count == 0 {
                    continue;
                }
                render_pass.set_pipeline(self.pipelines.get(item.style.primitive, item.style.blend));
                render_pass.set_bind_group(0, &layer.bind_group, &[]);
                render_pass.set_vertex_buffer(0, layer.positions.slice(..));
                render_pass.set_vertex_buffer(1, layer.alpha.slice(..));
                render_pass.set_vertex_buffer(2, layer.colors.slice(..));
                match item.style.primitive {
                    Primitive::Points => render_pass.draw(0..6, 0..count),
                    Primitive::Lines => render_pass.draw(0..count, 0..1),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Create or refresh the GPU copy of one system.
    fn prepare_layer(&mut self, item: &DrawItem) {
        let key = SpriteKey::new(item.style.sprite, item.style.blur);
        let len = item.buffer.len();

        let stale = match self.layers.get(item.name) {
            Some(layer) => layer.capacity < len || layer.sprite != key,
            None => true,
        };

        if stale {
            self.ensure_sprite(key);
            let layer = self.create_layer(item.name, len, key);
            self.layers.insert(item.name.to_string(), layer);
        } else if !item.dirty {
            return;
        }

        let Some(layer) = self.layers.get(item.name) else {
            return;
        };
        let buffer = item.buffer;
        self.queue.write_buffer(&layer.positions, 0, buffer.position_bytes());
        self.queue.write_buffer(&layer.alpha, 0, buffer.alpha_bytes());
        if let Some(colors) = buffer.colors() {
            self.queue
                .write_buffer(&layer.colors, 0, bytemuck::cast_slice(colors));
        }
    }

    fn create_layer(&self, name: &str, len: usize, key: SpriteKey) -> GpuLayer {
        let capacity = len.max(1);
        log::debug!("allocating GPU buffers for '{name}' ({capacity} vertices)");

        let positions = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Positions"),
            size: POSITION_STRIDE * capacity as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let alpha = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Alpha"),
            size: ALPHA_STRIDE * capacity as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let white = vec![Vec3::ONE; capacity];
        let colors = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Colors"),
            contents: bytemuck::cast_slice(&white),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let uniforms = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Layer Uniforms"),
            size: std::mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let fallback;
        let texture = match self.sprites.get(&key) {
            Some(view) => view,
            None => {
                fallback = self.upload_sprite(&SpriteTexture::soft_disc());
                &fallback
            }
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Layer Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        GpuLayer {
            positions,
            alpha,
            colors,
            capacity,
            uniforms,
            bind_group,
            sprite: key,
        }
    }

    fn ensure_sprite(&mut self, key: SpriteKey) {
        if self.sprites.contains_key(&key) {
            return;
        }
        let sprite = SpriteTexture::for_style(key.sprite, f32::from_bits(key.blur_bits));
        let view = self.upload_sprite(&sprite);
        self.sprites.insert(key, view);
    }

    fn upload_sprite(&self, sprite: &SpriteTexture) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: sprite.width,
            height: sprite.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Sprite"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &sprite.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * sprite.width),
                rows_per_image: Some(sprite.height),
            },
            size,
        );
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

impl Renderer for GpuRenderer {
    fn render(&mut self, passes: &[PassFrame<'_>]) {
        if let Err(e) = self.draw(passes) {
            self.last_error = Some(e);
        }
    }
}

fn create_pipelines(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> Pipelines {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Sprite Shader"),
        source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Layer Pipeline Layout"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    let build = |primitive: Primitive, blend: Blend| {
        let (vs, fs, step_mode, topology) = match primitive {
            Primitive::Points => (
                "vs_point",
                "fs_point",
                wgpu::VertexStepMode::Instance,
                wgpu::PrimitiveTopology::TriangleList,
            ),
            Primitive::Lines => (
                "vs_line",
                "fs_line",
                wgpu::VertexStepMode::Vertex,
                wgpu::PrimitiveTopology::LineList,
            ),
        };
        let buffers = [
            wgpu::VertexBufferLayout {
                array_stride: POSITION_STRIDE,
                step_mode,
                attributes: &POSITION_ATTRS,
            },
            wgpu::VertexBufferLayout {
                array_stride: ALPHA_STRIDE,
                step_mode,
                attributes: &ALPHA_ATTRS,
            },
            wgpu::VertexBufferLayout {
                array_stride: POSITION_STRIDE,
                step_mode,
                attributes: &COLOR_ATTRS,
            },
        ];

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(vs),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(vs),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(fs),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend_state(blend)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    };

    Pipelines {
        points_normal: build(Primitive::Points, Blend::Normal),
        points_additive: build(Primitive::Points, Blend::Additive),
        lines_normal: build(Primitive::Lines, Blend::Normal),
        lines_additive: build(Primitive::Lines, Blend::Additive),
    }
}

fn blend_state(blend: Blend) -> wgpu::BlendState {
    match blend {
        Blend::Normal => wgpu::BlendState::ALPHA_BLENDING,
        Blend::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
    }
}
