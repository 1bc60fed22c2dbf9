//! Renderer and compositor.
//!
//! Owns the surface, the camera and every GPU buffer. Each frame it
//! uploads the position buffers the animation marked dirty, draws every
//! clone and decoration item as points into an offscreen target, and runs
//! the post chain onto the surface.

mod camera;
mod post_process;

use std::sync::Arc;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::clone_field::CLONE_POINT_SIZE;
use crate::context::AnimationContext;
use crate::decoration::DecorationItem;
use crate::error::GpuError;
use crate::group::color_from_hex;
use crate::shader::{DrawUniforms, FrameUniforms, POINTS_WGSL};

pub use camera::Camera;
pub use post_process::PostChain;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Scene background and fog colour.
pub const BACKGROUND: u32 = 0x000104;
/// Exponential-squared fog density.
pub const FOG_DENSITY: f32 = 0.0000675;

/// Pick the surface format, preferring one without sRGB encoding.
///
/// Scene colours are authored in display space.
fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Result<wgpu::TextureFormat, GpuError> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
        .ok_or(GpuError::UnsupportedSurface)
}

/// Uniform buffer and bind group for one draw call.
struct DrawSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl DrawSlot {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<DrawUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    fn write(&self, queue: &wgpu::Queue, model: Mat4, color: Vec3, point_size: f32) {
        let uniforms = DrawUniforms {
            model: model.to_cols_array_2d(),
            color: color.to_array(),
            point_size,
        };
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&uniforms));
    }
}

/// Vertex buffer of one group plus a slot per clone.
struct GroupBuffers {
    vertices: wgpu::Buffer,
    count: u32,
    clones: Vec<DrawSlot>,
}

/// Static buffer for a decoration item.
struct DecorationBuffers {
    vertices: wgpu::Buffer,
    count: u32,
    slot: DrawSlot,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    camera: Camera,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_layout: wgpu::BindGroupLayout,
    point_pipeline: wgpu::RenderPipeline,
    groups: Vec<GroupBuffers>,
    decoration: Vec<DecorationBuffers>,
    post: PostChain,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, decoration: &[DecorationItem]) -> Result<Self, GpuError> {
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
            .ok_or(GpuError::NoAdapter)?;

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
        let surface_format = choose_surface_format(&surface_caps.formats)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Points Shader"),
            source: wgpu::ShaderSource::Wgsl(POINTS_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Points Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout],
            push_constant_ranges: &[],
        });

        let point_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vec3>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                }],
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
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let decoration = decoration
            .iter()
            .map(|item| DecorationBuffers {
                vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(item.label),
                    contents: bytemuck::cast_slice(&item.points),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                count: item.points.len() as u32,
                slot: DrawSlot::new(&device, &draw_layout, item.label),
            })
            .collect();

        let post = PostChain::new(&device, config.width, config.height, config.format);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            camera: Camera::new(),
            frame_buffer,
            frame_bind_group,
            draw_layout,
            point_pipeline,
            groups: Vec::new(),
            decoration,
            post,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.post.resize(&self.device, new_size.width, new_size.height);
        }
    }

    /// Bring GPU buffers in line with the animation state.
    ///
    /// Creates buffers for groups registered since the last call, uploads
    /// dirty position buffers and refreshes every transform.
    pub fn sync(&mut self, ctx: &mut AnimationContext) {
        let rotation = ctx.rotation_y();

        for figure in ctx.figures_mut() {
            let id = figure.clones.group().0;
            if id >= self.groups.len() {
                let label = figure.group.name().to_string();
                let vertices = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&label),
                    contents: bytemuck::cast_slice(figure.group.positions()),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
                let clones = (0..figure.clones.entries().len())
                    .map(|i| DrawSlot::new(&self.device, &self.draw_layout, &format!("{label} clone {i}")))
                    .collect();
                self.groups.push(GroupBuffers {
                    vertices,
                    count: figure.group.particle_count() as u32,
                    clones,
                });
                figure.group.mark_uploaded();
            }

            let buffers = &self.groups[id];
            if figure.group.needs_upload() {
                self.queue
                    .write_buffer(&buffers.vertices, 0, bytemuck::cast_slice(figure.group.positions()));
                figure.group.mark_uploaded();
            }

            for (i, (slot, entry)) in buffers.clones.iter().zip(figure.clones.entries()).enumerate() {
                slot.write(
                    &self.queue,
                    figure.clones.world_matrix(i, rotation),
                    entry.color,
                    CLONE_POINT_SIZE,
                );
            }
        }

        for (buffers, item) in self.decoration.iter().zip(ctx.decoration()) {
            buffers
                .slot
                .write(&self.queue, item.world_matrix(rotation), item.color, item.point_size);
        }
    }

    fn update_frame_uniforms(&self) {
        let aspect = self.config.width as f32 / self.config.height as f32;
        let view = self.camera.view_matrix();
        let view_proj = self.camera.projection(aspect) * view;

        let uniforms = FrameUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            fog_color: color_from_hex(BACKGROUND).to_array(),
            fog_density: FOG_DENSITY,
            viewport: [self.config.width as f32, self.config.height as f32],
            _padding: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Draw a frame. `tick` advances the film grain.
    pub fn render(&mut self, tick: f32) -> Result<(), wgpu::SurfaceError> {
        self.update_frame_uniforms();
        self.post.tick(&self.queue, tick);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let background = color_from_hex(BACKGROUND);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.post.scene_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background.x as f64,
                            g: background.y as f64,
                            b: background.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.post.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.point_pipeline);
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for item in &self.decoration {
                render_pass.set_bind_group(1, &item.slot.bind_group, &[]);
                render_pass.set_vertex_buffer(0, item.vertices.slice(..));
                render_pass.draw(0..6, 0..item.count);
            }

            for group in &self.groups {
                render_pass.set_vertex_buffer(0, group.vertices.slice(..));
                for slot in &group.clones {
                    render_pass.set_bind_group(1, &slot.bind_group, &[]);
                    render_pass.draw(0..6, 0..group.count);
                }
            }
        }

        self.post.record(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn test_surface_format_prefers_linear() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(choose_surface_format(&formats).unwrap(), TextureFormat::Bgra8Unorm);
    }

    #[test]
    fn test_surface_format_falls_back_to_first() {
        let formats = [TextureFormat::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats).unwrap(), TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn test_surface_without_formats_is_an_error() {
        assert!(matches!(choose_surface_format(&[]), Err(GpuError::UnsupportedSurface)));
    }
}
