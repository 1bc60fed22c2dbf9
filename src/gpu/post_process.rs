//! Post-processing chain for the rendered scene.
//!
//! The scene is drawn into the first of two offscreen targets. Each pass
//! then reads one target and writes the other, and the last pass writes
//! straight to the surface:
//!
//! ```text
//! scene -> A --bloom--> B --film--> A --focus--> surface
//! ```

use super::DEPTH_FORMAT;
use crate::shader::{post_pass_source, PostUniforms, BLOOM_WGSL, FILM_WGSL, FOCUS_WGSL};

/// Bloom strength added back onto the scene.
pub const BLOOM_STRENGTH: f32 = 0.75;
/// Film grain intensity.
pub const FILM_NOISE: f32 = 0.5;
/// Film scanline intensity.
pub const FILM_SCANLINES: f32 = 0.5;
/// Number of film scanlines.
pub const FILM_SCANLINE_COUNT: f32 = 1448.0;
/// Focus sample spread.
pub const FOCUS_SAMPLE_DISTANCE: f32 = 0.94;
/// Focus wave factor.
pub const FOCUS_WAVE_FACTOR: f32 = 0.00125;

/// One offscreen colour target.
struct Target {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Target {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
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
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// A fullscreen pass.
struct Pass {
    label: &'static str,
    pipeline: wgpu::RenderPipeline,
}

/// GPU resources for bloom, film and focus.
pub struct PostChain {
    targets: [Target; 2],
    depth_view: wgpu::TextureView,
    /// Bind groups reading target A and target B respectively.
    bind_groups: [wgpu::BindGroup; 2],
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    passes: Vec<Pass>,
    format: wgpu::TextureFormat,
    uniforms: PostUniforms,
}

impl PostChain {
    /// Create the chain for a surface of the given size and format.
    pub fn new(device: &wgpu::Device, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let targets = [
            Target::new(device, "Post Target A", width, height, format),
            Target::new(device, "Post Target B", width, height, format),
        ];
        let depth_view = create_depth_view(device, width, height);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniforms = PostUniforms {
            resolution: [width as f32, height as f32],
            time: 0.0,
            bloom_strength: BLOOM_STRENGTH,
            noise_intensity: FILM_NOISE,
            scanline_intensity: FILM_SCANLINES,
            scanline_count: FILM_SCANLINE_COUNT,
            grayscale: 0,
            sample_distance: FOCUS_SAMPLE_DISTANCE,
            wave_factor: FOCUS_WAVE_FACTOR,
            _padding: [0.0; 2],
        };
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Post Uniform Buffer"),
            size: std::mem::size_of::<PostUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let bind_groups = create_bind_groups(device, &bind_group_layout, &targets, &sampler, &uniform_buffer);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let passes = [("Bloom", BLOOM_WGSL), ("Film", FILM_WGSL), ("Focus", FOCUS_WGSL)]
            .into_iter()
            .map(|(label, fragment)| Pass {
                label,
                pipeline: create_pass_pipeline(device, &pipeline_layout, label, fragment, format),
            })
            .collect();

        Self {
            targets,
            depth_view,
            bind_groups,
            bind_group_layout,
            sampler,
            uniform_buffer,
            passes,
            format,
            uniforms,
        }
    }

    /// Where the scene pass should draw.
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.targets[0].view
    }

    /// Depth buffer matching the scene target.
    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Recreate targets and bind groups after a resize.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.targets = [
            Target::new(device, "Post Target A", width, height, self.format),
            Target::new(device, "Post Target B", width, height, self.format),
        ];
        self.depth_view = create_depth_view(device, width, height);
        self.bind_groups = create_bind_groups(
            device,
            &self.bind_group_layout,
            &self.targets,
            &self.sampler,
            &self.uniform_buffer,
        );
        self.uniforms.resolution = [width as f32, height as f32];
    }

    /// Advance film grain time and upload the uniforms.
    pub fn tick(&mut self, queue: &wgpu::Queue, delta: f32) {
        self.uniforms.time += delta;
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    /// Record every pass, ending on `output`.
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let last = self.passes.len() - 1;
        for (i, pass) in self.passes.iter().enumerate() {
            let read = i % 2;
            let write = if i == last { output } else { &self.targets[1 - read].view };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: write,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_pipeline(&pass.pipeline);
            render_pass.set_bind_group(0, &self.bind_groups[read], &[]);
            render_pass.draw(0..3, 0..1);
        }
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_bind_groups(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    targets: &[Target; 2],
    sampler: &wgpu::Sampler,
    uniform_buffer: &wgpu::Buffer,
) -> [wgpu::BindGroup; 2] {
    let bind = |target: &Target, label: &str| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        })
    };
    [
        bind(&targets[0], "Post Bind Group A"),
        bind(&targets[1], "Post Bind Group B"),
    ]
}

fn create_pass_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    label: &str,
    fragment: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(post_pass_source(fragment).into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
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
        multiview: None,
        cache: None,
    })
}
