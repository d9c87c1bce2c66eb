use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::{MuseumError, Result};
use crate::layout_engine::FrameInstance;
use crate::particle_system::ConfettiInstance;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    screen_size: [f32; 2],
    time: f32,
    _padding: f32,
}

/// Gallery wall behind the confetti
pub const WALL_COLOR: wgpu::Color = wgpu::Color {
    r: 0.09,
    g: 0.07,
    b: 0.06,
    a: 1.0,
};

pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    frame_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    frame_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    max_instances: usize,
    max_frames: usize,
}

const QUAD_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x2,
    }],
};

const CONFETTI_ATTRIBUTES: [wgpu::VertexAttribute; 5] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x2, // position
    },
    wgpu::VertexAttribute {
        offset: 8,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32, // size
    },
    wgpu::VertexAttribute {
        offset: 12,
        shader_location: 3,
        format: wgpu::VertexFormat::Float32, // rotation
    },
    wgpu::VertexAttribute {
        offset: 16,
        shader_location: 4,
        format: wgpu::VertexFormat::Float32x4, // color
    },
    wgpu::VertexAttribute {
        offset: 32,
        shader_location: 5,
        format: wgpu::VertexFormat::Uint32, // shape
    },
];

const FRAME_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x2, // position
    },
    wgpu::VertexAttribute {
        offset: 8,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x2, // size
    },
    wgpu::VertexAttribute {
        offset: 16,
        shader_location: 3,
        format: wgpu::VertexFormat::Float32x4, // color
    },
];

/// Alpha-blended instanced quad pipeline sharing the uniform layout
fn quad_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    instance_layout: wgpu::VertexBufferLayout<'_>,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[QUAD_LAYOUT, instance_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

impl Renderer {
    pub async fn new(window: Arc<Window>, max_instances: usize, max_frames: usize) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| MuseumError::Render(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| MuseumError::Render("no compatible GPU adapter".to_string()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Museum Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| MuseumError::Render(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| MuseumError::Render("surface has no formats".to_string()))?;
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
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Unit quad, expanded per instance in the vertex shader
        let vertices: &[f32] = &[
            -1.0, -1.0, //
            1.0, -1.0, //
            1.0, 1.0, //
            -1.0, -1.0, //
            1.0, 1.0, //
            -1.0, 1.0, //
        ];

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Confetti Instance Buffer"),
            size: (max_instances.max(1) * std::mem::size_of::<ConfettiInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Instance Buffer"),
            size: (max_frames.max(1) * std::mem::size_of::<FrameInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniforms = Uniforms {
            screen_size: [config.width as f32, config.height as f32],
            time: 0.0,
            _padding: 0.0,
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("Uniform Bind Group Layout"),
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("Uniform Bind Group"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Confetti Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/confetti.wgsl").into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = quad_pipeline(
            &device,
            &render_pipeline_layout,
            &shader,
            config.format,
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<ConfettiInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &CONFETTI_ATTRIBUTES,
            },
            "Confetti Render Pipeline",
        );

        let frame_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Frame Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/frames.wgsl").into()),
        });

        let frame_pipeline = quad_pipeline(
            &device,
            &render_pipeline_layout,
            &frame_shader,
            config.format,
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<FrameInstance>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &FRAME_ATTRIBUTES,
            },
            "Frame Render Pipeline",
        );

        log::info!(
            "Renderer ready: {}x{} {:?}, {} confetti slots, {} frame slots",
            config.width,
            config.height,
            config.format,
            max_instances,
            max_frames
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            frame_pipeline,
            vertex_buffer,
            instance_buffer,
            frame_buffer,
            uniform_buffer,
            uniform_bind_group,
            max_instances: max_instances.max(1),
            max_frames: max_frames.max(1),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Draw one frame: collage frames first, confetti on top. Instances past
    /// either buffer's capacity are dropped.
    pub fn render(
        &mut self,
        frames: &[FrameInstance],
        instances: &[ConfettiInstance],
        time: f32,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let frame_count = frames.len().min(self.max_frames);
        if frame_count > 0 {
            self.queue.write_buffer(
                &self.frame_buffer,
                0,
                bytemuck::cast_slice(&frames[..frame_count]),
            );
        }

        let count = instances.len().min(self.max_instances);
        if count < instances.len() {
            log::warn!(
                "Dropping {} confetti pieces over capacity {}",
                instances.len() - count,
                self.max_instances
            );
        }
        if count > 0 {
            self.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&instances[..count]),
            );
        }

        let uniforms = Uniforms {
            screen_size: [self.size.width as f32, self.size.height as f32],
            time,
            _padding: 0.0,
        };
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[uniforms]),
        );

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
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Gallery Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(WALL_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

            if frame_count > 0 {
                render_pass.set_pipeline(&self.frame_pipeline);
                render_pass.set_vertex_buffer(1, self.frame_buffer.slice(..));
                render_pass.draw(0..6, 0..frame_count as u32);
            }

            if count > 0 {
                render_pass.set_pipeline(&self.render_pipeline);
                render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

                // every piece in one instanced draw
                render_pass.draw(0..6, 0..count as u32);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_layout_matches_shader_offsets() {
        assert_eq!(std::mem::size_of::<ConfettiInstance>(), 48);
        assert_eq!(std::mem::size_of::<FrameInstance>(), 32);
        assert_eq!(FRAME_ATTRIBUTES[2].offset, 16);
        assert_eq!(CONFETTI_ATTRIBUTES[4].offset, 32);
        assert_eq!(std::mem::size_of::<Uniforms>(), 16);
    }
}
