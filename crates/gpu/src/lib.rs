//! Thin wgpu backend for flamepprof: uploads the render-data builders in
//! `flamepprof_core::render` to the GPU across two passes (filled rects,
//! then glyph-atlas text) sharing one pixels-to-clip-space matrix.

mod error;
mod glyph_raster;
mod pipeline;
mod vertex;

use std::sync::Arc;

use ab_glyph::FontArc;
use flamepprof_core::camera::Camera;
use flamepprof_core::render::text::GlyphAtlas;
use flamepprof_core::render::{FrameQuad, GlyphQuad};
use flamepprof_protocol::Color;
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use error::RenderError;
pub use glyph_raster::{rasterize_ascii_atlas, upload_atlas_texture, RasterizedAtlas};

/// Backs the canvas at `dpr` × logical size, capped to avoid driver
/// edge cases on very large or hi-dpi displays.
pub const FRAMEBUFFER_DIMENSION_CAP: u32 = 4096;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GlobalsUniform {
    clip_matrix: [[f32; 4]; 4],
}

pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,

    frame_pipeline: pipeline::FramePipeline,
    text_pipeline: pipeline::TextPipeline,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    atlas_texture: Option<wgpu::Texture>,
    atlas_view: Option<wgpu::TextureView>,
    atlas_sampler: wgpu::Sampler,
    atlas_bind_group: Option<wgpu::BindGroup>,
    pub glyph_atlas: Option<GlyphAtlas>,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| {
                tracing::error!("no compatible wgpu adapter found");
                RenderError::NoAdapter
            })?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flamepprof device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .inspect_err(|err| tracing::error!(error = %err, "device request failed"))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps.formats[0];
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.min(FRAMEBUFFER_DIMENSION_CAP).max(1),
            height: size.height.min(FRAMEBUFFER_DIMENSION_CAP).max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let frame_pipeline = pipeline::create_frame_pipeline(&device, format);
        let text_pipeline = pipeline::create_text_pipeline(&device, format);

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&GlobalsUniform { clip_matrix: identity_matrix() }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals bind group"),
            layout: &frame_pipeline.globals_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let atlas_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glyph atlas sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            device,
            queue,
            surface,
            config,
            frame_pipeline,
            text_pipeline,
            globals_buffer,
            globals_bind_group,
            atlas_texture: None,
            atlas_view: None,
            atlas_sampler,
            atlas_bind_group: None,
            glyph_atlas: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.min(FRAMEBUFFER_DIMENSION_CAP).max(1);
        self.config.height = height.min(FRAMEBUFFER_DIMENSION_CAP).max(1);
        self.surface.configure(&self.device, &self.config);
    }

    /// Rebuilds the glyph atlas texture, e.g. after font family or text
    /// color changes per the spec's atlas-rebuild trigger.
    pub fn rebuild_glyph_atlas(&mut self, font: &FontArc, font_family: &str, text_color: Color, font_size: f64, dpr: f64) {
        let rasterized = rasterize_ascii_atlas(font, font_family, text_color, font_size, dpr);
        let (texture, view) = upload_atlas_texture(&self.device, &self.queue, &rasterized);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glyph atlas bind group"),
            layout: &self.text_pipeline.atlas_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.atlas_sampler) },
            ],
        });
        self.atlas_texture = Some(texture);
        self.atlas_view = Some(view);
        self.atlas_bind_group = Some(bind_group);
        self.glyph_atlas = Some(rasterized.atlas);
    }

    /// Draws one frame: frame-quad pass, then glyph-quad pass, sharing
    /// `camera`'s screen-to-clip matrix.
    pub fn render(&mut self, camera: &Camera, frame_quads: &[FrameQuad], glyph_quads: &[GlyphQuad], clear_color: Color) -> Result<(), RenderError> {
        let matrix = camera.screen_to_clip_matrix();
        self.queue.write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&GlobalsUniform { clip_matrix: matrix }));

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame encoder"),
        });

        let frame_vertices: Vec<vertex::FrameVertex> = frame_quads.iter().flat_map(vertex::frame_quad_to_vertices).collect();
        let frame_buffer = (!frame_vertices.is_empty()).then(|| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("frame vertices"),
                contents: bytemuck::cast_slice(&frame_vertices),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear_color.r as f64,
                            g: clear_color.g as f64,
                            b: clear_color.b as f64,
                            a: clear_color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(buffer) = &frame_buffer {
                pass.set_pipeline(&self.frame_pipeline.pipeline);
                pass.set_bind_group(0, &self.globals_bind_group, &[]);
                pass.set_vertex_buffer(0, buffer.slice(..));
                pass.draw(0..frame_vertices.len() as u32, 0..1);
            }
        }

        let text_vertices: Vec<vertex::TextVertex> = glyph_quads.iter().flat_map(vertex::glyph_quad_to_vertices).collect();
        if let (Some(atlas_bind_group), false) = (&self.atlas_bind_group, text_vertices.is_empty()) {
            let text_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("text vertices"),
                contents: bytemuck::cast_slice(&text_vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("text pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.text_pipeline.pipeline);
            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            pass.set_bind_group(1, atlas_bind_group, &[]);
            pass.set_vertex_buffer(0, text_buffer.slice(..));
            pass.draw(0..text_vertices.len() as u32, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn identity_matrix() -> [[f32; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}
