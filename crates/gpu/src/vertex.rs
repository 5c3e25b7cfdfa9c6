use flamepprof_core::render::{FrameQuad, GlyphQuad};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TextVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl FrameVertex {
    pub const ATTRIBS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<FrameVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

impl TextVertex {
    pub const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TextVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Triangulates one [`FrameQuad`] into two CCW triangles (six vertices,
/// no index buffer — frame counts are small enough that this is simpler
/// than maintaining an index buffer alongside a growing vertex buffer).
pub fn frame_quad_to_vertices(quad: &FrameQuad) -> [FrameVertex; 6] {
    let rect = quad.rect;
    let color = [
        quad.color.r,
        quad.color.g,
        quad.color.b,
        quad.color.a * quad.opacity as f32,
    ];
    let (x0, y0) = (rect.x as f32, rect.y as f32);
    let (x1, y1) = (rect.right() as f32, rect.bottom() as f32);
    [
        FrameVertex { position: [x0, y0], color },
        FrameVertex { position: [x1, y0], color },
        FrameVertex { position: [x0, y1], color },
        FrameVertex { position: [x0, y1], color },
        FrameVertex { position: [x1, y0], color },
        FrameVertex { position: [x1, y1], color },
    ]
}

/// Triangulates one [`GlyphQuad`] using its atlas-normalized UV rect.
pub fn glyph_quad_to_vertices(quad: &GlyphQuad) -> [TextVertex; 6] {
    let color = [quad.color.r, quad.color.g, quad.color.b, quad.alpha as f32];
    let (x0, y0) = (quad.x as f32, quad.y as f32);
    let (x1, y1) = ((quad.x + quad.w) as f32, (quad.y + quad.h) as f32);
    let atlas = quad.atlas;
    let (u0, v0) = (atlas.atlas_x, atlas.atlas_y);
    let (u1, v1) = (atlas.atlas_x + atlas.atlas_w, atlas.atlas_y + atlas.atlas_h);
    [
        TextVertex { position: [x0, y0], uv: [u0, v0], color },
        TextVertex { position: [x1, y0], uv: [u1, v0], color },
        TextVertex { position: [x0, y1], uv: [u0, v1], color },
        TextVertex { position: [x0, y1], uv: [u0, v1], color },
        TextVertex { position: [x1, y0], uv: [u1, v0], color },
        TextVertex { position: [x1, y1], uv: [u1, v1], color },
    ]
}
