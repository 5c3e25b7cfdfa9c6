//! Rasterizes the printable-ASCII glyph atlas with `ab_glyph` and
//! uploads it as a single `wgpu::Texture`, handing `crates/core` back a
//! [`GlyphAtlas`] with real per-glyph advances and packed UV rects.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use flamepprof_core::render::text::{GlyphAtlas, GlyphMetrics};
use flamepprof_protocol::Color;

const FIRST_GLYPH: u32 = 0x20;
const LAST_GLYPH: u32 = 0x7e;
// Non-ASCII but needed for truncation; packed at the end of the atlas.
const ELLIPSIS: char = '…';

pub struct RasterizedAtlas {
    pub atlas: GlyphAtlas,
    pub texture_width: u32,
    pub texture_height: u32,
    /// Single-channel (R8) coverage bitmap, row-major.
    pub pixels: Vec<u8>,
}

/// Rasterizes every printable ASCII glyph plus the ellipsis at
/// `font_size * dpr` pixels, packed left-to-right in a single row whose
/// height is the tallest glyph's bounding box.
pub fn rasterize_ascii_atlas(
    font: &FontArc,
    font_family: &str,
    text_color: Color,
    font_size: f64,
    dpr: f64,
) -> RasterizedAtlas {
    let px = PxScale::from((font_size * dpr) as f32);
    let scaled = font.as_scaled(px);

    let mut chars: Vec<char> = (FIRST_GLYPH..=LAST_GLYPH)
        .filter_map(char::from_u32)
        .collect();
    chars.push(ELLIPSIS);

    let glyph_height = (scaled.ascent() - scaled.descent()).ceil().max(1.0) as u32;
    let mut cursor_x = 0u32;
    let mut cells = Vec::with_capacity(chars.len());

    for &c in &chars {
        let glyph_id = font.glyph_id(c);
        let advance = scaled.h_advance(glyph_id);
        let width = advance.ceil().max(1.0) as u32;
        cells.push((c, cursor_x, width, advance as f64));
        cursor_x += width;
    }

    let texture_width = cursor_x.max(1);
    let texture_height = glyph_height;
    let mut pixels = vec![0u8; (texture_width * texture_height) as usize];

    for &(c, cell_x, cell_w, _) in &cells {
        let glyph_id = font.glyph_id(c);
        let glyph = glyph_id.with_scale_and_position(px, ab_glyph::point(0.0, scaled.ascent()));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px_x = cell_x as i32 + bounds.min.x as i32 + gx as i32;
                let px_y = bounds.min.y as i32 + gy as i32;
                if px_x < 0 || px_y < 0 {
                    return;
                }
                let (px_x, px_y) = (px_x as u32, px_y as u32);
                if px_x < cell_x + cell_w && px_x < texture_width && px_y < texture_height {
                    let idx = (px_y * texture_width + px_x) as usize;
                    pixels[idx] = (coverage * 255.0) as u8;
                }
            });
        }
    }

    let to_metrics = |cell_x: u32, cell_w: u32, advance: f64| GlyphMetrics {
        atlas_x: cell_x as f32 / texture_width as f32,
        atlas_y: 0.0,
        atlas_w: cell_w as f32 / texture_width as f32,
        atlas_h: 1.0,
        advance,
    };

    let metrics: Vec<GlyphMetrics> = cells
        .iter()
        .filter(|(c, ..)| *c != ELLIPSIS)
        .map(|&(_, cell_x, cell_w, advance)| to_metrics(cell_x, cell_w, advance))
        .collect();
    let (_, ellipsis_x, ellipsis_w, ellipsis_advance) = *cells
        .iter()
        .find(|(c, ..)| *c == ELLIPSIS)
        .expect("ellipsis glyph was always pushed onto `chars`");
    let ellipsis = to_metrics(ellipsis_x, ellipsis_w, ellipsis_advance);

    let atlas = GlyphAtlas::from_metrics(font_family, text_color, metrics, ellipsis);

    RasterizedAtlas {
        atlas,
        texture_width,
        texture_height,
        pixels,
    }
}

pub fn upload_atlas_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    rasterized: &RasterizedAtlas,
) -> (wgpu::Texture, wgpu::TextureView) {
    let size = wgpu::Extent3d {
        width: rasterized.texture_width,
        height: rasterized.texture_height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("glyph atlas"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &rasterized.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(rasterized.texture_width),
            rows_per_image: Some(rasterized.texture_height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}
