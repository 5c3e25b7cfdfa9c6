//! Component G: text renderer data builder.
//!
//! Owns glyph-atlas layout math and per-frame text-slot truncation.
//! Actual glyph rasterization (character → coverage bitmap) happens in
//! `crates/gpu`; this module only decides which characters are drawn,
//! where, and at what alpha.

use flamepprof_protocol::Color;

const FIRST_GLYPH: char = ' '; // U+0020
const LAST_GLYPH: char = '~'; // U+007E
const ELLIPSIS: char = '…';
const RIGHT_EDGE_FADE_WIDTH: f64 = 15.0;
const MIN_TEXT_WIDTH: f64 = 16.0;

/// Normalized atlas coordinates and advance width for one glyph.
#[derive(Debug, Clone, Copy)]
pub struct GlyphMetrics {
    pub atlas_x: f32,
    pub atlas_y: f32,
    pub atlas_w: f32,
    pub atlas_h: f32,
    pub advance: f64,
}

/// A packed ASCII glyph atlas. `crates/gpu` is responsible for actually
/// rasterizing glyphs into the backing texture at `font_size * dpr`;
/// this struct only records the resulting layout.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    pub font_family: String,
    pub text_color: Color,
    metrics: Vec<GlyphMetrics>,
    /// `…` is outside the printable-ASCII range the atlas otherwise
    /// packs, but truncation needs it, so it is tracked separately.
    ellipsis: GlyphMetrics,
}

impl GlyphAtlas {
    /// Builds an atlas layout for printable ASCII, packed in a single
    /// row of equal-width cells (the rasterizer in `crates/gpu` supplies
    /// the real per-glyph advance after shaping; this cheap uniform
    /// layout is what the core can compute without a font backend).
    pub fn new(font_family: impl Into<String>, text_color: Color, approx_advance: f64) -> Self {
        let glyph_count = (LAST_GLYPH as u32 - FIRST_GLYPH as u32 + 1) as usize;
        let cell_w = 1.0 / glyph_count as f32;
        let metrics = (0..glyph_count)
            .map(|i| GlyphMetrics {
                atlas_x: i as f32 * cell_w,
                atlas_y: 0.0,
                atlas_w: cell_w,
                atlas_h: 1.0,
                advance: approx_advance,
            })
            .collect();
        let ellipsis = GlyphMetrics { atlas_x: 0.0, atlas_y: 0.0, atlas_w: cell_w, atlas_h: 1.0, advance: approx_advance };
        Self {
            font_family: font_family.into(),
            text_color,
            metrics,
            ellipsis,
        }
    }

    /// Builds an atlas from caller-supplied per-glyph metrics, e.g. a
    /// real rasterizer's packed layout and shaped advances (`crates/gpu`
    /// uses this after rasterizing with `ab_glyph`; `metrics` must cover
    /// exactly the printable ASCII range in order, and `ellipsis` is its
    /// separately-packed `…` glyph).
    pub fn from_metrics(
        font_family: impl Into<String>,
        text_color: Color,
        metrics: Vec<GlyphMetrics>,
        ellipsis: GlyphMetrics,
    ) -> Self {
        Self {
            font_family: font_family.into(),
            text_color,
            metrics,
            ellipsis,
        }
    }

    fn metrics_for(&self, c: char) -> Option<GlyphMetrics> {
        if c == ELLIPSIS {
            return Some(self.ellipsis);
        }
        if !(FIRST_GLYPH..=LAST_GLYPH).contains(&c) {
            return None;
        }
        let idx = c as u32 - FIRST_GLYPH as u32;
        self.metrics.get(idx as usize).copied()
    }

    /// Whether `self` should be rebuilt for a new `(font_family,
    /// text_color)` pair.
    pub fn needs_rebuild(&self, font_family: &str, text_color: Color) -> bool {
        self.font_family != font_family || self.text_color != text_color
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GlyphQuad {
    pub node_index: usize,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub atlas: GlyphMetrics,
    pub color: Color,
    pub alpha: f64,
    pub is_shadow: bool,
}

pub struct TextRenderInputs<'a> {
    pub atlas: &'a GlyphAtlas,
    pub label: &'a str,
    pub node_index: usize,
    /// Screen-space left edge of the frame (`sx1`, possibly negative).
    pub sx1: f64,
    pub sx2: f64,
    pub sy: f64,
    pub frame_height: f64,
    pub font_size: f64,
    pub frame_padding: f64,
    pub shadow_opacity: f64,
    pub frame_opacity: f64,
}

/// Lays out glyph quads for one frame's label, truncating with an
/// ellipsis when the text would overflow the frame, and fading the last
/// 15px of the slot so truncated text never visually collides with the
/// frame edge.
pub fn build_glyph_quads(inputs: &TextRenderInputs<'_>) -> Vec<GlyphQuad> {
    let min_frame_height = inputs.font_size + 2.0 * inputs.frame_padding;
    if inputs.frame_height < min_frame_height {
        return Vec::new();
    }

    let text_x = (inputs.sx1 + inputs.frame_padding).max(inputs.frame_padding);
    let max_text_width = (inputs.sx2 - inputs.sx1.max(0.0)) - 2.0 * inputs.frame_padding;
    if max_text_width < MIN_TEXT_WIDTH {
        return Vec::new();
    }

    let kept = truncate_to_width(inputs.atlas, inputs.label, max_text_width);

    let mut quads = Vec::with_capacity(kept.len() * 2);
    let mut cursor = text_x;
    let slot_right = text_x + max_text_width;
    for c in kept.chars() {
        let Some(metrics) = inputs.atlas.metrics_for(c) else {
            continue;
        };
        let glyph_right = cursor + metrics.advance;
        let distance_to_edge = (slot_right - glyph_right).max(0.0);
        let fade = if distance_to_edge < RIGHT_EDGE_FADE_WIDTH {
            (distance_to_edge / RIGHT_EDGE_FADE_WIDTH).clamp(0.0, 1.0)
        } else {
            1.0
        };

        if inputs.shadow_opacity > 0.0 {
            quads.push(GlyphQuad {
                node_index: inputs.node_index,
                x: cursor + 1.0,
                y: inputs.sy + 1.0,
                w: metrics.advance,
                h: inputs.font_size,
                atlas: metrics,
                color: Color::rgb(0.0, 0.0, 0.0),
                alpha: inputs.shadow_opacity * inputs.frame_opacity * fade,
                is_shadow: true,
            });
        }

        quads.push(GlyphQuad {
            node_index: inputs.node_index,
            x: cursor,
            y: inputs.sy,
            w: metrics.advance,
            h: inputs.font_size,
            atlas: metrics,
            color: inputs.atlas.text_color,
            alpha: inputs.frame_opacity * fade,
            is_shadow: false,
        });

        cursor += metrics.advance;
    }
    quads
}

/// Greedily consumes characters until the next would exceed
/// `max_width`; replaces the last kept character with an ellipsis if
/// truncation occurred and space permits.
fn truncate_to_width(atlas: &GlyphAtlas, label: &str, max_width: f64) -> String {
    let mut width = 0.0;
    let mut out = String::new();
    let mut truncated = false;

    for c in label.chars() {
        let Some(metrics) = atlas.metrics_for(c) else {
            continue;
        };
        if width + metrics.advance > max_width {
            truncated = true;
            break;
        }
        width += metrics.advance;
        out.push(c);
    }

    if truncated {
        if let Some(ellipsis) = atlas.metrics_for(ELLIPSIS) {
            while let Some(last) = out.pop() {
                let last_width = atlas.metrics_for(last).map(|m| m.advance).unwrap_or(0.0);
                width -= last_width;
                if width + ellipsis.advance <= max_width {
                    out.push(ELLIPSIS);
                    break;
                }
            }
        }
    }
    out
}
