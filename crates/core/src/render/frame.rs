//! Component F: frame renderer data builder.

use std::collections::HashMap;

use flamepprof_protocol::{Color, Rect};

use crate::camera::Camera;
use crate::tree::layout::FrameRecord;

#[derive(Debug, Clone, Copy)]
pub struct FrameQuad {
    pub node_index: usize,
    pub rect: Rect,
    pub color: Color,
    pub opacity: f64,
}

pub struct FrameRenderInputs<'a> {
    pub frames: &'a [FrameRecord],
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub frame_height: f64,
    pub primary: Color,
    pub secondary: Color,
    pub selected_id: Option<&'a str>,
    pub hovered_id: Option<&'a str>,
    pub selected_opacity: f64,
    pub hover_opacity: f64,
    pub unselected_opacity: f64,
}

const CULL_MARGIN: f64 = 50.0;
const INSET: f64 = 0.5;

/// Builds one [`FrameQuad`] per visible frame: screen rect, same-depth-
/// ratio color, and selection-aware opacity.
pub fn build_frame_quads(camera: &Camera, inputs: &FrameRenderInputs<'_>) -> Vec<FrameQuad> {
    let depth_totals = same_depth_totals(inputs.frames);
    let viewport = Rect::new(0.0, 0.0, inputs.viewport_width, inputs.viewport_height);

    let mut quads = Vec::with_capacity(inputs.frames.len());
    for frame in inputs.frames {
        let sx1 = frame.x * inputs.viewport_width * camera.scale() + camera.x();
        let sx2 = (frame.x + frame.width) * inputs.viewport_width * camera.scale() + camera.x();
        let sy = frame.depth as f64 * inputs.frame_height + camera.y();

        let rect = Rect::new(sx1, sy, (sx2 - sx1).max(0.0), inputs.frame_height);
        if rect.culled_by(viewport, CULL_MARGIN) {
            continue;
        }
        let rect = rect.inset(INSET);

        let total_at_depth = depth_totals.get(&frame.depth).copied().unwrap_or(0.0);
        let r = if total_at_depth > 0.0 {
            frame.value / total_at_depth
        } else {
            0.0
        };
        let color = inputs.primary.lerp(inputs.secondary, 1.0 - (r * r) as f32);

        let opacity = if inputs.selected_id == Some(frame.id.as_ref()) {
            inputs.selected_opacity
        } else if inputs.hovered_id == Some(frame.id.as_ref()) {
            inputs.hover_opacity
        } else {
            inputs.unselected_opacity
        };

        quads.push(FrameQuad {
            node_index: frame.node_index,
            rect,
            color,
            opacity,
        });
    }
    quads
}

fn same_depth_totals(frames: &[FrameRecord]) -> HashMap<u32, f64> {
    let mut totals: HashMap<u32, f64> = HashMap::new();
    for frame in frames {
        *totals.entry(frame.depth).or_insert(0.0) += frame.value;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use flamepprof_protocol::SharedStr;

    fn frame(id: &str, depth: u32, x: f64, width: f64, value: f64) -> FrameRecord {
        FrameRecord {
            node_index: 0,
            id: SharedStr::from(id),
            name: SharedStr::from(id),
            depth,
            x,
            width,
            value,
            self_value: value,
        }
    }

    #[test]
    fn quad_is_inset_by_half_pixel() {
        let camera = Camera::new(1000.0, 600.0);
        let frames = vec![frame("root", 0, 0.0, 1.0, 1.0)];
        let inputs = FrameRenderInputs {
            frames: &frames,
            viewport_width: 1000.0,
            viewport_height: 600.0,
            frame_height: 21.0,
            primary: Color::rgb(1.0, 0.0, 0.0),
            secondary: Color::rgb(0.0, 0.0, 1.0),
            selected_id: None,
            hovered_id: None,
            selected_opacity: 1.0,
            hover_opacity: 0.9,
            unselected_opacity: 0.75,
        };
        let quads = build_frame_quads(&camera, &inputs);
        assert_eq!(quads.len(), 1);
        assert!((quads[0].rect.x - 0.5).abs() < 1e-9);
        assert!((quads[0].rect.y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn opacity_reflects_selection_and_hover() {
        let camera = Camera::new(1000.0, 600.0);
        let frames = vec![frame("root/A", 0, 0.0, 0.5, 1.0), frame("root/B", 0, 0.5, 0.5, 1.0)];
        let inputs = FrameRenderInputs {
            frames: &frames,
            viewport_width: 1000.0,
            viewport_height: 600.0,
            frame_height: 21.0,
            primary: Color::rgb(1.0, 0.0, 0.0),
            secondary: Color::rgb(0.0, 0.0, 1.0),
            selected_id: Some("root/A"),
            hovered_id: Some("root/B"),
            selected_opacity: 1.0,
            hover_opacity: 0.9,
            unselected_opacity: 0.75,
        };
        let quads = build_frame_quads(&camera, &inputs);
        let a = quads.iter().find(|q| q.node_index == 0).unwrap();
        assert_eq!(a.opacity, 1.0);
    }

    #[test]
    fn fully_culled_frame_is_dropped() {
        let camera = Camera::new(1000.0, 600.0);
        // Depth 1000 puts the frame's screen-space row far below the
        // viewport + cull margin regardless of camera state.
        let frames = vec![frame("off", 1000, 0.0, 0.001, 1.0)];
        let inputs = FrameRenderInputs {
            frames: &frames,
            viewport_width: 1000.0,
            viewport_height: 600.0,
            frame_height: 21.0,
            primary: Color::rgb(1.0, 0.0, 0.0),
            secondary: Color::rgb(0.0, 0.0, 1.0),
            selected_id: None,
            hovered_id: None,
            selected_opacity: 1.0,
            hover_opacity: 0.9,
            unselected_opacity: 0.75,
        };
        let quads = build_frame_quads(&camera, &inputs);
        assert!(quads.is_empty());
    }
}
