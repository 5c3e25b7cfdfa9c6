//! Component H: interaction state machine.
//!
//! Owns pointer/wheel handling and the `At`/`Animating` camera-target
//! state machine. The async "next tick" delivery of `on_animation_complete`
//! is not performed here — `core` has no runtime — the caller (typically
//! `crates/app`'s event loop) is responsible for delivering a pending
//! completion no earlier than the following `update()` call.

use flamepprof_protocol::SharedStr;

use crate::camera::Camera;
use crate::tree::layout::FrameRecord;

const DRAG_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

/// Camera-target state: either settled `At` a frame, or `Animating`
/// toward one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionState {
    At(Option<SharedStr>),
    Animating(Option<SharedStr>),
}

pub struct Interaction {
    is_dragging: bool,
    has_dragged: bool,
    drag_start: Point,
    last: Point,
    pub hovered_id: Option<SharedStr>,
    pub selected_id: Option<SharedStr>,
    state: InteractionState,
    /// Set when a transition settles with no interpolation needed;
    /// the caller drains this to deliver `on_animation_complete` on the
    /// next event-loop turn, never synchronously.
    pending_completion: bool,
}

impl Interaction {
    /// `initial_root_child` is the lowest-depth real node, marked
    /// selected on load per §4.8's initial state.
    pub fn new(initial_root_child: Option<SharedStr>) -> Self {
        Self {
            is_dragging: false,
            has_dragged: false,
            drag_start: Point { x: 0.0, y: 0.0 },
            last: Point { x: 0.0, y: 0.0 },
            hovered_id: None,
            selected_id: initial_root_child.clone(),
            state: InteractionState::At(initial_root_child),
            pending_completion: false,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn has_dragged(&self) -> bool {
        self.has_dragged
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.drag_start = Point { x, y };
        self.last = Point { x, y };
        self.is_dragging = true;
        self.has_dragged = false;
    }

    /// Returns the `(dx, dy)` the caller should pan the camera by, if
    /// the drag threshold has been exceeded; always updates
    /// [`Self::hovered_id`] via hit test.
    pub fn pointer_move(
        &mut self,
        x: f64,
        y: f64,
        camera: &Camera,
        frame_height: f64,
        frames: &[FrameRecord],
    ) -> Option<(f64, f64)> {
        let mut pan = None;
        if self.is_dragging {
            let dist = ((x - self.drag_start.x).powi(2) + (y - self.drag_start.y).powi(2)).sqrt();
            if dist > DRAG_THRESHOLD {
                self.has_dragged = true;
            }
            if self.has_dragged {
                pan = Some((x - self.last.x, y - self.last.y));
            }
        }
        self.last = Point { x, y };
        self.hovered_id = hit_test(x, y, camera, frame_height, frames).map(|f| f.id.clone());
        pan
    }

    pub fn pointer_up(&mut self) {
        self.is_dragging = false;
        // has_dragged deliberately left set for the click handler.
    }

    /// Clears and returns the drag flag for callers that resolve their
    /// own hit (the hottest-frames strip) instead of routing through
    /// [`Self::click`]'s own hit test.
    pub fn consume_drag(&mut self) -> bool {
        std::mem::take(&mut self.has_dragged)
    }

    /// Outcome of a click: either a new animation target (`frame_id` is
    /// `None` for "zoom to root") or `None` when the click was
    /// suppressed by an intervening drag.
    pub fn click(
        &mut self,
        x: f64,
        y: f64,
        camera: &mut Camera,
        frame_height: f64,
        frames: &[FrameRecord],
    ) -> Option<SharedStr> {
        let dist = ((x - self.drag_start.x).powi(2) + (y - self.drag_start.y).powi(2)).sqrt();
        if self.has_dragged || dist > DRAG_THRESHOLD {
            self.has_dragged = false;
            return None;
        }
        self.has_dragged = false;

        let viewport_width = camera.viewport_width();
        let hit = hit_test(x, y, camera, frame_height, frames);
        let target = match hit {
            Some(frame) if self.selected_id.as_ref() == Some(&frame.id) => {
                self.selected_id = None;
                camera.reset_zoom();
                None
            }
            Some(frame) => {
                self.selected_id = Some(frame.id.clone());
                camera.zoom_to_frame(frame.x * viewport_width, (frame.x + frame.width) * viewport_width);
                Some(frame.id.clone())
            }
            None => {
                self.selected_id = None;
                camera.reset_zoom();
                None
            }
        };
        self.state = InteractionState::Animating(target.clone());
        if !camera.at_target() {
            // will settle on a later update()
        } else {
            self.pending_completion = true;
        }
        target
    }

    /// `dy` is wheel delta; `speed`/`inverted` come from config.
    pub fn wheel(&mut self, dy: f64, cx: f64, cy: f64, speed: f64, inverted: bool, camera: &mut Camera) {
        let sign = if dy > 0.0 {
            1.0
        } else if dy < 0.0 {
            -1.0
        } else {
            0.0
        };
        let factor = if inverted { 1.0 - speed * sign } else { 1.0 + speed * sign };
        camera.zoom_at(factor, cx, cy);
        self.state = InteractionState::Animating(self.selected_id.clone());
        if camera.at_target() {
            self.pending_completion = true;
        }
    }

    /// Advances the camera one tick. Returns `true` if the interaction
    /// state settled from `Animating` to `At` this call (the caller
    /// should schedule `on_animation_complete` no earlier than the next
    /// turn).
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let moved = camera.update();
        if !moved && matches!(self.state, InteractionState::Animating(_)) {
            if let InteractionState::Animating(id) = &self.state {
                self.state = InteractionState::At(id.clone());
            }
            return true;
        }
        false
    }

    /// Drains the pending completion flag set by a click/wheel that
    /// resolved instantly (no interpolation needed).
    pub fn take_pending_completion(&mut self) -> bool {
        std::mem::take(&mut self.pending_completion)
    }

    /// Selection from a hit the caller already resolved itself (the
    /// hottest-frames strip's cumulative-width hit test rather than
    /// [`hit_test`]'s screen hit test). Mirrors [`Self::click`]'s
    /// select/toggle/zoom outcome: re-selecting the current frame
    /// deselects and resets zoom instead of being a no-op.
    pub fn select_or_toggle(&mut self, id: Option<SharedStr>, frames: &[FrameRecord], camera: &mut Camera) -> Option<SharedStr> {
        let viewport_width = camera.viewport_width();
        let target = match id {
            Some(id) if self.selected_id.as_ref() == Some(&id) => {
                self.selected_id = None;
                camera.reset_zoom();
                None
            }
            Some(id) => {
                let frame = frames.iter().find(|f| f.id == id);
                self.selected_id = Some(id.clone());
                match frame {
                    Some(frame) => camera.zoom_to_frame(frame.x * viewport_width, (frame.x + frame.width) * viewport_width),
                    None => camera.reset_zoom(),
                }
                Some(id)
            }
            None => {
                self.selected_id = None;
                camera.reset_zoom();
                None
            }
        };
        self.state = InteractionState::Animating(target.clone());
        if camera.at_target() {
            self.pending_completion = true;
        }
        target
    }

    /// Programmatic selection: applies synchronously and, if the id
    /// differs from the current selection, starts a zoom animation.
    pub fn set_selected_frame(&mut self, id: Option<SharedStr>, frames: &[FrameRecord], camera: &mut Camera) {
        if self.selected_id == id {
            return;
        }
        self.selected_id = id.clone();
        let viewport_width = camera.viewport_width();
        match id.as_ref().and_then(|id| frames.iter().find(|f| &f.id == id)) {
            Some(frame) => {
                camera.zoom_to_frame(frame.x * viewport_width, (frame.x + frame.width) * viewport_width);
            }
            None => camera.reset_zoom(),
        }
        self.state = InteractionState::Animating(id);
    }
}

/// Transforms `(sx, sy)` into world coordinates — `wx` normalized to
/// `[0, 1]` against the viewport width (matching [`FrameRecord::x`]'s
/// normalization) and `wy` in stack-depth units — and scans frames for
/// the one with maximum depth whose rectangle contains the point.
fn hit_test<'a>(
    sx: f64,
    sy: f64,
    camera: &Camera,
    frame_height: f64,
    frames: &'a [FrameRecord],
) -> Option<&'a FrameRecord> {
    let wx = (sx - camera.x()) / (camera.scale() * camera.viewport_width());
    let wy = (sy - camera.y()) / frame_height;

    frames
        .iter()
        .filter(|f| {
            let left = f.x;
            let right = f.x + f.width;
            wx >= left && wx < right && (f.depth as f64) <= wy && wy < (f.depth as f64 + 1.0)
        })
        .max_by_key(|f| f.depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: &str, depth: u32, x: f64, width: f64) -> FrameRecord {
        FrameRecord {
            node_index: 0,
            id: SharedStr::from(id),
            name: SharedStr::from(id),
            depth,
            x,
            width,
            value: 1.0,
            self_value: 1.0,
        }
    }

    const FRAME_HEIGHT: f64 = 21.0;

    #[test]
    fn drag_then_release_suppresses_click_scenario_4() {
        let camera = Camera::new(1000.0, 600.0);
        let mut interaction = Interaction::new(None);
        interaction.pointer_down(100.0, 50.0);
        interaction.pointer_move(107.0, 52.0, &camera, FRAME_HEIGHT, &[]);
        assert!(interaction.has_dragged());
        interaction.pointer_move(200.0, 50.0, &camera, FRAME_HEIGHT, &[]);
        interaction.pointer_up();

        let mut camera = camera;
        let result = interaction.click(200.0, 50.0, &mut camera, FRAME_HEIGHT, &[]);
        assert!(result.is_none());
    }

    #[test]
    fn click_on_new_frame_selects_and_zooms() {
        let mut camera = Camera::new(1000.0, 600.0);
        let mut interaction = Interaction::new(None);
        // Frame spans normalized x [0, 1), i.e. screen pixels [0, 1000)
        // at depth 0 (screen rows [0, FRAME_HEIGHT)).
        let frames = vec![frame("root/A", 0, 0.0, 1.0)];
        interaction.pointer_down(500.0, 10.0);
        let selected = interaction.click(500.0, 10.0, &mut camera, FRAME_HEIGHT, &frames);
        assert_eq!(selected.as_deref(), Some("root/A"));
        assert_eq!(interaction.selected_id.as_deref(), Some("root/A"));
    }

    #[test]
    fn click_on_selected_node_deselects() {
        let mut camera = Camera::new(1000.0, 600.0);
        let mut interaction = Interaction::new(Some(SharedStr::from("root/A")));
        let frames = vec![frame("root/A", 0, 0.0, 1.0)];
        interaction.pointer_down(500.0, 10.0);
        let selected = interaction.click(500.0, 10.0, &mut camera, FRAME_HEIGHT, &frames);
        assert!(selected.is_none());
        assert!(interaction.selected_id.is_none());
    }

    #[test]
    fn select_or_toggle_selects_then_deselects_same_id() {
        let mut camera = Camera::new(1000.0, 600.0);
        let mut interaction = Interaction::new(None);
        let frames = vec![frame("root/A", 0, 0.0, 1.0)];

        let selected = interaction.select_or_toggle(Some(SharedStr::from("root/A")), &frames, &mut camera);
        assert_eq!(selected.as_deref(), Some("root/A"));
        assert_eq!(interaction.selected_id.as_deref(), Some("root/A"));

        let reselected = interaction.select_or_toggle(Some(SharedStr::from("root/A")), &frames, &mut camera);
        assert!(reselected.is_none());
        assert!(interaction.selected_id.is_none());
    }

    #[test]
    fn wheel_zoom_updates_camera_scale() {
        let mut camera = Camera::new(1000.0, 600.0);
        let mut interaction = Interaction::new(None);
        interaction.wheel(100.0, 250.0, 0.0, 0.05, false, &mut camera);
        assert!((camera.screen_to_clip_matrix()[0][0] as f64 - (2.0 / 1000.0)).abs() < 1e-9);
    }

    #[test]
    fn hit_test_picks_deepest_overlapping_frame_i3() {
        let camera = Camera::new(1000.0, 600.0);
        // root spans the whole row at depth 0; a child occupies the same
        // x-range one row down. A point inside both must resolve to the
        // deeper (child) frame.
        let frames = vec![
            frame("root", 0, 0.0, 1.0),
            frame("root/A", 1, 0.0, 1.0),
        ];
        let hit = hit_test(500.0, FRAME_HEIGHT + 1.0, &camera, FRAME_HEIGHT, &frames);
        assert_eq!(hit.map(|f| f.id.as_ref()), Some("root/A"));
    }

    #[test]
    fn hit_test_respects_viewport_scale_not_just_raw_pixels() {
        // A frame covering normalized x [0.5, 1.0) in a 1000px viewport
        // occupies screen pixels [500, 1000) at scale 1 — a click at
        // pixel 600 must land inside it, not miss because wx wasn't
        // divided by the viewport width.
        let camera = Camera::new(1000.0, 600.0);
        let frames = vec![frame("root/B", 0, 0.5, 0.5)];
        let hit = hit_test(600.0, 10.0, &camera, FRAME_HEIGHT, &frames);
        assert_eq!(hit.map(|f| f.id.as_ref()), Some("root/B"));
    }
}
