//! Winit `ApplicationHandler`: owns the window, the GPU renderer, and the
//! camera/interaction/tree state that `crates/core` provides pure
//! transformations over.

use std::sync::Arc;

use ab_glyph::FontArc;
use flamepprof_core::render::{
    build_frame_quads, build_glyph_quads, FrameQuad, FrameRenderInputs, TextRenderInputs,
};
use flamepprof_core::tree::layout::{generate_frames, graph_height, FrameRecord};
use flamepprof_core::{
    build_tree, classify, decode_profile, default_app_only_filter, hottest_index, CallTree, Camera,
    HottestCursor, HottestEntry, Interaction, InteractionState,
};
use flamepprof_gpu::GpuRenderer;
use flamepprof_protocol::{Config, SharedStr};
use tracing::{debug, error, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

struct Loaded {
    window: Arc<Window>,
    renderer: GpuRenderer,
    camera: Camera,
    interaction: Interaction,
    tree: CallTree,
    frames: Vec<FrameRecord>,
    hottest: Vec<HottestEntry>,
    hottest_cursor: HottestCursor,
    font: Option<FontArc>,
    cursor: (f64, f64),
}

pub struct App {
    config: Config,
    profile_path: std::path::PathBuf,
    font_path: Option<std::path::PathBuf>,
    loaded: Option<Loaded>,
}

impl App {
    pub fn new(config: Config, profile_path: std::path::PathBuf, font_path: Option<std::path::PathBuf>) -> Self {
        Self {
            config,
            profile_path,
            font_path,
            loaded: None,
        }
    }

    fn build_tree_from_profile(&self) -> Option<CallTree> {
        let bytes = match std::fs::read(&self.profile_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(path = %self.profile_path.display(), error = %err, "failed to read profile");
                return None;
            }
        };
        let profile = match decode_profile(&bytes) {
            Ok(profile) => profile,
            Err(err) => {
                error!(error = %err, "failed to decode profile");
                return None;
            }
        };
        let metadata = classify(&profile);
        let filter: Option<&flamepprof_core::FilterPredicate> =
            self.config.show_app_code_only.then_some(&default_app_only_filter);
        Some(build_tree(&profile, &metadata, filter))
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.loaded.is_some() {
            return;
        }

        let Some(tree) = self.build_tree_from_profile() else {
            event_loop.exit();
            return;
        };
        let frames = generate_frames(&tree);
        let hottest = hottest_index(&tree);

        let window_attributes = Window::default_attributes().with_title("flamepprof");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                error!(error = %err, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        let mut renderer = match pollster::block_on(GpuRenderer::new(window.clone())) {
            Ok(renderer) => renderer,
            Err(err) => {
                error!(error = %err, "failed to initialize GPU renderer");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let dpr = window.scale_factor();
        let mut camera = Camera::new(size.width as f64, size.height as f64);
        camera.set_content_bounds(graph_height(&tree, self.config.frame_height()), false);

        let font = crate::font::load_monospace_font(self.font_path.as_deref());
        if let Some(font) = &font {
            renderer.rebuild_glyph_atlas(font, &self.config.font_family, self.config.text(), self.config.font_size, dpr);
        } else {
            warn!("no monospace font found; frames will render without labels");
        }

        let initial_root_child: Option<SharedStr> = tree.root().children.first().map(|&idx| tree.nodes[idx].id.clone());
        let interaction = Interaction::new(initial_root_child);

        self.loaded = Some(Loaded {
            window,
            renderer,
            camera,
            interaction,
            tree,
            frames,
            hottest,
            hottest_cursor: HottestCursor::new(),
            font,
            cursor: (0.0, 0.0),
        });
        self.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                loaded.renderer.resize(size.width, size.height);
                loaded.camera.set_viewport(size.width as f64, size.height as f64);
                loaded.camera.set_content_bounds(graph_height(&loaded.tree, self.config.frame_height()), false);
                loaded.window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                loaded.cursor = (position.x, position.y);
                let frame_height = self.config.frame_height();
                loaded.interaction.pointer_move(position.x, position.y, &loaded.camera, frame_height, &loaded.frames);
                loaded.window.request_redraw();
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                match state {
                    ElementState::Pressed => loaded.interaction.pointer_down(loaded.cursor.0, loaded.cursor.1),
                    ElementState::Released => {
                        loaded.interaction.pointer_up();
                        let frame_height = self.config.frame_height();
                        let size = loaded.window.inner_size();
                        let strip_top = size.height as f64 - frame_height;
                        // The hottest-frames strip occupies a fixed band at
                        // the bottom of the window (drawn in `redraw`); a
                        // release landing there hit-tests by cumulative
                        // width instead of the flame graph's screen hit test.
                        if loaded.cursor.1 >= strip_top && !loaded.hottest.is_empty() {
                            if !loaded.interaction.consume_drag() {
                                let u = (loaded.cursor.0 / size.width as f64).clamp(0.0, 1.0);
                                let hit = loaded.hottest_cursor.select_at_width(&loaded.hottest, u);
                                loaded.interaction.select_or_toggle(hit, &loaded.frames, &mut loaded.camera);
                            }
                        } else {
                            loaded.interaction.click(loaded.cursor.0, loaded.cursor.1, &mut loaded.camera, frame_height, &loaded.frames);
                        }
                    }
                }
                loaded.window.request_redraw();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y as f64 * 20.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y,
                };
                if self.config.zoom_on_scroll {
                    let speed = self.config.scroll_zoom_speed;
                    let inverted = self.config.scroll_zoom_inverted;
                    loaded.interaction.wheel(dy, loaded.cursor.0, loaded.cursor.1, speed, inverted, &mut loaded.camera);
                }
                loaded.window.request_redraw();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                match event.logical_key {
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    // Basic keyboard navigation of the hottest-frames list
                    // (spec's Non-goals exclude anything beyond this): each
                    // step reuses set_selected_frame so the primary
                    // selection and camera stay in sync with the cursor.
                    Key::Named(NamedKey::ArrowDown) => {
                        let next = loaded.hottest_cursor.next(&loaded.hottest);
                        loaded.interaction.set_selected_frame(next, &loaded.frames, &mut loaded.camera);
                        loaded.window.request_redraw();
                    }
                    Key::Named(NamedKey::ArrowUp) => {
                        let prev = loaded.hottest_cursor.prev(&loaded.hottest);
                        loaded.interaction.set_selected_frame(prev, &loaded.frames, &mut loaded.camera);
                        loaded.window.request_redraw();
                    }
                    Key::Named(NamedKey::Home) => {
                        let first = loaded.hottest_cursor.first(&loaded.hottest);
                        loaded.interaction.set_selected_frame(first, &loaded.frames, &mut loaded.camera);
                        loaded.window.request_redraw();
                    }
                    Key::Named(NamedKey::End) => {
                        let last = loaded.hottest_cursor.last(&loaded.hottest);
                        loaded.interaction.set_selected_frame(last, &loaded.frames, &mut loaded.camera);
                        loaded.window.request_redraw();
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        let settled = loaded.interaction.update(&mut loaded.camera);
        if settled {
            emit_animation_complete(&loaded.interaction);
        }
        if settled || !loaded.camera.at_target() {
            loaded.window.request_redraw();
        }
        // Per the interaction machine's contract, a click/wheel that
        // resolved instantly (no interpolation needed) only delivers its
        // completion on a later turn, never synchronously inside the
        // click/wheel call — this is that later turn.
        if loaded.interaction.take_pending_completion() {
            emit_animation_complete(&loaded.interaction);
        }
    }
}

/// Delivers the `on_animation_complete` signal spec.md §4.8/§5 documents
/// as a real observable event ("selection committed"). No external
/// subscriber exists yet, so a structured log line is the host's
/// observable surface for it.
fn emit_animation_complete(interaction: &Interaction) {
    let frame_id = match interaction.state() {
        InteractionState::At(id) | InteractionState::Animating(id) => id.clone(),
    };
    debug!(frame_id = ?frame_id, "on_animation_complete");
}

/// Builds the hottest-frames strip: a fixed `frame_height`-tall band
/// pinned to the bottom of the window, independent of the flame graph's
/// own pan/zoom. Reuses `build_frame_quads` with an identity camera (a
/// strip entry's `x`/`width` are already normalized `[0, 1]` screen
/// fractions) and synthesizes one `FrameRecord` per [`HottestEntry`] at
/// depth 0, then shifts the resulting rects down into the band.
fn strip_quads(loaded: &Loaded, config: &Config, viewport_width: f64, viewport_height: f64, frame_height: f64) -> Vec<FrameQuad> {
    if loaded.hottest.is_empty() {
        return Vec::new();
    }
    let strip_top = viewport_height - frame_height;
    let strip_frames: Vec<FrameRecord> = loaded
        .hottest
        .iter()
        .map(|entry| FrameRecord {
            node_index: entry.node_index,
            id: entry.id.clone(),
            name: entry.name.clone(),
            depth: 0,
            x: entry.x,
            width: entry.width,
            value: entry.self_value,
            self_value: entry.self_value,
        })
        .collect();
    let identity_camera = Camera::new(viewport_width, frame_height);
    let inputs = FrameRenderInputs {
        frames: &strip_frames,
        viewport_width,
        viewport_height: frame_height,
        frame_height,
        primary: config.primary(),
        secondary: config.secondary(),
        selected_id: loaded.interaction.selected_id.as_deref(),
        hovered_id: None,
        selected_opacity: config.selected_opacity,
        hover_opacity: config.hover_opacity,
        unselected_opacity: config.unselected_opacity,
    };
    let mut quads = build_frame_quads(&identity_camera, &inputs);
    for quad in &mut quads {
        quad.rect.y += strip_top;
    }
    quads
}

impl App {
    fn request_redraw(&self) {
        if let Some(loaded) = &self.loaded {
            loaded.window.request_redraw();
        }
    }

    fn redraw(&mut self) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        let size = loaded.window.inner_size();
        let frame_height = self.config.frame_height();

        let frame_inputs = FrameRenderInputs {
            frames: &loaded.frames,
            viewport_width: size.width as f64,
            viewport_height: size.height as f64,
            frame_height,
            primary: self.config.primary(),
            secondary: self.config.secondary(),
            selected_id: loaded.interaction.selected_id.as_deref(),
            hovered_id: loaded.interaction.hovered_id.as_deref(),
            selected_opacity: self.config.selected_opacity,
            hover_opacity: self.config.hover_opacity,
            unselected_opacity: self.config.unselected_opacity,
        };
        let mut frame_quads = build_frame_quads(&loaded.camera, &frame_inputs);
        frame_quads.extend(strip_quads(loaded, &self.config, size.width as f64, size.height as f64, frame_height));

        let glyph_quads = match &loaded.font {
            Some(_) => {
                let atlas = match loaded.renderer.glyph_atlas.as_ref() {
                    Some(atlas) => atlas,
                    None => return,
                };
                let by_node_index: std::collections::HashMap<usize, &FrameRecord> =
                    loaded.frames.iter().map(|f| (f.node_index, f)).collect();
                let mut quads = Vec::new();
                for quad in &frame_quads {
                    let Some(&frame) = by_node_index.get(&quad.node_index) else {
                        continue;
                    };
                    let inputs = TextRenderInputs {
                        atlas,
                        label: frame.name.as_ref(),
                        node_index: quad.node_index,
                        sx1: quad.rect.x,
                        sx2: quad.rect.right(),
                        sy: quad.rect.y,
                        frame_height,
                        font_size: self.config.font_size,
                        frame_padding: self.config.frame_padding,
                        shadow_opacity: self.config.shadow_opacity,
                        frame_opacity: quad.opacity,
                    };
                    quads.extend(build_glyph_quads(&inputs));
                }
                quads
            }
            None => Vec::new(),
        };

        if let Err(err) = loaded.renderer.render(&loaded.camera, &frame_quads, &glyph_quads, self.config.background()) {
            warn!(error = %err, "render error");
        }
    }
}
