//! Ratatui backend: maps `flamepprof-core`'s render-data builders onto
//! terminal cells instead of GPU primitives. Each cell is one column of
//! horizontal space and one row per stack depth (`frame_height = 1.0`),
//! so the same `Camera`/`build_frame_quads` pipeline `crates/gpu` uses
//! drives this renderer too — only the final rasterization differs.

use std::io::stdout;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use flamepprof_core::camera::Camera;
use flamepprof_core::render::frame::{build_frame_quads, FrameRenderInputs};
use flamepprof_core::tree::layout::{generate_frames, graph_height};
use flamepprof_core::{CallTree, ProfileKind, SizeUnit, TimeUnit};
use flamepprof_protocol::Color;
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect as TermRect,
    style::{Color as TermColor, Style},
    widgets::{Block, Borders},
    Terminal,
};

const PRIMARY: Color = Color::rgb(0.902, 0.333, 0.227);
const SECONDARY: Color = Color::rgb(0.957, 0.773, 0.259);
const FRAME_HEIGHT: f64 = 1.0;

fn to_term_color(c: Color) -> TermColor {
    TermColor::Rgb((c.r * 255.0) as u8, (c.g * 255.0) as u8, (c.b * 255.0) as u8)
}

fn kind_label(kind: ProfileKind) -> String {
    match kind {
        ProfileKind::Cpu(unit) => format!("cpu ({})", time_unit_label(unit)),
        ProfileKind::Heap(unit) => format!("heap ({})", size_unit_label(unit)),
        ProfileKind::Unknown => "unknown".to_string(),
    }
}

fn time_unit_label(unit: TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Ns => "ns",
        TimeUnit::Us => "µs",
        TimeUnit::Ms => "ms",
        TimeUnit::S => "s",
    }
}

fn size_unit_label(unit: SizeUnit) -> &'static str {
    match unit {
        SizeUnit::B => "B",
        SizeUnit::Kb => "KB",
        SizeUnit::Mb => "MB",
        SizeUnit::Gb => "GB",
    }
}

/// Runs the terminal event loop: scroll with arrow keys, zoom with
/// `+`/`-`, quit with `q`/Esc. No pointer support in a terminal, so there
/// is no selection/click path here — this is a read-only viewer.
pub fn run(tree: &CallTree, kind: ProfileKind) -> Result<()> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;

    let frames = generate_frames(tree);
    let content_height = graph_height(tree, FRAME_HEIGHT);

    let size = terminal.size()?;
    let mut camera = Camera::new(f64::from(size.width), f64::from(size.height).max(1.0) - 1.0);
    camera.set_content_bounds(content_height, true);

    let result = event_loop(&mut terminal, tree, &frames, &mut camera, kind);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    tree: &CallTree,
    frames: &[flamepprof_core::tree::layout::FrameRecord],
    camera: &mut Camera,
    kind: ProfileKind,
) -> Result<()> {
    loop {
        let term_size = terminal.size()?;
        camera.set_viewport(f64::from(term_size.width), f64::from(term_size.height.saturating_sub(1)));

        terminal.draw(|frame| draw(frame, tree, frames, camera, kind))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Left => camera.pan(20.0, 0.0),
                    KeyCode::Right => camera.pan(-20.0, 0.0),
                    KeyCode::Up => camera.pan(0.0, 1.0),
                    KeyCode::Down => camera.pan(0.0, -1.0),
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        let w = f64::from(terminal.size()?.width);
                        camera.zoom_at(1.3, w / 2.0, 0.0);
                    }
                    KeyCode::Char('-') => {
                        let w = f64::from(terminal.size()?.width);
                        camera.zoom_at(1.0 / 1.3, w / 2.0, 0.0);
                    }
                    KeyCode::Char('0') => camera.reset_zoom(),
                    _ => {}
                }
            }
        }
        // Settle any in-flight zoom/pan animation before the next poll.
        for _ in 0..8 {
            if !camera.update() {
                break;
            }
        }
    }
}

fn draw(
    frame: &mut ratatui::Frame<'_>,
    tree: &CallTree,
    frames: &[flamepprof_core::tree::layout::FrameRecord],
    camera: &Camera,
    kind: ProfileKind,
) {
    let area = frame.area();

    let header_area = TermRect::new(0, 0, area.width, 1);
    let header = Block::default()
        .title(format!(
            " flamepprof — {} profile, {} frames | arrows pan | +/- zoom | 0 reset | q quit ",
            kind_label(kind),
            tree.nodes.len(),
        ))
        .style(Style::default().bg(TermColor::DarkGray).fg(TermColor::White));
    frame.render_widget(header, header_area);

    let content_area = TermRect::new(0, 1, area.width, area.height.saturating_sub(1));
    frame.render_widget(Block::default().borders(Borders::NONE).style(Style::default().bg(TermColor::Black)), content_area);

    let inputs = FrameRenderInputs {
        frames,
        viewport_width: f64::from(content_area.width),
        viewport_height: f64::from(content_area.height),
        frame_height: FRAME_HEIGHT,
        primary: PRIMARY,
        secondary: SECONDARY,
        selected_id: None,
        hovered_id: None,
        selected_opacity: 1.0,
        hover_opacity: 0.9,
        unselected_opacity: 0.75,
    };
    let quads = build_frame_quads(camera, &inputs);

    let buf = frame.buffer_mut();
    for quad in &quads {
        let col = quad.rect.x.round();
        let row = quad.rect.y.round();
        let width = quad.rect.w.round().max(1.0) as u16;
        if row < 0.0 || col >= f64::from(content_area.width) {
            continue;
        }
        let row = row as u16;
        let col = col.max(0.0) as u16;
        if row >= content_area.height {
            continue;
        }

        let node = &tree.nodes[quad.node_index];
        let fg = to_term_color(quad.color);
        let label = node.name.as_ref();
        let clamped_width = width.min(content_area.width.saturating_sub(col));
        let display: String = if (clamped_width as usize) >= label.len() + 2 {
            format!(" {label:<w$}", w = (clamped_width as usize).saturating_sub(1))
        } else {
            "█".repeat(clamped_width as usize)
        };

        for (i, ch) in display.chars().take(clamped_width as usize).enumerate() {
            let x = content_area.x + col + i as u16;
            let y = content_area.y + row;
            if x < content_area.x + content_area.width && y < content_area.y + content_area.height {
                buf[(x, y)].set_char(ch).set_fg(fg).set_bg(TermColor::Black);
            }
        }
    }
}
