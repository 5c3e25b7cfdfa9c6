//! Locates a monospace font for the glyph atlas.
//!
//! `crates/gpu` only needs *a* `FontArc`; it has no opinion on which font
//! family is installed. Rather than bundling a font binary, this tries a
//! short list of common monospace paths across desktop platforms, then
//! falls back to the caller-supplied override.

use std::path::{Path, PathBuf};

use ab_glyph::FontArc;

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/Library/Fonts/Menlo.ttc",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// Loads `override_path` if given, otherwise the first existing candidate
/// from [`SYSTEM_FONT_CANDIDATES`]. Returns `None` (never an error) when
/// nothing is found — the caller renders frames with no text labels
/// rather than failing to start.
pub fn load_monospace_font(override_path: Option<&Path>) -> Option<FontArc> {
    let candidate = override_path
        .map(PathBuf::from)
        .or_else(|| SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists()));

    let path = candidate?;
    match std::fs::read(&path) {
        Ok(bytes) => match FontArc::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "font file failed to parse");
                None
            }
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "font file unreadable");
            None
        }
    }
}
