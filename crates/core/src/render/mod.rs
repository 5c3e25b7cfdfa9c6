//! Components F/G: GPU-agnostic render-data builders.
//!
//! Produces plain, vertex-ready structs (`FrameQuad`, `GlyphQuad`) with
//! no GPU types — `crates/gpu` is the thin backend that uploads these to
//! a wgpu pipeline.

pub mod frame;
pub mod text;

pub use frame::{build_frame_quads, FrameQuad};
pub use text::{build_glyph_quads, GlyphAtlas, GlyphQuad};
