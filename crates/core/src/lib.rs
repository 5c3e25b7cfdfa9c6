//! Profile decoding, call-tree aggregation, camera/interaction, and
//! render-data builders for flamepprof.
//!
//! Keeps `core` GPU-agnostic: `render::frame`/`render::text` produce
//! plain vertex-ready structs, and the single-threaded, cooperative
//! interaction machine assumes exclusive access to camera state (no
//! locks, no runtime) — the host (`crates/app`) owns the frame loop and
//! any async scheduling.

pub mod camera;
pub mod classify;
pub mod decode;
pub mod error;
pub mod hottest;
pub mod interaction;
pub mod render;
pub mod tree;

pub use camera::Camera;
pub use classify::{classify, ProfileKind, ProfileMetadata, SizeUnit, TimeUnit};
pub use decode::{decode_profile, DecodeError, Profile};
pub use hottest::{hottest_index, HottestCursor, HottestEntry};
pub use interaction::{Interaction, InteractionState};
pub use tree::{build_tree, default_app_only_filter, CallTree, FilterPredicate, FlameNode};
