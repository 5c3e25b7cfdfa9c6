//! Error taxonomy (spec §7).
//!
//! Only decode errors are fatal and propagate as `Result`. Everything
//! past decoding recovers locally: `build_tree` never fails (an empty
//! profile yields a zero-value root), and unresolved location/function
//! ids produce synthetic names instead of erroring. Color-parsing
//! fallback (and its logging) is `flamepprof-protocol::Config`'s concern,
//! not this crate's — `core` has no logging dependency of its own.

pub use crate::decode::DecodeError;
