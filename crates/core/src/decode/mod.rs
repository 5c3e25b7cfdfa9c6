//! Component A: decodes a binary pprof profile into a typed [`model::Profile`].

mod model;
mod pprof;
mod wire;

pub use model::{Function, Line, Location, Profile, Sample, SampleType, StringTable};
pub use pprof::decode_profile;
pub use wire::DecodeError;
