use std::path::PathBuf;

use clap::Parser;

/// Windowed flame graph viewer for pprof profiles.
#[derive(Parser, Debug)]
#[command(name = "flamepprof", version, about = "Interactive flame graph viewer for pprof profiles")]
pub struct Args {
    /// Path to a pprof-encoded profile (raw protobuf `Profile` message).
    pub profile_path: PathBuf,

    /// Optional TOML config path (overrides built-in defaults).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Optional monospace font path; falls back to a short list of common
    /// system font locations, then to frame-only rendering with no labels.
    #[arg(long = "font")]
    pub font: Option<PathBuf>,
}
