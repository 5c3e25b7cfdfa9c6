//! Terminal entry point: decodes a pprof profile and hands the built
//! tree off to the ratatui renderer. No GPU dependency — a cheap
//! demonstration harness for `flamepprof-core` alone.

mod renderer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use flamepprof_core::{build_tree, classify, default_app_only_filter, decode_profile, FilterPredicate};

/// Terminal flame graph viewer for pprof profiles.
#[derive(Parser, Debug)]
#[command(name = "flamepprof-tui", about = "Terminal flame graph viewer for pprof profiles")]
struct Args {
    /// Path to a pprof-encoded profile (raw protobuf `Profile` message).
    profile_path: PathBuf,

    /// Collapse frames under Cargo registry / rustc paths into their parent.
    #[arg(long)]
    app_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let bytes = std::fs::read(&args.profile_path)
        .with_context(|| format!("reading {}", args.profile_path.display()))?;
    let profile = decode_profile(&bytes).context("decoding pprof profile")?;
    let metadata = classify(&profile);
    let filter: Option<&FilterPredicate> = args.app_only.then_some(&default_app_only_filter);
    let tree = build_tree(&profile, &metadata, filter);

    renderer::run(&tree, metadata.kind)
}
