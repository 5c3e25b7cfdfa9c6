//! Windowed flame graph viewer binary: wires CLI args, config loading,
//! and tracing init, then hands off to the winit `ApplicationHandler`.

mod app;
mod cli;
mod font;

use clap::Parser;
use flamepprof_protocol::Config;
use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = cli::Args::parse();

    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Config::from_toml_str(&text)
        }
        None => Config::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = app::App::new(config, args.profile_path, args.font);
    event_loop.run_app(&mut app)?;
    Ok(())
}
