use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use volnotd::config::Config;
use volnotd::{osd, pulse};

#[derive(Parser, Debug)]
#[command(name = "volnotd")]
#[command(about = "On-screen volume display for the default PulseAudio sink", long_about = None)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("no usable config, running with defaults: {e}");
            Config::default()
        }),
    };

    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let shutdown = Arc::new(AtomicBool::new(false));

    // The monitor owns the blocking PulseAudio mainloop on its own thread;
    // the GUI keeps the main thread. The queue is the only thing they share.
    pulse::monitor::spawn(config.pulse.clone(), updates_tx, Arc::clone(&shutdown));

    info!(windows = config.osd.positions.len(), "starting overlay");
    osd::install(config, updates_rx, shutdown);
    osd::run().map_err(|e| anyhow::anyhow!("overlay event loop failed: {e}"))?;

    Ok(())
}
