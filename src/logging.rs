//! Log setup. The terminal belongs to the TUI, so log lines go to `--log-file` or nowhere.

use anyhow::{Context, Result};
use env_logger::{Env, Target};
use std::fs::OpenOptions;
use std::path::Path;

/// Send `log` output to `path`, filtered by `RUST_LOG` (default `info`).
pub fn init(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .context("logger already initialised")?;
    log::info!("fruitcrushtui {} logging to {}", env!("CARGO_PKG_VERSION"), path.display());
    Ok(())
}
