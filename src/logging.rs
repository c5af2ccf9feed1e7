use anyhow::Context;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{filter::{EnvFilter, LevelFilter}, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Where log records go for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    /// Truncated on open; the terminal UI stays clean.
    File(&'a Path),
    /// Stderr, for commands that print and exit.
    Stderr,
    /// Nothing installed; the UI owns the screen.
    Off,
}

impl<'a> LogTarget<'a> {
    pub fn for_run(log_file: Option<&'a Path>, listing: bool) -> Self {
        match (log_file, listing) {
            (Some(path), _) => Self::File(path),
            (None, true) => Self::Stderr,
            (None, false) => Self::Off,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`.
pub fn init(target: LogTarget<'_>) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let stderr_layer = matches!(target, LogTarget::Stderr).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter.clone())
    });

    let file_layer = match target {
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(filter),
            )
        }
        _ => None,
    };

    if stderr_layer.is_none() && file_layer.is_none() {
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging initialized");
    Ok(())
}
