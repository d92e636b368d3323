//! services/api/src/telemetry.rs
//!
//! Installs the global `tracing` subscriber: human-readable output on stdout,
//! plus JSON `request.log` and `error.log` sinks when `LOG_DIR` is set.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::Config;
use crate::error::ApiError;
use crate::web::middleware::REQUEST_LOG_TARGET;

pub const REQUEST_LOG_FILE: &str = "request.log";
pub const ERROR_LOG_FILE: &str = "error.log";

/// Open log files. Flushed to disk on shutdown.
#[derive(Clone, Debug, Default)]
pub struct LogSinks {
    requests: Option<Arc<File>>,
    errors: Option<Arc<File>>,
}

fn open_append(path: &Path) -> io::Result<Arc<File>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Arc::new)
}

impl LogSinks {
    /// Opens (or creates) both log files under `dir`.
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            requests: Some(open_append(&dir.join(REQUEST_LOG_FILE))?),
            errors: Some(open_append(&dir.join(ERROR_LOG_FILE))?),
        })
    }

    pub fn flush(&self) -> io::Result<()> {
        for file in self.requests.iter().chain(self.errors.iter()) {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// Sets up logging for the process. Must be called once, before anything logs.
pub fn init(config: &Config) -> Result<LogSinks, ApiError> {
    let sinks = match &config.log_dir {
        Some(dir) => LogSinks::open(dir)?,
        None => LogSinks::default(),
    };

    let stdout_layer = fmt::layer().with_filter(EnvFilter::new(config.log_level.to_string()));

    let request_layer = sinks.requests.clone().map(|file| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(file)
            .with_filter(filter_fn(|meta| meta.target() == REQUEST_LOG_TARGET))
    });

    let error_layer = sinks.errors.clone().map(|file| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(file)
            .with_filter(LevelFilter::ERROR)
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(request_layer)
        .with(error_layer)
        .try_init()
        .map_err(|e| ApiError::Internal(format!("Failed to install tracing subscriber: {e}")))?;

    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinks_are_created_under_the_log_dir() {
        let dir = std::env::temp_dir().join(format!("mesto-logs-{}", std::process::id()));
        let sinks = LogSinks::open(&dir).unwrap();

        assert!(sinks.requests.is_some() && sinks.errors.is_some());
        assert!(dir.join(REQUEST_LOG_FILE).exists());
        assert!(dir.join(ERROR_LOG_FILE).exists());
        sinks.flush().unwrap();

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn no_log_dir_means_nothing_to_flush() {
        let sinks = LogSinks::default();
        assert!(sinks.requests.is_none() && sinks.errors.is_none());
        sinks.flush().unwrap();
    }
}
