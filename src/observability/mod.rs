//! Observability.
//!
//! Installs the process-wide `tracing` subscriber. The engine itself only
//! emits events; it never logs matched values.

mod logging;

pub use logging::{LOG_FILTER_ENV, LOG_FORMAT_ENV, LogFormat, LoggingConfig};

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Initializes logging from config settings with env overrides.
///
/// # Errors
///
/// Returns an error if logging has already been initialized, the filter
/// directive is invalid, or the log file cannot be opened.
pub fn init_from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Result<()> {
    init(&LoggingConfig::from_settings(settings, verbose))
}

/// Initializes the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if logging has already been initialized, the filter
/// directive is invalid, or the log file cannot be opened.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if LOGGING_INIT.get().is_some() {
        return Err(failed("logging_init", "logging already initialized"));
    }

    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| failed("logging_init", format!("invalid filter '{}': {e}", config.filter)))?;

    match (&config.file, config.format) {
        (Some(log_file), LogFormat::Json) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(writer)
                        .with_current_span(true)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| failed("logging_init", e))?;
        },
        (Some(log_file), LogFormat::Pretty) => {
            let writer = open_log_file(log_file)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| failed("logging_init", e))?;
        },
        (None, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_current_span(true)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| failed("logging_init", e))?;
        },
        (None, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(io::stderr)
                        .with_target(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| failed("logging_init", e))?;
        },
    }

    LOGGING_INIT
        .set(())
        .map_err(|()| failed("logging_init", "failed to mark logging initialized"))
}

/// A writer shared by every event the fmt layer emits.
///
/// Each `make_writer` call hands out a clone; writes serialize on the mutex
/// so lines from different threads never interleave mid-record.
#[derive(Debug)]
pub(crate) struct SharedWriter<W> {
    inner: Arc<Mutex<W>>,
}

impl<W> SharedWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut W) -> io::Result<R>) -> io::Result<R> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| io::Error::other(e.to_string()))?;
        f(&mut guard)
    }
}

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_inner(|w| w.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_inner(Write::flush)
    }
}

impl<'a, W: Write> MakeWriter<'a> for SharedWriter<W> {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
impl SharedWriter<Vec<u8>> {
    /// Everything written so far, lossily decoded.
    pub(crate) fn contents(&self) -> String {
        self.with_inner(|buf| Ok(String::from_utf8_lossy(buf).into_owned()))
            .unwrap_or_default()
    }
}

/// Opens `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<SharedWriter<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| failed("create_log_dir", format!("{}: {e}", parent.display())))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(SharedWriter::new)
        .map_err(|e| failed("open_log_file", format!("{}: {e}", path.display())))
}

fn failed(operation: &str, cause: impl Display) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: cause.to_string(),
    }
}
