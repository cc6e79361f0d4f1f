//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes every record (including `log`
//! records from dependencies) to a daily log file and keeps the most recent
//! lines in a circular buffer for in-app diagnostics.

mod file;
mod ring;

use std::io;
use std::path::{Path, PathBuf};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use file::RollingFile;
pub use ring::RingBuffer;

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Directory that holds the log files
    pub dir: PathBuf,
    /// File name prefix, files are named `{prefix}.{YYYY-MM-DD}.log`
    pub file_prefix: String,
    /// Number of daily files to keep
    pub max_files: usize,
    /// Lines kept in memory
    pub buffer_lines: usize,
    pub level: LevelFilter,
}

impl LoggerConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_prefix: "app".to_string(),
            max_files: 7,
            buffer_lines: 500,
            level: LevelFilter::INFO,
        }
    }
}

/// Handle returned by [`init`], gives access to the in-memory buffer
#[derive(Clone, Debug)]
pub struct LoggerHandle {
    buffer: RingBuffer,
    dir: PathBuf,
}

impl LoggerHandle {
    /// Most recent log lines, oldest first
    pub fn recent(&self) -> Vec<String> {
        self.buffer.lines()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Install the global subscriber.
///
/// Fails if the log directory cannot be created or a global subscriber is
/// already set.
pub fn init(config: LoggerConfig) -> io::Result<LoggerHandle> {
    let file = RollingFile::open(&config.dir, &config.file_prefix, config.max_files)?;
    let buffer = RingBuffer::new(config.buffer_lines);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file);
    let ring_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(buffer.clone());

    tracing_subscriber::registry()
        .with(config.level)
        .with(file_layer)
        .with(ring_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    tracing::info!(dir = %config.dir.display(), "rolling logger initialized");

    Ok(LoggerHandle {
        buffer,
        dir: config.dir,
    })
}
