//! Console and per-day file logging.
//!
//! Every event goes to stderr and to `briefing_YYYY-MM-DD.log` in the log
//! directory. The file switches when the local date changes.

use crate::error::{BriefError, Result};
use chrono::{Local, NaiveDate};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Append-only log file named after the current local date.
pub struct DailyLogFile {
    dir: PathBuf,
    current: Option<(NaiveDate, File)>,
}

impl DailyLogFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    /// Path of the log file for `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("briefing_{}.log", date.format("%Y-%m-%d")))
    }

    /// Write `buf` to the file for `date`, opening it if needed.
    pub fn write_on(&mut self, date: NaiveDate, buf: &[u8]) -> io::Result<usize> {
        self.file_for(date)?.write(buf)
    }

    fn file_for(&mut self, date: NaiveDate) -> io::Result<&mut File> {
        let stale = !matches!(&self.current, Some((d, _)) if *d == date);
        if stale {
            std::fs::create_dir_all(&self.dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path_for(date))?;
            self.current = Some((date, file));
        }

        match &mut self.current {
            Some((_, file)) => Ok(file),
            None => Err(io::Error::other("log file not open")),
        }
    }
}

impl Write for DailyLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_on(Local::now().date_naive(), buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.current {
            Some((_, file)) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Map a `-v` count onto a level, falling back to the configured one.
pub fn level_for(verbosity: u8, configured: &str) -> String {
    match verbosity {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the level.
pub fn init(log_dir: &Path, level: &str) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("brief_agent={level},brief={level}"));

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(DailyLogFile::new(log_dir))),
        )
        .try_init()
        .map_err(|e| BriefError::Config(format!("Failed to initialize logging: {}", e)))
}
