//! Append-only activity log.
//!
//! Every notable step in event processing leaves one human-readable line in a
//! line-oriented log file, in addition to the structured `tracing` output.
//! Operators tail this file to audit deliveries (including rejected ones)
//! without correlating HTTP responses.
//!
//! # Format
//!
//! ```text
//! [20220220-T14:23:27] Event received (id: ..., type: ..., action: ...)
//! [20220220-T14:23:28] WARNING: Faulty signature in request header => 403
//! ```
//!
//! # Concurrency
//!
//! The file is opened in append mode and each call issues a single `write_all`
//! of one formatted line, so concurrent request handlers append without
//! interleaving corruption. There is no in-process lock.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

/// Timestamp format used for log line prefixes.
const TIMESTAMP_FORMAT: &str = "%Y%m%d-T%H:%M:%S";

/// Handle to the append-only activity log file.
///
/// Cheap to clone; clones append to the same file.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    /// Creates a handle for the log file at `path`.
    ///
    /// The file is created lazily on the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ActivityLog { path: path.into() }
    }

    /// Returns the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an informational line and mirrors it to `tracing` at info level.
    pub fn log(&self, message: &str) {
        info!("{message}");
        self.append(message);
    }

    /// Appends a warning line (prefixed with `WARNING: `) and mirrors it to
    /// `tracing` at warn level.
    pub fn warning(&self, message: &str) {
        warn!("{message}");
        self.append(&format!("WARNING: {message}"));
    }

    /// Performs the single atomic append of one formatted line.
    ///
    /// Append failures are reported via `tracing` only: the activity log is a
    /// secondary record and must never fail the request that produced it.
    fn append(&self, message: &str) {
        let line = format!("[{}] {}\n", Utc::now().format(TIMESTAMP_FORMAT), message);

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(err) = result {
            warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to append to activity log"
            );
        }
    }
}
