//! Types for the tracker rewriter.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::torrent_client::TorrentClientError;

/// Process exit code for a completed run, including one that changed nothing.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code for an authentication or torrent-list failure.
pub const EXIT_RUN_ERROR: i32 = 1;
/// Process exit code for missing settings or an invalid pattern.
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Errors that abort a whole run.
///
/// Failures for a single torrent or tracker are not errors here; they are
/// logged and counted in [`RunSummary`].
#[derive(Debug, Error)]
pub enum RunError {
    /// Missing settings or invalid pattern. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Login rejected or no session could be established.
    #[error("authentication error: {0}")]
    Authentication(#[source] TorrentClientError),

    /// The torrent list could not be fetched.
    #[error("failed to list torrents: {0}")]
    Fetch(#[source] TorrentClientError),
}

impl RunError {
    /// Exit code the process should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Configuration(_) => EXIT_CONFIG_ERROR,
            RunError::Authentication(_) | RunError::Fetch(_) => EXIT_RUN_ERROR,
        }
    }
}

/// One tracker URL that was (or in preview mode, would be) rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerChange {
    pub hash: String,
    pub torrent_name: String,
    pub from: String,
    pub to: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Whether edits were only reported.
    pub preview: bool,
    /// Torrents considered after filtering.
    pub torrents: usize,
    /// Eligible (http/https) tracker URLs the rule was applied to.
    pub checked: usize,
    /// URLs rewritten, or that would be rewritten in preview mode.
    pub changed: usize,
    /// Non-HTTP tracker entries that were ignored.
    pub skipped: usize,
    /// Torrents whose tracker list could not be fetched.
    pub failed_torrents: usize,
    /// Edits rejected by the server.
    pub failed_edits: usize,
    pub changes: Vec<TrackerChange>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(preview: bool) -> Self {
        Self {
            preview,
            torrents: 0,
            checked: 0,
            changed: 0,
            skipped: 0,
            failed_torrents: 0,
            failed_edits: 0,
            changes: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Whether any per-torrent or per-tracker step failed.
    pub fn has_failures(&self) -> bool {
        self.failed_torrents > 0 || self.failed_edits > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.preview {
            "Would change"
        } else {
            "Changed"
        };
        write!(
            f,
            "Checked {} tracker URLs. {} {}.",
            self.checked, verb, self.changed
        )
    }
}
