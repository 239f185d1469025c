//! Types for torrent client operations.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{mask_secret, FilterConfig};

/// Errors that can occur during torrent client operations.
#[derive(Debug, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Session rejected (HTTP {status}); not retrying")]
    SessionExpired { status: u16 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to edit tracker {orig_url} (HTTP {status}): {body}")]
    EditFailed {
        orig_url: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// An authenticated session.
///
/// Returned by [`TorrentClient::authenticate`] and passed to every later call.
/// The client never keeps the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    cookie_name: String,
    token: String,
}

impl Session {
    pub fn new(cookie_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            token: token.into(),
        }
    }

    /// Name of the cookie the server issued (usually `SID`).
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        format!("{}={}", self.cookie_name, self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookie_name", &self.cookie_name)
            .field("token", &mask_secret(&self.token))
            .finish()
    }
}

/// A torrent as reported by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Torrent {
    /// Info hash, as returned by the server.
    pub hash: String,
    pub name: String,
    /// Empty when uncategorized.
    pub category: String,
    pub tags: BTreeSet<String>,
    /// Lifecycle state string defined by the server (e.g. "stalledUP").
    pub state: String,
}

/// One tracker of a torrent. Only `url` matters for rewriting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerEntry {
    pub url: String,
    pub status: i64,
    /// Absent for DHT/PeX/LSD pseudo-entries on older servers.
    pub tier: Option<i64>,
    pub num_peers: i64,
    pub num_seeds: i64,
    pub num_leeches: i64,
    pub num_downloaded: i64,
    pub msg: String,
}

/// Filters for listing torrents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentFilters {
    /// Explicit hashes. One is sent to the server; several are filtered locally.
    #[serde(default)]
    pub hashes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Server-side state filter (e.g. "seeding", "paused").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl TorrentFilters {
    /// The hash to send to the server, only when exactly one was requested.
    pub fn server_hash(&self) -> Option<&str> {
        match self.hashes.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Query parameters for the torrent list endpoint, in a stable order.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if !self.tags.is_empty() {
            params.push(("tag", self.tags.join(",")));
        }
        if let Some(hash) = self.server_hash() {
            params.push(("hashes", hash.to_string()));
        }
        if let Some(state) = &self.state {
            params.push(("filter", state.clone()));
        }
        params
    }
}

impl From<&FilterConfig> for TorrentFilters {
    fn from(config: &FilterConfig) -> Self {
        Self {
            hashes: non_empty(&config.hashes),
            category: config.category.clone().filter(|c| !c.is_empty()),
            tags: non_empty(&config.tags),
            state: config.state.clone().filter(|s| !s.is_empty()),
        }
    }
}

fn non_empty(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trait for torrent client backends.
///
/// Calls are never retried and never re-authenticate: a rejected session is a
/// hard failure for the call that saw it.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Log in and return a session.
    ///
    /// If the server accepts the credentials but sets no recognizable cookie,
    /// `previous` is reused when given.
    async fn authenticate(&self, previous: Option<&Session>) -> Result<Session, TorrentClientError>;

    /// List torrents matching the server-side part of `filters`.
    ///
    /// Multiple hashes are not sent to the server; callers filter those.
    async fn list_torrents(
        &self,
        session: &Session,
        filters: &TorrentFilters,
    ) -> Result<Vec<Torrent>, TorrentClientError>;

    /// List the trackers of one torrent.
    async fn list_trackers(
        &self,
        session: &Session,
        hash: &str,
    ) -> Result<Vec<TrackerEntry>, TorrentClientError>;

    /// Replace `orig_url` with `new_url` on one torrent.
    async fn edit_tracker(
        &self,
        session: &Session,
        hash: &str,
        orig_url: &str,
        new_url: &str,
    ) -> Result<(), TorrentClientError>;
}
