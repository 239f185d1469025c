//! Mock torrent client for testing.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::torrent_client::{
    Session, Torrent, TorrentClient, TorrentClientError, TorrentFilters, TrackerEntry,
};

/// Token handed out by a successful mock login.
pub const MOCK_TOKEN: &str = "mock-session-token";

/// A call made against the mock, recorded for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Authenticate,
    ListTorrents(TorrentFilters),
    ListTrackers(String),
    EditTracker {
        hash: String,
        orig_url: String,
        new_url: String,
    },
}

/// A torrent and its trackers as held by the mock.
#[derive(Debug, Clone)]
struct MockTorrent {
    torrent: Torrent,
    trackers: Vec<TrackerEntry>,
}

/// Failures the mock should produce.
#[derive(Debug, Default)]
struct MockFailures {
    reject_login: bool,
    omit_cookie: bool,
    list_status: Option<u16>,
    tracker_hashes: HashSet<String>,
    edit_urls: HashSet<String>,
}

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Record every call for assertions
/// - Apply server-side filters the way qBittorrent does
/// - Persist tracker edits so later runs see them
/// - Simulate failures per call kind, per torrent or per tracker URL
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
/// client
///     .add_torrent(fixtures::torrent("aaa"), vec![fixtures::tracker("http://old/announce")])
///     .await;
///
/// client.fail_edit_for("http://old/announce").await;
///
/// let edits = client.edits().await;
/// assert!(edits.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    torrents: Arc<RwLock<Vec<MockTorrent>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    failures: Arc<RwLock<MockFailures>>,
}

impl MockTorrentClient {
    /// Create a new mock torrent client with no torrents.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a torrent with its trackers. List order is insertion order.
    pub async fn add_torrent(&self, torrent: Torrent, trackers: Vec<TrackerEntry>) {
        self.torrents
            .write()
            .await
            .push(MockTorrent { torrent, trackers });
    }

    /// Current tracker URLs of a torrent.
    pub async fn tracker_urls(&self, hash: &str) -> Vec<String> {
        self.torrents
            .read()
            .await
            .iter()
            .find(|t| t.torrent.hash == hash)
            .map(|t| t.trackers.iter().map(|tr| tr.url.clone()).collect())
            .unwrap_or_default()
    }

    /// All recorded calls, in order.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Hashes whose trackers were requested, in order.
    pub async fn tracker_requests(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedCall::ListTrackers(hash) => Some(hash.clone()),
                _ => None,
            })
            .collect()
    }

    /// Recorded edit calls as `(hash, orig_url, new_url)`.
    pub async fn edits(&self) -> Vec<(String, String, String)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedCall::EditTracker {
                    hash,
                    orig_url,
                    new_url,
                } => Some((hash.clone(), orig_url.clone(), new_url.clone())),
                _ => None,
            })
            .collect()
    }

    /// Clear recorded calls.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Reject the next logins with bad credentials.
    pub async fn reject_login(&self) {
        self.failures.write().await.reject_login = true;
    }

    /// Accept logins but set no session cookie.
    pub async fn omit_session_cookie(&self) {
        self.failures.write().await.omit_cookie = true;
    }

    /// Make the torrent list fail with the given HTTP status.
    pub async fn fail_list_with(&self, status: u16) {
        self.failures.write().await.list_status = Some(status);
    }

    /// Make tracker listing fail for one torrent.
    pub async fn fail_trackers_for(&self, hash: &str) {
        self.failures
            .write()
            .await
            .tracker_hashes
            .insert(hash.to_string());
    }

    /// Make edits of one tracker URL fail.
    pub async fn fail_edit_for(&self, orig_url: &str) {
        self.failures
            .write()
            .await
            .edit_urls
            .insert(orig_url.to_string());
    }

    async fn record(&self, call: RecordedCall) {
        self.calls.write().await.push(call);
    }

    fn check_session(session: &Session) -> Result<(), TorrentClientError> {
        if session.token() == MOCK_TOKEN {
            Ok(())
        } else {
            Err(TorrentClientError::SessionExpired { status: 403 })
        }
    }
}

/// Server-side filtering as qBittorrent applies it.
fn matches_server_filters(torrent: &Torrent, filters: &TorrentFilters) -> bool {
    if let Some(category) = &filters.category {
        if &torrent.category != category {
            return false;
        }
    }
    if !filters.tags.iter().all(|tag| torrent.tags.contains(tag)) {
        return false;
    }
    if let Some(hash) = filters.server_hash() {
        if !torrent.hash.eq_ignore_ascii_case(hash) {
            return false;
        }
    }
    if let Some(state) = &filters.state {
        if &torrent.state != state {
            return false;
        }
    }
    true
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn authenticate(
        &self,
        previous: Option<&Session>,
    ) -> Result<Session, TorrentClientError> {
        self.record(RecordedCall::Authenticate).await;

        let failures = self.failures.read().await;
        if failures.reject_login {
            return Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials (HTTP 200)".to_string(),
            ));
        }
        if failures.omit_cookie {
            return previous.cloned().ok_or_else(|| {
                TorrentClientError::AuthenticationFailed(
                    "No session cookie in login response".to_string(),
                )
            });
        }
        Ok(Session::new("SID", MOCK_TOKEN))
    }

    async fn list_torrents(
        &self,
        session: &Session,
        filters: &TorrentFilters,
    ) -> Result<Vec<Torrent>, TorrentClientError> {
        self.record(RecordedCall::ListTorrents(filters.clone())).await;
        Self::check_session(session)?;

        if let Some(status) = self.failures.read().await.list_status {
            return Err(TorrentClientError::Http {
                status,
                body: "mock list failure".to_string(),
            });
        }

        Ok(self
            .torrents
            .read()
            .await
            .iter()
            .filter(|t| matches_server_filters(&t.torrent, filters))
            .map(|t| t.torrent.clone())
            .collect())
    }

    async fn list_trackers(
        &self,
        session: &Session,
        hash: &str,
    ) -> Result<Vec<TrackerEntry>, TorrentClientError> {
        self.record(RecordedCall::ListTrackers(hash.to_string())).await;
        Self::check_session(session)?;

        if self.failures.read().await.tracker_hashes.contains(hash) {
            return Err(TorrentClientError::Http {
                status: 404,
                body: "Torrent not found".to_string(),
            });
        }

        self.torrents
            .read()
            .await
            .iter()
            .find(|t| t.torrent.hash == hash)
            .map(|t| t.trackers.clone())
            .ok_or_else(|| TorrentClientError::Http {
                status: 404,
                body: "Torrent not found".to_string(),
            })
    }

    async fn edit_tracker(
        &self,
        session: &Session,
        hash: &str,
        orig_url: &str,
        new_url: &str,
    ) -> Result<(), TorrentClientError> {
        self.record(RecordedCall::EditTracker {
            hash: hash.to_string(),
            orig_url: orig_url.to_string(),
            new_url: new_url.to_string(),
        })
        .await;
        Self::check_session(session)?;

        if self.failures.read().await.edit_urls.contains(orig_url) {
            return Err(TorrentClientError::EditFailed {
                orig_url: orig_url.to_string(),
                status: 409,
                body: "mock edit failure".to_string(),
            });
        }

        let mut torrents = self.torrents.write().await;
        let tracker = torrents
            .iter_mut()
            .find(|t| t.torrent.hash == hash)
            .and_then(|t| t.trackers.iter_mut().find(|tr| tr.url == orig_url));

        match tracker {
            Some(tracker) => {
                tracker.url = new_url.to_string();
                Ok(())
            }
            None => Err(TorrentClientError::EditFailed {
                orig_url: orig_url.to_string(),
                status: 409,
                body: "origUrl not found".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let client = MockTorrentClient::new();
        client
            .add_torrent(fixtures::torrent("aaa"), vec![fixtures::tracker("http://a/announce")])
            .await;

        let session = client.authenticate(None).await.unwrap();
        client
            .list_torrents(&session, &TorrentFilters::default())
            .await
            .unwrap();
        client.list_trackers(&session, "aaa").await.unwrap();

        assert_eq!(
            client.calls().await,
            vec![
                RecordedCall::Authenticate,
                RecordedCall::ListTorrents(TorrentFilters::default()),
                RecordedCall::ListTrackers("aaa".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_applies_server_filters() {
        let client = MockTorrentClient::new();
        let mut linux = fixtures::torrent("aaa");
        linux.category = "linux".to_string();
        client.add_torrent(linux, vec![]).await;
        client.add_torrent(fixtures::torrent("bbb"), vec![]).await;

        let session = client.authenticate(None).await.unwrap();
        let filters = TorrentFilters {
            category: Some("linux".to_string()),
            ..Default::default()
        };
        let torrents = client.list_torrents(&session, &filters).await.unwrap();
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].hash, "aaa");
    }

    #[tokio::test]
    async fn test_mock_edit_persists() {
        let client = MockTorrentClient::new();
        client
            .add_torrent(fixtures::torrent("aaa"), vec![fixtures::tracker("http://a/announce")])
            .await;

        let session = client.authenticate(None).await.unwrap();
        client
            .edit_tracker(&session, "aaa", "http://a/announce", "http://b/announce")
            .await
            .unwrap();

        assert_eq!(client.tracker_urls("aaa").await, vec!["http://b/announce"]);
    }

    #[tokio::test]
    async fn test_mock_rejects_foreign_session() {
        let client = MockTorrentClient::new();
        let result = client
            .list_torrents(&Session::new("SID", "stale"), &TorrentFilters::default())
            .await;
        assert!(matches!(
            result,
            Err(TorrentClientError::SessionExpired { status: 403 })
        ));
    }
}
