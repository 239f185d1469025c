//! Testing utilities and a mock torrent client.
//!
//! # Example
//!
//! ```rust,ignore
//! use retracker_core::testing::{fixtures, MockTorrentClient};
//!
//! let client = Arc::new(MockTorrentClient::new());
//! client
//!     .add_torrent(
//!         fixtures::torrent("aaa"),
//!         vec![fixtures::tracker("http://old.example.com/announce")],
//!     )
//!     .await;
//! ```

mod mock_torrent_client;

pub use mock_torrent_client::{MockTorrentClient, RecordedCall, MOCK_TOKEN};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::torrent_client::{Torrent, TrackerEntry};

    /// Create a test torrent with reasonable defaults.
    pub fn torrent(hash: &str) -> Torrent {
        Torrent {
            hash: hash.to_string(),
            name: format!("Torrent {}", hash),
            category: String::new(),
            tags: Default::default(),
            state: "stalledUP".to_string(),
        }
    }

    /// Create a working tracker entry for a URL.
    pub fn tracker(url: &str) -> TrackerEntry {
        TrackerEntry {
            url: url.to_string(),
            status: 2,
            tier: Some(0),
            ..Default::default()
        }
    }

    /// The DHT, PeX and LSD pseudo-entries qBittorrent lists first.
    pub fn pseudo_trackers() -> Vec<TrackerEntry> {
        ["** [DHT] **", "** [PeX] **", "** [LSD] **"]
            .into_iter()
            .map(|url| TrackerEntry {
                url: url.to_string(),
                status: 2,
                tier: None,
                ..Default::default()
            })
            .collect()
    }
}
