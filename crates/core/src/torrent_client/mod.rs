//! Torrent client abstraction.
//!
//! This module provides a `TorrentClient` trait covering the four Web API
//! calls the rewriter needs, and its qBittorrent implementation.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;
