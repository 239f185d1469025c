//! Tracker rewriter implementation.
//!
//! Drives one run through its fixed sequence:
//! - Validate: settings and pattern (before construction, no network)
//! - Authenticate / List: fail-fast, abort the run
//! - Per torrent / per tracker: failures are logged, counted and skipped
//! - Report: summary line

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{validate_config, Config, ConfigError};
use crate::rewrite::{is_eligible, retain_requested, RewriteOutcome, RewriteRule};
use crate::torrent_client::{Session, Torrent, TorrentClient, TorrentFilters};

use super::types::{RunError, RunSummary, TrackerChange};

/// Applies one rewrite rule to every matching tracker of the selected torrents.
pub struct TrackerRewriter {
    client: Arc<dyn TorrentClient>,
    rule: RewriteRule,
    filters: TorrentFilters,
    preview: bool,
    /// Session from the last successful login, offered back to the next one.
    session: Mutex<Option<Session>>,
}

impl TrackerRewriter {
    /// Create a rewriter from already validated parts.
    pub fn new(
        client: Arc<dyn TorrentClient>,
        rule: RewriteRule,
        filters: TorrentFilters,
        preview: bool,
    ) -> Self {
        Self {
            client,
            rule,
            filters,
            preview,
            session: Mutex::new(None),
        }
    }

    /// Validate `config` and build a rewriter. Nothing touches the network.
    pub fn from_config(
        config: &Config,
        client: Arc<dyn TorrentClient>,
    ) -> Result<Self, ConfigError> {
        validate_config(config)?;

        let rule = RewriteRule::new(
            config.rule.pattern.as_deref().unwrap_or_default(),
            config.rule.replacement.as_deref().unwrap_or_default(),
        )?;

        Ok(Self::new(
            client,
            rule,
            TorrentFilters::from(&config.filters),
            config.preview,
        ))
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Run one full pass.
    ///
    /// Returns an error only for failures before the per-torrent phase; once
    /// the torrent list is fetched the run always produces a summary.
    pub async fn run_once(&self) -> Result<RunSummary, RunError> {
        let mut summary = RunSummary::new(self.preview);

        let session = {
            let mut held = self.session.lock().await;
            let session = self
                .client
                .authenticate(held.as_ref())
                .await
                .map_err(RunError::Authentication)?;
            *held = Some(session.clone());
            session
        };
        debug!("Authenticated against {}", self.client.name());

        let mut torrents = self
            .client
            .list_torrents(&session, &self.filters)
            .await
            .map_err(RunError::Fetch)?;
        retain_requested(&mut torrents, &self.filters.hashes);

        summary.torrents = torrents.len();
        info!("Inspecting trackers of {} torrent(s)", torrents.len());

        for torrent in &torrents {
            self.process_torrent(&session, torrent, &mut summary).await;
        }

        summary.finished_at = Some(Utc::now());
        info!("{}", summary);
        if summary.has_failures() {
            warn!(
                "{} torrent(s) skipped, {} edit(s) failed",
                summary.failed_torrents, summary.failed_edits
            );
        }

        Ok(summary)
    }

    /// Rewrite the trackers of one torrent. Never fails the run.
    async fn process_torrent(
        &self,
        session: &Session,
        torrent: &Torrent,
        summary: &mut RunSummary,
    ) {
        let trackers = match self.client.list_trackers(session, &torrent.hash).await {
            Ok(trackers) => trackers,
            Err(e) => {
                warn!(
                    "Skipping torrent {} ({}): failed to fetch trackers: {}",
                    torrent.name, torrent.hash, e
                );
                summary.failed_torrents += 1;
                return;
            }
        };

        for tracker in trackers {
            if !is_eligible(&tracker.url) {
                debug!("Ignoring non-HTTP tracker {:?} on {}", tracker.url, torrent.hash);
                summary.skipped += 1;
                continue;
            }
            summary.checked += 1;

            let new_url = match self.rule.apply(&tracker.url) {
                RewriteOutcome::Unchanged => continue,
                RewriteOutcome::Changed(new_url) => new_url,
            };

            let change = TrackerChange {
                hash: torrent.hash.clone(),
                torrent_name: torrent.name.clone(),
                from: tracker.url.clone(),
                to: new_url,
            };

            if self.preview {
                info!(
                    "[preview] {}: {} -> {}",
                    change.torrent_name, change.from, change.to
                );
                summary.changed += 1;
                summary.changes.push(change);
                continue;
            }

            match self
                .client
                .edit_tracker(session, &torrent.hash, &change.from, &change.to)
                .await
            {
                Ok(()) => {
                    info!("{}: {} -> {}", change.torrent_name, change.from, change.to);
                    summary.changed += 1;
                    summary.changes.push(change);
                }
                Err(e) => {
                    warn!("{}: {}", change.torrent_name, e);
                    summary.failed_edits += 1;
                }
            }
        }
    }
}
