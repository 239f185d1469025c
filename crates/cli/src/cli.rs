//! Command-line arguments and their environment fallbacks.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::Parser;
use tracing::warn;

use retracker_core::{parse_interval_secs, Config};

/// Rewrite tracker announce URLs on a qBittorrent instance.
///
/// Values given here override the optional config file.
#[derive(Debug, Parser)]
#[command(name = "retracker", version, about, long_about = None)]
pub struct Args {
    /// Web UI base URL, e.g. http://localhost:8080
    #[arg(long, env = "QBIT_URL")]
    pub url: Option<String>,

    #[arg(short, long, env = "QBIT_USERNAME")]
    pub username: Option<String>,

    #[arg(short, long, env = "QBIT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Regular expression matched against each tracker URL
    #[arg(long, env = "TRACKER_PATTERN")]
    pub pattern: Option<String>,

    /// Replacement; $1..$9 insert captured groups
    #[arg(long, env = "TRACKER_REPLACEMENT", allow_hyphen_values = true)]
    pub replacement: Option<String>,

    /// Only consider this torrent (repeatable)
    #[arg(long = "hash", env = "QBIT_HASHES", value_delimiter = ',')]
    pub hashes: Vec<String>,

    #[arg(long, env = "QBIT_CATEGORY")]
    pub category: Option<String>,

    /// Only consider torrents with this tag (repeatable)
    #[arg(long = "tag", env = "QBIT_TAGS", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Server-side state filter, e.g. seeding, paused, stalled
    #[arg(long, env = "QBIT_STATE")]
    pub state: Option<String>,

    /// Report what would change without editing anything
    #[arg(long, env = "DRY_RUN", value_parser = BoolishValueParser::new())]
    pub dry_run: bool,

    /// Run forever, pausing --interval seconds between runs
    #[arg(long = "loop", env = "LOOP", value_parser = BoolishValueParser::new())]
    pub loop_mode: bool,

    /// Seconds between runs in loop mode
    #[arg(long, env = "LOOP_INTERVAL")]
    pub interval: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "DEBUG", value_parser = BoolishValueParser::new())]
    pub verbose: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Emit log lines as JSON
    #[arg(long, env = "RETRACKER_LOG_JSON", value_parser = BoolishValueParser::new())]
    pub log_json: bool,

    /// Optional TOML config file
    #[arg(short, long, env = "RETRACKER_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Overlay the command-line values onto `config`.
    pub fn apply(&self, config: &mut Config) {
        override_with(&mut config.connection.url, &self.url);
        override_with(&mut config.connection.username, &self.username);
        override_with(&mut config.connection.password, &self.password);
        override_with(&mut config.rule.pattern, &self.pattern);
        // An explicitly empty replacement is meaningful.
        if self.replacement.is_some() {
            config.rule.replacement = self.replacement.clone();
        }

        if !self.hashes.is_empty() {
            config.filters.hashes = self.hashes.clone();
        }
        override_with(&mut config.filters.category, &self.category);
        if !self.tags.is_empty() {
            config.filters.tags = self.tags.clone();
        }
        override_with(&mut config.filters.state, &self.state);

        config.preview |= self.dry_run;
        config.schedule.enabled |= self.loop_mode;
        config.verbose |= self.verbose;

        if let Some(raw) = &self.interval {
            match parse_interval_secs(raw) {
                Some(secs) => config.schedule.interval_secs = Some(secs),
                None => warn!("Ignoring non-numeric loop interval {:?}", raw),
            }
        }
    }
}

fn override_with(target: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        *target = Some(v.to_string());
    }
}
