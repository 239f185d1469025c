pub mod config;
pub mod orchestrator;
pub mod rewrite;
pub mod testing;
pub mod torrent_client;

pub use config::{
    load_config, load_config_from_str, load_optional_config, mask_secret, validate_config, Config,
    ConfigError, ConnectionConfig, FilterConfig, QBittorrentConfig, RuleConfig, SanitizedConfig,
};
pub use orchestrator::{
    parse_interval_secs, LoopDriver, RunError, RunSummary, ScheduleConfig, Sleeper, TokioSleeper,
    TrackerChange, TrackerRewriter, DEFAULT_INTERVAL_SECS, EXIT_CONFIG_ERROR, EXIT_RUN_ERROR,
    EXIT_SUCCESS,
};
pub use rewrite::{is_eligible, retain_requested, RewriteOutcome, RewriteRule};
pub use torrent_client::{
    QBittorrentClient, Session, Torrent, TorrentClient, TorrentClientError, TorrentFilters,
    TrackerEntry,
};
