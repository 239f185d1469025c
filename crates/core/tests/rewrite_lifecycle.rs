//! Rewrite run integration tests.
//!
//! These tests drive complete runs against the mock client:
//! validate -> authenticate -> list -> per-torrent trackers -> edit -> report

use std::sync::Arc;

use retracker_core::{
    testing::{fixtures, MockTorrentClient, RecordedCall},
    Config, ConfigError, RunError, TorrentFilters, TrackerRewriter, EXIT_CONFIG_ERROR,
    EXIT_RUN_ERROR,
};

const HASH: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

fn base_config(pattern: &str, replacement: &str) -> Config {
    let mut config = Config::default();
    config.connection.url = Some("http://localhost:8080".to_string());
    config.connection.username = Some("admin".to_string());
    config.connection.password = Some("adminadmin".to_string());
    config.rule.pattern = Some(pattern.to_string());
    config.rule.replacement = Some(replacement.to_string());
    config
}

async fn single_tracker_client() -> Arc<MockTorrentClient> {
    let client = Arc::new(MockTorrentClient::new());
    client
        .add_torrent(
            fixtures::torrent(HASH),
            vec![fixtures::tracker("http://old.example.com/announce")],
        )
        .await;
    client
}

#[tokio::test]
async fn test_rewrites_single_tracker() {
    let client = single_tracker_client().await;
    let config = base_config(r"old\.example\.com", "new.example.com");

    let rewriter = TrackerRewriter::from_config(&config, client.clone()).unwrap();
    let summary = rewriter.run_once().await.unwrap();

    assert_eq!(
        client.edits().await,
        vec![(
            HASH.to_string(),
            "http://old.example.com/announce".to_string(),
            "http://new.example.com/announce".to_string(),
        )]
    );
    assert_eq!(summary.to_string(), "Checked 1 tracker URLs. Changed 1.");
    assert_eq!(summary.changes[0].to, "http://new.example.com/announce");
    assert!(summary.finished_at.is_some());
}

#[tokio::test]
async fn test_invalid_pattern_makes_no_calls() {
    let client = single_tracker_client().await;
    let config = base_config("(", "new.example.com");

    let result = TrackerRewriter::from_config(&config, client.clone());
    let err = RunError::from(result.err().expect("invalid pattern must be rejected"));

    assert!(matches!(
        err,
        RunError::Configuration(ConfigError::InvalidPattern(_))
    ));
    assert_eq!(err.exit_code(), EXIT_CONFIG_ERROR);
    assert!(client.calls().await.is_empty());
}

#[tokio::test]
async fn test_no_torrents_is_success() {
    let client = Arc::new(MockTorrentClient::new());
    let config = base_config(r"old\.example\.com", "new.example.com");

    let summary = TrackerRewriter::from_config(&config, client.clone())
        .unwrap()
        .run_once()
        .await
        .unwrap();

    assert_eq!(summary.to_string(), "Checked 0 tracker URLs. Changed 0.");
    assert_eq!(summary.torrents, 0);
    assert_eq!(
        client.calls().await,
        vec![
            RecordedCall::Authenticate,
            RecordedCall::ListTorrents(TorrentFilters::default()),
        ]
    );
}

#[tokio::test]
async fn test_rejected_login_exit_code() {
    let client = single_tracker_client().await;
    client.reject_login().await;

    let err = TrackerRewriter::from_config(&base_config("old", "new"), client.clone())
        .unwrap()
        .run_once()
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Authentication(_)));
    assert_eq!(err.exit_code(), EXIT_RUN_ERROR);
}

#[tokio::test]
async fn test_missing_session_cookie_is_authentication_error() {
    let client = single_tracker_client().await;
    client.omit_session_cookie().await;

    let err = TrackerRewriter::from_config(&base_config("old", "new"), client.clone())
        .unwrap()
        .run_once()
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Authentication(_)));
    assert!(client.edits().await.is_empty());
}

#[tokio::test]
async fn test_later_login_without_cookie_reuses_previous_session() {
    let client = single_tracker_client().await;
    let rewriter = TrackerRewriter::from_config(
        &base_config(r"old\.example\.com", "new.example.com"),
        client.clone(),
    )
    .unwrap();

    let first = rewriter.run_once().await.unwrap();
    assert_eq!(first.changed, 1);

    client.omit_session_cookie().await;
    client
        .add_torrent(
            fixtures::torrent("bbb"),
            vec![fixtures::tracker("http://old.example.com/announce")],
        )
        .await;

    let second = rewriter.run_once().await.unwrap();
    assert_eq!(second.changed, 1);
    assert_eq!(client.edits().await.len(), 2);
}

async fn mixed_client() -> Arc<MockTorrentClient> {
    let client = Arc::new(MockTorrentClient::new());
    let mut one = fixtures::pseudo_trackers();
    one.push(fixtures::tracker("http://old.example.com/announce"));
    one.push(fixtures::tracker("udp://old.example.com:6969/announce"));
    client.add_torrent(fixtures::torrent("aaa"), one).await;
    client
        .add_torrent(
            fixtures::torrent("bbb"),
            vec![
                fixtures::tracker("https://old.example.com/announce?passkey=1"),
                fixtures::tracker("https://unrelated.example.net/announce"),
            ],
        )
        .await;
    client
        .add_torrent(
            fixtures::torrent("ccc"),
            vec![fixtures::tracker("HTTP://OLD.EXAMPLE.COM/announce")],
        )
        .await;
    client
}

#[tokio::test]
async fn test_preview_counts_match_real_run() {
    let config = base_config(r"old\.example\.com", "new.example.com");

    let preview_client = mixed_client().await;
    let mut preview_config = config.clone();
    preview_config.preview = true;
    let preview = TrackerRewriter::from_config(&preview_config, preview_client.clone())
        .unwrap()
        .run_once()
        .await
        .unwrap();

    let real_client = mixed_client().await;
    let real = TrackerRewriter::from_config(&config, real_client.clone())
        .unwrap()
        .run_once()
        .await
        .unwrap();

    assert!(preview_client.edits().await.is_empty());
    assert_eq!(preview.changed, real.changed);
    assert_eq!(preview.checked, real.checked);
    assert_eq!(preview.changes, real.changes);
    assert_eq!(real.changed, real_client.edits().await.len());
    assert_eq!(preview.to_string(), "Checked 4 tracker URLs. Would change 2.");
}

#[tokio::test]
async fn test_non_http_trackers_never_edited_or_counted() {
    let client = mixed_client().await;
    let config = base_config(".*", "http://x/announce");
    let summary = TrackerRewriter::from_config(&config, client.clone())
        .unwrap()
        .run_once()
        .await
        .unwrap();

    assert_eq!(summary.checked, 4);
    assert_eq!(summary.skipped, 4);
    for (_, orig_url, _) in client.edits().await {
        assert!(
            orig_url.to_lowercase().starts_with("http://")
                || orig_url.to_lowercase().starts_with("https://")
        );
    }
}

#[tokio::test]
async fn test_multiple_hashes_filter_client_side() {
    let client = mixed_client().await;
    let mut config = base_config(r"old\.example\.com", "new.example.com");
    config.filters.hashes = vec!["AAA".to_string(), "ccc".to_string(), "zzz".to_string()];

    let summary = TrackerRewriter::from_config(&config, client.clone())
        .unwrap()
        .run_once()
        .await
        .unwrap();

    // The server saw no hash constraint.
    let listed = client
        .calls()
        .await
        .into_iter()
        .find_map(|c| match c {
            RecordedCall::ListTorrents(filters) => Some(filters),
            _ => None,
        })
        .unwrap();
    assert_eq!(listed.server_hash(), None);

    assert_eq!(client.tracker_requests().await, vec!["aaa", "ccc"]);
    assert!(client.edits().await.iter().all(|(hash, _, _)| hash != "bbb"));
    assert_eq!(summary.torrents, 2);
}

#[tokio::test]
async fn test_single_hash_filters_server_side() {
    let client = mixed_client().await;
    let mut config = base_config(r"old\.example\.com", "new.example.com");
    config.filters.hashes = vec!["bbb".to_string()];

    TrackerRewriter::from_config(&config, client.clone())
        .unwrap()
        .run_once()
        .await
        .unwrap();

    assert_eq!(client.tracker_requests().await, vec!["bbb"]);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let client = mixed_client().await;
    let rewriter = TrackerRewriter::from_config(
        &base_config(r"old\.example\.com", "new.example.com"),
        client.clone(),
    )
    .unwrap();

    let first = rewriter.run_once().await.unwrap();
    client.clear_calls().await;
    let second = rewriter.run_once().await.unwrap();

    assert_eq!(first.changed, 2);
    assert_eq!(second.changed, 0);
    assert_eq!(second.checked, first.checked);
    assert!(client.edits().await.is_empty());
}

#[tokio::test]
async fn test_backreferences_end_to_end() {
    let client = mixed_client().await;
    let config = base_config(
        r"^https://old\.example\.com/announce\?passkey=(\d+)$",
        "https://new.example.com/$1/announce",
    );

    TrackerRewriter::from_config(&config, client.clone())
        .unwrap()
        .run_once()
        .await
        .unwrap();

    assert_eq!(
        client.tracker_urls("bbb").await,
        vec![
            "https://new.example.com/1/announce",
            "https://unrelated.example.net/announce"
        ]
    );
}
