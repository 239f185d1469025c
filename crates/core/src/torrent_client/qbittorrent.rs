//! qBittorrent Web API client.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex_lite::Regex;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;

use super::{Session, Torrent, TorrentClient, TorrentClientError, TorrentFilters, TrackerEntry};

/// Primary session cookie set by qBittorrent.
static SID_COOKIE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[;,\s])(SID)=([^;,\s]+)").expect("valid regex"));

/// Alternate cookie name used by builds with a custom session cookie name.
static ALT_SID_COOKIE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[;,\s])(QBT_SID[^=;,\s]*)=([^;,\s]+)").expect("valid regex")
});

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(u64::from(secs)));
        }
        let client = builder.build().map_err(|e| {
            TorrentClientError::Internal(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Send a request and return status and body.
    async fn send(
        &self,
        request: RequestBuilder,
    ) -> Result<(StatusCode, String), TorrentClientError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))?;
        Ok((status, body))
    }

    /// Make an authenticated GET request, returning the body on success.
    async fn get(
        &self,
        session: &Session,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<String, TorrentClientError> {
        let mut url = format!("{}{}", self.base_url(), endpoint);
        if !query.is_empty() {
            let parts: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&parts.join("&"));
        }

        debug!("GET {}", url);
        let request = self
            .client
            .get(&url)
            .header(COOKIE, session.cookie_header());
        let (status, body) = self.send(request).await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TorrentClientError::SessionExpired {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(TorrentClientError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// Classify a transport-level failure.
fn transport_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

/// Find the session cookie in the login response's `Set-Cookie` values.
fn extract_session_cookie<'a>(set_cookies: impl IntoIterator<Item = &'a str>) -> Option<Session> {
    let joined = set_cookies.into_iter().collect::<Vec<_>>().join("; ");
    SID_COOKIE
        .captures(&joined)
        .or_else(|| ALT_SID_COOKIE.captures(&joined))
        .map(|caps| Session::new(&caps[1], &caps[2]))
}

/// qBittorrent torrent info response.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    /// Comma-separated.
    #[serde(default)]
    tags: String,
    #[serde(default)]
    state: String,
}

impl QBTorrentInfo {
    fn into_torrent(self) -> Torrent {
        Torrent {
            hash: self.hash,
            name: self.name,
            category: self.category,
            tags: self
                .tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            state: self.state,
        }
    }
}

/// qBittorrent tracker response.
#[derive(Debug, Deserialize)]
struct QBTracker {
    #[serde(default)]
    url: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    status: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    tier: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    num_peers: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    num_seeds: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    num_leeches: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    num_downloaded: Option<i64>,
    #[serde(default)]
    msg: String,
}

impl QBTracker {
    fn into_tracker_entry(self) -> TrackerEntry {
        TrackerEntry {
            url: self.url,
            status: self.status.unwrap_or_default(),
            tier: self.tier,
            num_peers: self.num_peers.unwrap_or_default(),
            num_seeds: self.num_seeds.unwrap_or_default(),
            num_leeches: self.num_leeches.unwrap_or_default(),
            num_downloaded: self.num_downloaded.unwrap_or_default(),
            msg: self.msg,
        }
    }
}

/// Older servers send `""` instead of a number for pseudo-trackers.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn authenticate(
        &self,
        previous: Option<&Session>,
    ) -> Result<Session, TorrentClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());
        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let session = extract_session_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        let body = response.text().await.unwrap_or_default();

        if body.contains("Fails.")
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
        {
            return Err(TorrentClientError::AuthenticationFailed(format!(
                "Invalid credentials (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(TorrentClientError::AuthenticationFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(100).collect::<String>()
            )));
        }

        match (session, previous) {
            (Some(session), _) => {
                debug!("qBittorrent login successful ({} cookie)", session.cookie_name());
                Ok(session)
            }
            (None, Some(previous)) => {
                warn!("Login response carried no session cookie, reusing existing session");
                Ok(previous.clone())
            }
            (None, None) => Err(TorrentClientError::AuthenticationFailed(
                "No session cookie in login response".to_string(),
            )),
        }
    }

    async fn list_torrents(
        &self,
        session: &Session,
        filters: &TorrentFilters,
    ) -> Result<Vec<Torrent>, TorrentClientError> {
        let body = self
            .get(session, "/api/v2/torrents/info", &filters.query_params())
            .await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&body).map_err(|e| {
            TorrentClientError::InvalidResponse(format!("Failed to parse torrent list: {}", e))
        })?;

        Ok(torrents.into_iter().map(QBTorrentInfo::into_torrent).collect())
    }

    async fn list_trackers(
        &self,
        session: &Session,
        hash: &str,
    ) -> Result<Vec<TrackerEntry>, TorrentClientError> {
        let body = self
            .get(session, "/api/v2/torrents/trackers", &[("hash", hash.to_string())])
            .await?;
        let trackers: Vec<QBTracker> = serde_json::from_str(&body).map_err(|e| {
            TorrentClientError::InvalidResponse(format!("Failed to parse tracker list: {}", e))
        })?;

        Ok(trackers
            .into_iter()
            .map(QBTracker::into_tracker_entry)
            .collect())
    }

    async fn edit_tracker(
        &self,
        session: &Session,
        hash: &str,
        orig_url: &str,
        new_url: &str,
    ) -> Result<(), TorrentClientError> {
        let url = format!("{}/api/v2/torrents/editTracker", self.base_url());
        let params = [("hash", hash), ("origUrl", orig_url), ("newUrl", new_url)];

        debug!("POST {} ({} -> {})", url, orig_url, new_url);
        let request = self
            .client
            .post(&url)
            .header(COOKIE, session.cookie_header())
            .form(&params);
        let (status, body) = self.send(request).await?;

        if !status.is_success() {
            return Err(TorrentClientError::EditFailed {
                orig_url: orig_url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
