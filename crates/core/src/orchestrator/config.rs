//! Loop mode configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Loop interval used when none (or an unusable one) is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Configuration for loop mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Repeat the run forever instead of exiting after one pass.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between runs. Accepts an integer or a numeric string.
    /// Absent, non-numeric or non-positive values fall back to the default.
    #[serde(default, deserialize_with = "lenient_interval")]
    pub interval_secs: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInterval {
    Secs(i64),
    Text(String),
}

fn lenient_interval<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawInterval>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(RawInterval::Secs(secs)) => Some(secs),
        Some(RawInterval::Text(text)) => {
            let parsed = parse_interval_secs(&text);
            if parsed.is_none() {
                warn!(
                    "Ignoring non-numeric loop interval {:?}, using {}s",
                    text, DEFAULT_INTERVAL_SECS
                );
            }
            parsed
        }
    })
}

impl ScheduleConfig {
    /// Effective interval between runs.
    pub fn interval(&self) -> Duration {
        match self.interval_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
            _ => Duration::from_secs(DEFAULT_INTERVAL_SECS),
        }
    }
}

/// Parse a user-supplied interval. Non-numeric input yields `None`.
pub fn parse_interval_secs(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
