use super::{types::required, types::Config, ConfigError};
use crate::rewrite::RewriteRule;

/// Validate configuration before any network call is made.
///
/// Checks that every required setting is present (reporting all missing ones
/// at once) and that the tracker pattern compiles.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut missing = Vec::new();
    required(&config.connection.url, "url", &mut missing);
    required(&config.connection.username, "username", &mut missing);
    required(&config.connection.password, "password", &mut missing);
    let pattern = required(&config.rule.pattern, "pattern", &mut missing);
    // An empty replacement is a legitimate way to strip the match.
    if config.rule.replacement.is_none() {
        missing.push("replacement");
    }

    if !missing.is_empty() {
        return Err(ConfigError::MissingFields(missing));
    }

    if let Some(pattern) = pattern {
        RewriteRule::new(&pattern, "")?;
    }

    Ok(())
}
