use std::{path::PathBuf, time::Duration};

use chrono::{FixedOffset, Offset, Utc};
use shuttle_client::ClientConfig;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub session_secret: Vec<u8>,
    pub zone: FixedOffset,
    pub session_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let http_url = value("GRAPHQL_HTTP_URL").ok_or(ConfigError::Missing("GRAPHQL_HTTP_URL"))?;
        let ws_url = value("GRAPHQL_WS_URL").ok_or(ConfigError::Missing("GRAPHQL_WS_URL"))?;

        let mut client = ClientConfig::new(http_url, ws_url);
        if let Some(secs) = parse_opt::<u64>("CACHE_TTL_SECS", value("CACHE_TTL_SECS"))? {
            client.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_opt::<u64>("WS_KEEP_ALIVE_SECS", value("WS_KEEP_ALIVE_SECS"))? {
            client.keep_alive = Duration::from_secs(secs);
        }

        let zone = parse_opt::<FixedOffset>("DISPLAY_UTC_OFFSET", value("DISPLAY_UTC_OFFSET"))?
            .unwrap_or_else(|| Utc.fix());

        Ok(Self {
            client,
            session_secret: read_or_generate_secret(value("SESSION_SECRET")),
            zone,
            session_file: value("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".shuttle-session")),
        })
    }
}

fn parse_opt<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    match value {
        None => Ok(None),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::Invalid { name, value }),
        },
    }
}

fn read_or_generate_secret(secret: Option<String>) -> Vec<u8> {
    if let Some(secret) = secret {
        secret.into_bytes()
    } else {
        log::warn!("SESSION_SECRET not set, generating a random one; stored sign-ins will not survive a restart");
        Uuid::new_v4().as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_endpoint_is_fatal() {
        let err = AppConfig::from_lookup(lookup(&[("GRAPHQL_WS_URL", "ws://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GRAPHQL_HTTP_URL")));

        let err = AppConfig::from_lookup(lookup(&[
            ("GRAPHQL_HTTP_URL", "http://x"),
            ("GRAPHQL_WS_URL", "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GRAPHQL_WS_URL")));
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GRAPHQL_HTTP_URL", "http://api/graphql"),
            ("GRAPHQL_WS_URL", "ws://api/graphql"),
            ("SESSION_SECRET", "s3cret"),
            ("DISPLAY_UTC_OFFSET", "+08:00"),
            ("CACHE_TTL_SECS", "60"),
        ]))
        .expect("valid config");
        assert_eq!(config.session_secret, b"s3cret");
        assert_eq!(config.zone.local_minus_utc(), 8 * 3600);
        assert_eq!(config.client.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.client.keep_alive, Duration::from_secs(10));
        assert_eq!(config.session_file, PathBuf::from(".shuttle-session"));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("GRAPHQL_HTTP_URL", "http://x"),
            ("GRAPHQL_WS_URL", "ws://x"),
            ("DISPLAY_UTC_OFFSET", "eight"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DISPLAY_UTC_OFFSET", .. }));
    }
}
