//! Environment configuration.
//!
//! All settings are read once at startup. The token signing secret has no
//! default and its absence is a fatal startup error, never a runtime one.

use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_DATA_DIR: &str = "bizmate_data";
/// 7 days.
pub const DEFAULT_TOKEN_EXPIRY_MINUTES: i64 = 10_080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: String,
    pub token_secret: String,
    pub token_algorithm: Algorithm,
    pub token_expiry_minutes: i64,
    /// Completion-service collaborator; endpoints depending on it answer
    /// 502 when unset.
    pub advisor: Option<UpstreamConfig>,
    /// Image-host collaborator for logo uploads; same rule as above.
    pub image_host: Option<UpstreamConfig>,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub url: String,
    pub api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup, so tests can
    /// exercise the parsing without touching the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token_secret = get("TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("TOKEN_SECRET"))?;

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = SocketAddr::from_str(&bind_addr)
            .map_err(|e| ConfigError::Invalid("BIND_ADDR", e.to_string()))?;

        let token_algorithm = match get("TOKEN_ALGORITHM") {
            Some(raw) => Algorithm::from_str(&raw)
                .map_err(|e| ConfigError::Invalid("TOKEN_ALGORITHM", e.to_string()))?,
            None => Algorithm::HS256,
        };

        let token_expiry_minutes = match get("TOKEN_EXPIRY_MINUTES") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or(ConfigError::Invalid("TOKEN_EXPIRY_MINUTES", raw))?,
            None => DEFAULT_TOKEN_EXPIRY_MINUTES,
        };

        let advisor = upstream(&get, "ADVISOR_API_URL", "ADVISOR_API_KEY");
        let image_host = upstream(&get, "IMAGE_HOST_URL", "IMAGE_HOST_API_KEY");

        Ok(Config {
            bind_addr,
            data_dir: get("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            token_secret,
            token_algorithm,
            token_expiry_minutes,
            advisor,
            image_host,
        })
    }
}

fn upstream(
    get: &impl Fn(&str) -> Option<String>,
    url_key: &str,
    api_key_key: &str,
) -> Option<UpstreamConfig> {
    let url = get(url_key).filter(|s| !s.is_empty())?;
    let api_key = get(api_key_key).filter(|s| !s.is_empty())?;
    Some(UpstreamConfig { url, api_key })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TOKEN_SECRET")));
    }

    #[test]
    fn defaults_applied() {
        let cfg = Config::from_lookup(lookup(&[("TOKEN_SECRET", "s3cret")])).unwrap();
        assert_eq!(cfg.token_expiry_minutes, 10_080);
        assert_eq!(cfg.token_algorithm, Algorithm::HS256);
        assert_eq!(cfg.data_dir, "bizmate_data");
        assert!(cfg.advisor.is_none());
        assert!(cfg.image_host.is_none());
    }

    #[test]
    fn upstream_requires_both_url_and_key() {
        let cfg = Config::from_lookup(lookup(&[
            ("TOKEN_SECRET", "s3cret"),
            ("ADVISOR_API_URL", "https://advisor.example/v1"),
        ]))
        .unwrap();
        assert!(cfg.advisor.is_none());

        let cfg = Config::from_lookup(lookup(&[
            ("TOKEN_SECRET", "s3cret"),
            ("ADVISOR_API_URL", "https://advisor.example/v1"),
            ("ADVISOR_API_KEY", "k"),
        ]))
        .unwrap();
        assert!(cfg.advisor.is_some());
    }

    #[test]
    fn bad_expiry_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("TOKEN_SECRET", "s3cret"),
            ("TOKEN_EXPIRY_MINUTES", "zero"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("TOKEN_EXPIRY_MINUTES", _)));
    }
}
