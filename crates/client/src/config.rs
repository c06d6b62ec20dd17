//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.civo.com";
pub const DEFAULT_REGION: &str = "LON1";

/// Connection settings for the Civo API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API, without trailing slash
    pub api_url: String,

    /// API key
    pub token: String,

    /// Region code sent with every request
    pub region: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: String::new(),
            region: DEFAULT_REGION.to_string(),
            timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `CIVO_API_URL`, `CIVO_TOKEN`, `CIVO_REGION`
    /// and `CIVO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Defaults overlaid with values from `lookup`, keyed like the
    /// environment variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("CIVO_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(token) = non_empty("CIVO_TOKEN") {
            config.token = token;
        }
        if let Some(region) = non_empty("CIVO_REGION") {
            config.region = region;
        }
        if let Some(secs) = non_empty("CIVO_TIMEOUT_SECS") {
            config.timeout_secs = secs.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("CIVO_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "https://api.civo.com");
        assert_eq!(config.region, "LON1");
        assert!(config.token.is_empty());
    }

    #[test]
    fn test_env_overlay() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CIVO_TOKEN", "secret"),
            ("CIVO_REGION", "NYC1"),
            ("CIVO_API_URL", "http://localhost:8080/"),
            ("CIVO_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.token, "secret");
        assert_eq!(config.region, "NYC1");
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[("CIVO_REGION", "  ")])).unwrap();
        assert_eq!(config.region, "LON1");
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("CIVO_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_from_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str("token = \"abc\"\nregion = \"FRA1\"\n").unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.region, "FRA1");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, 60);
    }
}
