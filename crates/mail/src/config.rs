//! Configuration loading for the mail core
//!
//! Settings are loaded from (in order of priority):
//! 1. Runtime environment variables (`FOLIO_*`)
//! 2. JSON file (~/.config/folio/folio.json)
//! 3. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::gmail::GmailClient;
use crate::models::SortOrder;

/// Config filename in the Folio config directory
const CONFIG_FILE: &str = "folio.json";

/// Credential filename in the Folio config directory
pub const CREDENTIALS_FILE: &str = "gmail-tokens.json";

/// Tunables for paging and detail fetching
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailConfig {
    /// Ids requested per list call
    pub page_size: usize,
    /// Size of the detail worker pool
    pub max_concurrent_fetches: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    pub api_base_url: String,
    /// Order applied to fetched items before they are handed out
    pub sort_order: SortOrder,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_concurrent_fetches: 8,
            request_timeout_secs: 30,
            api_base_url: GmailClient::BASE_URL.to_string(),
            sort_order: SortOrder::Ascending,
        }
    }
}

impl MailConfig {
    /// Load the config file if present, apply environment overrides, validate
    pub fn load() -> Result<Self> {
        let config = match Self::default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.with_env_overrides(|key| std::env::var(key).ok())?.validated()
    }

    /// Load settings from a specific JSON file (no env overrides)
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file::<Self>(path)
            .map_err(|e| Error::InvalidConfig(format!("{e:#}")))?
            .validated()
    }

    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str::<Self>(json)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config JSON: {e}")))?
            .validated()
    }

    /// Apply `FOLIO_*` overrides read through `lookup`
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FOLIO_PAGE_SIZE") {
            self.page_size = parse_number("FOLIO_PAGE_SIZE", &v)?;
        }
        if let Some(v) = lookup("FOLIO_MAX_CONCURRENT_FETCHES") {
            self.max_concurrent_fetches = parse_number("FOLIO_MAX_CONCURRENT_FETCHES", &v)?;
        }
        if let Some(v) = lookup("FOLIO_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("FOLIO_REQUEST_TIMEOUT_SECS", &v)?;
        }
        Ok(self)
    }

    /// Clamp the page size into the API's range and reject unusable values
    pub fn validated(mut self) -> Result<Self> {
        self.page_size = self.page_size.clamp(1, GmailClient::MAX_PAGE_SIZE);

        if self.max_concurrent_fetches == 0 {
            return Err(Error::InvalidConfig(
                "maxConcurrentFetches must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "requestTimeoutSecs must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.api_base_url).map_err(|e| {
            Error::InvalidConfig(format!("apiBaseUrl {:?} is not a URL: {e}", self.api_base_url))
        })?;

        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the default config file path (~/.config/folio/folio.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }

    /// Get the default credential path (~/.config/folio/gmail-tokens.json)
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{key} must be a number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = MailConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.max_concurrent_fetches, 8);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.sort_order, SortOrder::Ascending);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MailConfig::from_json(r#"{ "pageSize": 50, "sortOrder": "descending" }"#)
            .unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.sort_order, SortOrder::Descending);
        assert_eq!(config.max_concurrent_fetches, 8);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config = MailConfig::from_json(r#"{ "pageSize": 10000 }"#).unwrap();
        assert_eq!(config.page_size, 500);
        let config = MailConfig::from_json(r#"{ "pageSize": 0 }"#).unwrap();
        assert_eq!(config.page_size, 1);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = MailConfig::from_json(r#"{ "maxConcurrentFetches": 0 }"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = MailConfig::from_json(r#"{ "apiBaseUrl": "::nope" }"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FOLIO_PAGE_SIZE", "5"),
            ("FOLIO_MAX_CONCURRENT_FETCHES", " 3 "),
        ]
        .into_iter()
        .collect();

        let config = MailConfig::default()
            .with_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.page_size, 5);
        assert_eq!(config.max_concurrent_fetches, 3);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_env_override_must_be_numeric() {
        let result = MailConfig::default().with_env_overrides(|k| {
            (k == "FOLIO_REQUEST_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("folio.json");
        std::fs::write(&path, r#"{ "requestTimeoutSecs": 7 }"#).unwrap();

        let config = MailConfig::from_file(&path).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(7));
    }
}
