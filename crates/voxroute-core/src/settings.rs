//! Router settings read from the environment.

use std::time::Duration;

use url::Url;
use voxroute_models::AgentId;

use crate::error::{ConfigError, Result};

pub const PRIMARY_URL_ENV: &str = "VOXROUTE_PRIMARY_URL";
pub const FALLBACK_URLS_ENV: &str = "VOXROUTE_FALLBACK_URLS";
pub const ATTEMPT_TIMEOUT_ENV: &str = "VOXROUTE_ATTEMPT_TIMEOUT_MS";
pub const EXTERNAL_ENABLED_ENV: &str = "VOXROUTE_EXTERNAL_ENABLED";
pub const AUDIT_BUFFER_ENV: &str = "VOXROUTE_AUDIT_BUFFER";
pub const BREADCRUMB_CAP_ENV: &str = "VOXROUTE_BREADCRUMB_CAP";
pub const DEFAULT_AGENT_ENV: &str = "VOXROUTE_DEFAULT_AGENT";

const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_AUDIT_BUFFER: usize = 256;
const DEFAULT_BREADCRUMB_CAP: usize = 50;
const DEFAULT_AGENT: &str = "alden";

/// Settings for wiring up a routing pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterSettings {
    /// Primary backend; `None` means offline mode.
    pub primary_url: Option<Url>,
    /// Fallback backends in priority order.
    pub fallback_urls: Vec<Url>,
    /// Timeout applied to each backend attempt.
    pub attempt_timeout: Duration,
    /// Whether external agents start enabled.
    pub external_enabled: bool,
    /// Capacity of the local audit buffer.
    pub audit_buffer: usize,
    /// Capacity of the breadcrumb trail.
    pub breadcrumb_cap: usize,
    /// Agent used when nothing else names a target.
    pub default_agent: AgentId,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            primary_url: None,
            fallback_urls: Vec::new(),
            attempt_timeout: Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS),
            external_enabled: false,
            audit_buffer: DEFAULT_AUDIT_BUFFER,
            breadcrumb_cap: DEFAULT_BREADCRUMB_CAP,
            default_agent: AgentId::new(DEFAULT_AGENT),
        }
    }
}

impl RouterSettings {
    /// Reads settings from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary lookup function.
    ///
    /// Unset or empty variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(raw) = get(PRIMARY_URL_ENV) {
            settings.primary_url = Some(parse_backend_url(&raw)?);
        }

        if let Some(raw) = get(FALLBACK_URLS_ENV) {
            settings.fallback_urls = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_backend_url)
                .collect::<Result<Vec<_>>>()?;
        }

        if let Some(raw) = get(ATTEMPT_TIMEOUT_ENV) {
            let ms = parse_number::<u64>(ATTEMPT_TIMEOUT_ENV, &raw)?;
            if ms == 0 {
                return Err(invalid(ATTEMPT_TIMEOUT_ENV, &raw, "must be greater than zero"));
            }
            settings.attempt_timeout = Duration::from_millis(ms);
        }

        if let Some(raw) = get(EXTERNAL_ENABLED_ENV) {
            settings.external_enabled = parse_bool(EXTERNAL_ENABLED_ENV, &raw)?;
        }

        if let Some(raw) = get(AUDIT_BUFFER_ENV) {
            settings.audit_buffer = parse_capacity(AUDIT_BUFFER_ENV, &raw)?;
        }

        if let Some(raw) = get(BREADCRUMB_CAP_ENV) {
            settings.breadcrumb_cap = parse_capacity(BREADCRUMB_CAP_ENV, &raw)?;
        }

        if let Some(raw) = get(DEFAULT_AGENT_ENV) {
            settings.default_agent = AgentId::new(raw);
        }

        Ok(settings)
    }

    /// Returns true when no primary backend is configured.
    pub fn is_offline(&self) -> bool {
        self.primary_url.is_none()
    }
}

/// Parses and validates an http(s) backend URL.
pub fn parse_backend_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| invalid(key, raw, &e.to_string()))
}

fn parse_capacity(key: &str, raw: &str) -> Result<usize> {
    let value = parse_number::<usize>(key, raw)?;
    if value == 0 {
        return Err(invalid(key, raw, "must be greater than zero"));
    }
    Ok(value)
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw, "expected true/false")),
    }
}

fn invalid(key: &str, raw: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
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
        let settings = RouterSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, RouterSettings::default());
        assert!(settings.is_offline());
        assert!(!settings.external_enabled);
        assert_eq!(settings.attempt_timeout, Duration::from_secs(10));
        assert_eq!(settings.breadcrumb_cap, 50);
        assert_eq!(settings.default_agent.as_str(), "alden");
    }

    #[test]
    fn test_full_settings() {
        let settings = RouterSettings::from_lookup(lookup(&[
            (PRIMARY_URL_ENV, "http://localhost:8000/api/agent"),
            (FALLBACK_URLS_ENV, "http://localhost:8001/a, https://backup.example/b ,"),
            (ATTEMPT_TIMEOUT_ENV, "2500"),
            (EXTERNAL_ENABLED_ENV, "on"),
            (AUDIT_BUFFER_ENV, "16"),
            (BREADCRUMB_CAP_ENV, "10"),
            (DEFAULT_AGENT_ENV, "Alice"),
        ]))
        .unwrap();

        assert_eq!(
            settings.primary_url.as_ref().map(|u| u.as_str()),
            Some("http://localhost:8000/api/agent")
        );
        assert_eq!(settings.fallback_urls.len(), 2);
        assert_eq!(settings.attempt_timeout, Duration::from_millis(2500));
        assert!(settings.external_enabled);
        assert_eq!(settings.audit_buffer, 16);
        assert_eq!(settings.breadcrumb_cap, 10);
        assert_eq!(settings.default_agent.as_str(), "alice");
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let err = RouterSettings::from_lookup(lookup(&[(PRIMARY_URL_ENV, "ftp://host/x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = RouterSettings::from_lookup(lookup(&[(ATTEMPT_TIMEOUT_ENV, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_rejects_bad_bool() {
        let err =
            RouterSettings::from_lookup(lookup(&[(EXTERNAL_ENABLED_ENV, "maybe")])).unwrap_err();
        assert!(err.to_string().contains(EXTERNAL_ENABLED_ENV));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let settings =
            RouterSettings::from_lookup(lookup(&[(PRIMARY_URL_ENV, "   "), (AUDIT_BUFFER_ENV, "")]))
                .unwrap();
        assert!(settings.primary_url.is_none());
        assert_eq!(settings.audit_buffer, 256);
    }
}
