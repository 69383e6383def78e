//! Client configuration.
//!
//! # Design
//! Configuration is an explicit value handed to the client constructor. The
//! base URL is resolved once from an [`Environment`] at startup; nothing in
//! the client reads global state afterwards.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

const ANDROID_DEV_URL: &str = "http://10.0.2.2:5000/api";
const IOS_DEV_URL: &str = "http://localhost:5000/api";
const PRODUCTION_URL: &str = "https://api.medtrack.app/api";

/// Mobile platform the client runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
}

/// Build environment that selects the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development(Platform),
    Production,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            // The Android emulator reaches the host loopback through 10.0.2.2.
            Environment::Development(Platform::Android) => ANDROID_DEV_URL,
            Environment::Development(Platform::Ios) => IOS_DEV_URL,
            Environment::Production => PRODUCTION_URL,
        }
    }
}

/// Which failures the retry loop re-attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryScope {
    /// Every failure, including HTTP status and parse errors.
    #[default]
    AllFailures,
    /// Only connectivity, timeout and other transport errors.
    TransportOnly,
}

/// Fixed-delay retry policy: `max_retries` additional attempts after the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    pub scope: RetryScope,
}

impl RetryPolicy {
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
            scope: RetryScope::AllFailures,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Everything the client needs for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Extra headers merged over the JSON defaults.
    pub headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            headers: Vec::new(),
        }
    }

    pub fn for_environment(env: Environment) -> Self {
        Self::new(env.base_url())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Load from `MEDTRACK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset keys fall back to defaults;
    /// set-but-invalid keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let platform = match lookup("MEDTRACK_PLATFORM") {
            None => Platform::Android,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "android" => Platform::Android,
                "ios" => Platform::Ios,
                _ => return Err(invalid("MEDTRACK_PLATFORM", v, "expected android or ios")),
            },
        };
        let env = match lookup("MEDTRACK_ENV") {
            None => Environment::Development(platform),
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "development" | "dev" => Environment::Development(platform),
                "production" | "prod" => Environment::Production,
                _ => {
                    return Err(invalid(
                        "MEDTRACK_ENV",
                        v,
                        "expected development or production",
                    ))
                }
            },
        };

        let mut config = Self::for_environment(env);
        if let Some(url) = lookup("MEDTRACK_BASE_URL") {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid("MEDTRACK_BASE_URL", url, "expected an http(s) URL"));
            }
            config.base_url = url;
        }
        if let Some(ms) = lookup("MEDTRACK_TIMEOUT_MS") {
            let ms = parse_u64("MEDTRACK_TIMEOUT_MS", ms)?;
            if ms == 0 {
                return Err(invalid("MEDTRACK_TIMEOUT_MS", "0".into(), "must be positive"));
            }
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(n) = lookup("MEDTRACK_RETRIES") {
            config.retry.max_retries = n
                .trim()
                .parse()
                .map_err(|_| invalid("MEDTRACK_RETRIES", n, "expected a non-negative integer"))?;
        }
        if let Some(ms) = lookup("MEDTRACK_RETRY_DELAY_MS") {
            config.retry.delay = Duration::from_millis(parse_u64("MEDTRACK_RETRY_DELAY_MS", ms)?);
        }
        Ok(config)
    }
}

fn parse_u64(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(var, value, "expected milliseconds as an integer"))
}

fn invalid(var: &'static str, value: String, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue { var, value, reason }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_to_android_development() {
        let config = load(&[]).unwrap();
        assert_eq!(config.base_url, "http://10.0.2.2:5000/api");
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.delay, Duration::from_millis(500));
        assert_eq!(config.retry.total_attempts(), 3);
    }

    #[test]
    fn ios_development_uses_localhost() {
        let config = load(&[("MEDTRACK_PLATFORM", "ios")]).unwrap();
        assert_eq!(config.base_url, "http://localhost:5000/api");
    }

    #[test]
    fn production_ignores_platform() {
        let config = load(&[("MEDTRACK_ENV", "production"), ("MEDTRACK_PLATFORM", "ios")]).unwrap();
        assert_eq!(config.base_url, Environment::Production.base_url());
    }

    #[test]
    fn overrides_apply() {
        let config = load(&[
            ("MEDTRACK_BASE_URL", "http://127.0.0.1:3000"),
            ("MEDTRACK_TIMEOUT_MS", "250"),
            ("MEDTRACK_RETRIES", "0"),
            ("MEDTRACK_RETRY_DELAY_MS", "10"),
        ])
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.retry.total_attempts(), 1);
        assert_eq!(config.retry.delay, Duration::from_millis(10));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load(&[("MEDTRACK_ENV", "staging")]),
            Err(ConfigError::InvalidValue { var: "MEDTRACK_ENV", .. })
        ));
        assert!(load(&[("MEDTRACK_TIMEOUT_MS", "soon")]).is_err());
        assert!(load(&[("MEDTRACK_TIMEOUT_MS", "0")]).is_err());
        assert!(load(&[("MEDTRACK_RETRIES", "-1")]).is_err());
        assert!(load(&[("MEDTRACK_BASE_URL", "ftp://x")]).is_err());
    }
}
