use std::{fs, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub poll_interval: Duration,
    /// How long a success notice stays visible.
    pub notice_ttl: Duration,
    /// `None` waits on a hung connection indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            notice_ttl: DEFAULT_NOTICE_TTL,
            request_timeout: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    poll_interval_ms: Option<u64>,
    notice_ttl_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
}

impl ClientSettings {
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// Base URL without a trailing slash; endpoint paths are appended to it.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = Url::parse(&self.api_base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.api_base_url.clone(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("poll interval"));
        }
        if self.notice_ttl.is_zero() {
            return Err(ConfigError::ZeroDuration("notice ttl"));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroDuration("request timeout"));
        }
        Ok(())
    }
}

/// Defaults, then `client.toml` in the working directory, then environment.
pub fn load_client_settings() -> ClientSettings {
    let file_cfg = fs::read_to_string("client.toml")
        .ok()
        .and_then(|raw| toml::from_str::<FileSettings>(&raw).ok())
        .unwrap_or_default();
    settings_from_sources(file_cfg, |key| std::env::var(key).ok())
}

fn settings_from_sources(
    file_cfg: FileSettings,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(ms) = file_cfg.poll_interval_ms {
        settings.poll_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = file_cfg.notice_ttl_ms {
        settings.notice_ttl = Duration::from_millis(ms);
    }
    if let Some(ms) = file_cfg.request_timeout_ms {
        settings.request_timeout = Some(Duration::from_millis(ms));
    }

    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(ms) = env_millis(&env, "APP__POLL_INTERVAL_MS") {
        settings.poll_interval = ms;
    }
    if let Some(ms) = env_millis(&env, "APP__NOTICE_TTL_MS") {
        settings.notice_ttl = ms;
    }
    if let Some(ms) = env_millis(&env, "APP__REQUEST_TIMEOUT_MS") {
        settings.request_timeout = Some(ms);
    }

    settings
}

fn env_millis(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    env(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}
