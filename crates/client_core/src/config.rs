use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "blog.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub per_page: u32,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".into(),
            per_page: 6,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    per_page: Option<u32>,
    request_timeout_secs: Option<u64>,
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let raw = self.api_base_url.trim();
        let url = Url::parse(raw).map_err(|err| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: raw.to_string(),
                reason: "expected an http(s) url".into(),
            });
        }
        Ok(url)
    }

    fn apply_file(&mut self, raw: &str) {
        let file_cfg = match toml::from_str::<FileSettings>(raw) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(error = %err, "ignoring malformed settings file");
                return;
            }
        };
        if let Some(v) = file_cfg.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file_cfg.per_page {
            self.set_per_page(v);
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = v;
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("BLOG_API_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("APP__API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("APP__PER_PAGE") {
            match v.trim().parse::<u32>() {
                Ok(parsed) => self.set_per_page(parsed),
                Err(_) => warn!(value = %v, "ignoring unparseable APP__PER_PAGE"),
            }
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            match v.trim().parse::<u64>() {
                Ok(parsed) => self.request_timeout_secs = parsed,
                Err(_) => warn!(value = %v, "ignoring unparseable APP__REQUEST_TIMEOUT_SECS"),
            }
        }
    }

    pub fn set_per_page(&mut self, per_page: u32) {
        if per_page == 0 {
            warn!("per_page must be positive; keeping {}", self.per_page);
            return;
        }
        self.per_page = per_page;
    }
}

/// Defaults, then `path` (or `blog.toml`), then environment.
pub fn load_settings(path: Option<&Path>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        settings.apply_file(&raw);
    }

    settings.apply_env(|key| std::env::var(key).ok());
    settings
}
