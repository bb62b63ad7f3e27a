use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::protocol::{DOWNLOAD_ROUTE, PROCESS_ROUTE};
use tracing::warn;

pub const SETTINGS_FILE: &str = "uploader.toml";
pub const LOCAL_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_DEPLOYED_BASE_URL: &str = "https://image-processor.example.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Host the client considers itself served from; decides local vs deployed endpoint.
    pub origin_host: String,
    pub local_base_url: String,
    pub deployed_base_url: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            origin_host: "localhost".into(),
            local_base_url: LOCAL_BASE_URL.into(),
            deployed_base_url: DEFAULT_DEPLOYED_BASE_URL.into(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    origin_host: Option<String>,
    local_base_url: Option<String>,
    deployed_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

pub fn load_settings() -> Settings {
    let mut settings = load_settings_from(Path::new(SETTINGS_FILE));
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file_overrides(&mut settings, &raw);
    }
    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!("ignoring malformed {SETTINGS_FILE}: {err}");
            return;
        }
    };

    if let Some(v) = file_cfg.origin_host {
        settings.origin_host = v;
    }
    if let Some(v) = file_cfg.local_base_url {
        settings.local_base_url = v;
    }
    if let Some(v) = file_cfg.deployed_base_url {
        settings.deployed_base_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("APP__ORIGIN_HOST") {
        settings.origin_host = v;
    }
    if let Some(v) = lookup("APP__LOCAL_BASE_URL") {
        settings.local_base_url = v;
    }
    if let Some(v) = lookup("APP__DEPLOYED_BASE_URL") {
        settings.deployed_base_url = v;
    }
    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = Some(parsed),
            Err(_) => warn!("ignoring non-numeric APP__REQUEST_TIMEOUT_SECS={v}"),
        }
    }
}

pub fn is_local_host(host: &str) -> bool {
    matches!(host.trim(), "localhost" | "127.0.0.1")
}

pub fn resolve_base_url<'a>(origin_host: &str, local: &'a str, deployed: &'a str) -> &'a str {
    if is_local_host(origin_host) {
        local
    } else {
        deployed
    }
}

/// Explicit runtime configuration handed to the client and controller at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
    request_timeout: Option<Duration>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            request_timeout: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let base_url = resolve_base_url(
            &settings.origin_host,
            &settings.local_base_url,
            &settings.deployed_base_url,
        );
        let config = Self::new(base_url);
        match settings.request_timeout_secs {
            Some(secs) if secs > 0 => config.with_request_timeout(Duration::from_secs(secs)),
            _ => config,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn process_url(&self) -> String {
        format!("{}{PROCESS_ROUTE}", self.base_url)
    }

    /// The output path is used as returned by the server, without re-encoding.
    pub fn download_url(&self, output_path: &str) -> String {
        format!("{}{DOWNLOAD_ROUTE}/{output_path}", self.base_url)
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
