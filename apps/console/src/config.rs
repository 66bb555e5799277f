use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use client_core::StoreOptions;
use serde::Deserialize;
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "console.toml";
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub log_filter: String,
    pub request_timeout_secs: Option<u64>,
    pub reload_after_failed_mutation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            log_filter: "info".into(),
            request_timeout_secs: None,
            reload_after_failed_mutation: false,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            reload_after_failed_mutation: self.reload_after_failed_mutation,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    log_filter: Option<String>,
    request_timeout_secs: Option<u64>,
    reload_after_failed_mutation: Option<bool>,
}

/// Defaults, then the TOML file, then environment. An explicit config path
/// must exist; the default `console.toml` is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let raw = match config_path {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?,
        ),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    if let Some(raw) = raw {
        apply_file(&mut settings, &raw)?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.server_url = normalize_server_url(&settings.server_url)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw).context("failed to parse config file")?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = file_cfg.reload_after_failed_mutation {
        settings.reload_after_failed_mutation = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DEVCO_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = lookup("APP__RELOAD_AFTER_FAILED_MUTATION") {
        match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => settings.reload_after_failed_mutation = true,
            "0" | "false" | "no" => settings.reload_after_failed_mutation = false,
            _ => {}
        }
    }
}

pub fn normalize_server_url(raw_server_url: &str) -> anyhow::Result<String> {
    let raw_server_url = raw_server_url.trim();
    if raw_server_url.is_empty() {
        return Ok(DEFAULT_SERVER_URL.to_string());
    }

    let candidate = if raw_server_url.contains("://") {
        raw_server_url.to_string()
    } else {
        format!("http://{raw_server_url}")
    };
    // Bare `:port` listen addresses mean the local host.
    let candidate = if candidate.starts_with("http://:") {
        candidate.replacen("http://:", "http://127.0.0.1:", 1)
    } else {
        candidate
    };

    let parsed = Url::parse(&candidate)
        .with_context(|| format!("invalid server url '{raw_server_url}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "unsupported server url scheme '{}' in '{raw_server_url}'",
            parsed.scheme()
        );
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
