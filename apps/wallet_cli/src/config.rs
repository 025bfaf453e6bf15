use std::{fs, io::ErrorKind, path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use session_core::{HttpWalletGateway, MissingWalletGateway, WalletGateway};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the command backend; `None` runs against the missing gateway.
    pub backend_url: Option<String>,
    pub request_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: None,
            request_timeout_secs: 30,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

/// Defaults, then the TOML file at `path` (if present), then environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> Result<(), toml::de::Error> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = non_blank(v);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("WALLET_BACKEND_URL") {
        settings.backend_url = non_blank(v);
    }
    if let Some(v) = lookup("APP__BACKEND_URL") {
        settings.backend_url = non_blank(v);
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Settings {
    pub fn with_backend_override(mut self, backend_url: Option<String>) -> Self {
        if let Some(url) = backend_url {
            self.backend_url = non_blank(url);
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn gateway(&self) -> anyhow::Result<Arc<dyn WalletGateway>> {
        let Some(url) = &self.backend_url else {
            warn!("no backend_url configured; every wallet operation will be rejected");
            return Ok(Arc::new(MissingWalletGateway));
        };

        let gateway = HttpWalletGateway::new(url, self.request_timeout())
            .with_context(|| format!("invalid backend_url '{url}'"))?;
        info!(backend = %gateway.base_url(), "using http wallet backend");
        Ok(Arc::new(gateway))
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
