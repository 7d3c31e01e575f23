//! RON configuration for the receipt-sorter binary.
//!
//! Every field is optional. A missing default config file means defaults; a
//! missing file named with `--config` is an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use sorter_core::WorkflowSettings;
use sorter_engine::{ClientSettings, ReconnectPolicy};
use sorter_logging::sorter_info;
use url::Url;

use crate::cli::Cli;

pub const DEFAULT_CONFIG_PATH: &str = "./receipt_sorter.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub reconnect_base_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    pub max_reconnect_attempts: u32,
    pub connect_grace_ms: u64,
    pub success_debounce_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            reconnect_base_delay_ms: 1_000,
            reconnect_max_delay_ms: 10_000,
            max_reconnect_attempts: 5,
            connect_grace_ms: 300,
            success_debounce_ms: 500,
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            output_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Reads `explicit`, or the default path when it exists.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self =
            ron::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        sorter_info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Command-line values win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(attempts) = cli.max_reconnect_attempts {
            self.max_reconnect_attempts = attempts;
        }
        if let Some(output) = &cli.output {
            self.output_dir = output.clone();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let base = self.base_url()?;
        ensure!(
            self.max_reconnect_attempts >= 1,
            "max_reconnect_attempts must be at least 1"
        );
        ensure!(
            self.reconnect_base_delay_ms <= self.reconnect_max_delay_ms,
            "reconnect_base_delay_ms ({}) exceeds reconnect_max_delay_ms ({})",
            self.reconnect_base_delay_ms,
            self.reconnect_max_delay_ms
        );
        ensure!(
            self.request_timeout_secs > 0 && self.connect_timeout_secs > 0,
            "timeouts must be positive"
        );
        ensure!(
            base.host_str().is_some(),
            "base_url {} has no host",
            self.base_url
        );
        Ok(())
    }

    pub fn base_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("base_url must use http or https, got {}", url.scheme());
        }
        Ok(url)
    }

    pub fn client_settings(&self) -> anyhow::Result<ClientSettings> {
        let mut settings = ClientSettings::new(self.base_url()?);
        settings.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        settings.request_timeout = Duration::from_secs(self.request_timeout_secs);
        settings.connect_grace = Duration::from_millis(self.connect_grace_ms);
        settings.reconnect = ReconnectPolicy {
            base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
            max_delay: Duration::from_millis(self.reconnect_max_delay_ms),
            max_attempts: self.max_reconnect_attempts,
        };
        Ok(settings)
    }

    pub fn workflow_settings(&self) -> anyhow::Result<WorkflowSettings> {
        let mut settings = WorkflowSettings::new(self.base_url()?);
        settings.success_debounce = Duration::from_millis(self.success_debounce_ms);
        Ok(settings)
    }
}
