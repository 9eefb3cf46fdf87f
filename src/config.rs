use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ai::DEFAULT_MODEL;
use crate::selectors::SelectorSet;
use crate::session::SessionOptions;

pub const DEFAULT_HIRING_API: &str = "https://prompthire.org/api";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub anchor_selector: String,
    pub anchor_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub settle_delay_ms: u64,
    pub enrichment_timeout_ms: u64,
    pub model: String,
    pub enrich: bool,
    pub hiring_api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hiring_token: Option<String>,
    pub selectors: SelectorSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anchor_selector: "h1".to_string(),
            anchor_timeout_ms: 3000,
            poll_interval_ms: 250,
            settle_delay_ms: 2000,
            enrichment_timeout_ms: 20_000,
            model: DEFAULT_MODEL.to_string(),
            enrich: true,
            hiring_api_base: DEFAULT_HIRING_API.to_string(),
            hiring_token: None,
            selectors: SelectorSet::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "profile-scout")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the config file from the platform config dir (or defaults when
    /// there is none) and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.selectors = config.selectors.fill_gaps();
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = set("PROMPTHIRE_API_BASE") {
            self.hiring_api_base = base;
        }
        if let Some(token) = set("PROMPTHIRE_TOKEN") {
            self.hiring_token = Some(token);
        }
        if let Some(model) = set("PROFILE_SCOUT_MODEL") {
            self.model = model;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.anchor_selector.trim().is_empty() {
            bail!("anchor_selector must not be empty");
        }
        for (name, value) in [
            ("anchor_timeout_ms", self.anchor_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("enrichment_timeout_ms", self.enrichment_timeout_ms),
        ] {
            if value == 0 {
                bail!("{name} must be greater than zero");
            }
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            anchor_selector: self.anchor_selector.clone(),
            anchor_timeout: Duration::from_millis(self.anchor_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            enrichment_timeout: Duration::from_millis(self.enrichment_timeout_ms),
        }
    }
}
