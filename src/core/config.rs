use super::conversion::ConversionState;
use super::currency::Currency;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GeminiProviderConfig {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_gemini_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GeminiProviderConfig {
    fn default() -> Self {
        GeminiProviderConfig {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeminiProviderConfig {
    /// Picks the configured key, else the first non-empty key from `lookup`.
    pub fn resolve_api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        API_KEY_ENV_VARS
            .iter()
            .find_map(|var| lookup(var).filter(|k| !k.trim().is_empty()))
            .with_context(|| {
                format!(
                    "No Gemini API key configured. Set providers.gemini.api_key or one of: {}",
                    API_KEY_ENV_VARS.join(", ")
                )
            })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: GeminiProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub source: Currency,
    pub target: Currency,
    pub amount: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            source: Currency::BTC,
            target: Currency::USD,
            amount: "1".to_string(),
        }
    }
}

impl DefaultsConfig {
    pub fn initial_state(&self) -> Result<ConversionState> {
        ConversionState::new(self.source, self.target, &self.amount)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "coinconv", "coinconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.defaults.source == self.defaults.target {
            bail!(
                "Default source and target currency must differ, both are {}",
                self.defaults.source
            );
        }
        Ok(())
    }
}
