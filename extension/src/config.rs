use anyhow::{Context, Result};
use serde::Deserialize;

/// Defaults compiled into the extension bundle.
const EMBEDDED_CONFIG: &str = include_str!("../config.toml");

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExtensionConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub pages: PagesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Hard expiry measured from the last successful password verification.
    #[serde(default = "default_password_session_timeout_ms")]
    pub password_session_timeout_ms: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackgroundConfig {
    #[serde(default = "default_refresh_period_minutes")]
    pub refresh_period_minutes: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PagesConfig {
    #[serde(default = "default_popup_page")]
    pub popup: String,
    #[serde(default = "default_sidepanel_page")]
    pub sidepanel: String,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_password_session_timeout_ms() -> u64 {
    30 * 60 * 1000
}

fn default_tick_interval_ms() -> u32 {
    30_000
}

fn default_refresh_period_minutes() -> u32 {
    5
}

fn default_request_timeout_ms() -> u32 {
    30_000
}

fn default_popup_page() -> String {
    "src/popup/index.html".to_string()
}

fn default_sidepanel_page() -> String {
    "src/sidepanel/index.html".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            password_session_timeout_ms: default_password_session_timeout_ms(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            refresh_period_minutes: default_refresh_period_minutes(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            popup: default_popup_page(),
            sidepanel: default_sidepanel_page(),
        }
    }
}

impl ExtensionConfig {
    /// Parse and validate the defaults shipped with the bundle.
    pub fn embedded() -> Result<Self> {
        let config = Self::from_toml(EMBEDDED_CONFIG).context("Failed to parse embedded config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if self.session.tick_interval_ms == 0 {
            anyhow::bail!("session.tick_interval_ms must be positive");
        }
        if self.background.refresh_period_minutes == 0 {
            anyhow::bail!("background.refresh_period_minutes must be positive");
        }
        if self.provider.request_timeout_ms == 0 {
            anyhow::bail!("provider.request_timeout_ms must be positive");
        }
        Ok(())
    }
}
