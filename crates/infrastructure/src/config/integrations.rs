//! External service configurations: weather provider and SMTP email.

use integration_weather::WeatherApiConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ==============================
// Weather Provider Configuration
// ==============================

/// weatherapi.com connection settings
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct ProviderConfig {
    /// API base URL
    #[serde(default = "default_provider_base_url")]
    #[validate(url)]
    pub base_url: String,

    /// API key (sensitive - uses `SecretString`)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_provider_timeout")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,

    /// Forecast window requested by scheduled refreshes (1-10)
    #[serde(default = "default_forecast_days")]
    #[validate(range(min = 1, max = 10))]
    pub forecast_days: u8,
}

fn default_provider_base_url() -> String {
    "http://api.weatherapi.com/v1".to_string()
}

const fn default_provider_timeout() -> u64 {
    30
}

const fn default_forecast_days() -> u8 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            api_key: None,
            timeout_secs: default_provider_timeout(),
            forecast_days: default_forecast_days(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("forecast_days", &self.forecast_days)
            .finish()
    }
}

impl ProviderConfig {
    /// Whether a non-blank API key is configured
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty())
    }

    /// Convert to `integration_weather`'s `WeatherApiConfig`
    #[must_use]
    pub fn to_client_config(&self) -> WeatherApiConfig {
        WeatherApiConfig {
            base_url: self.base_url.clone(),
            api_key: self
                .api_key
                .as_ref()
                .map(|key| key.expose_secret().to_string())
                .unwrap_or_default(),
            timeout_secs: self.timeout_secs,
        }
    }
}

// ==============================
// Email Configuration
// ==============================

/// SMTP settings for alert emails
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct EmailConfig {
    /// Send alert emails (default: false)
    #[serde(default)]
    pub enabled: bool,

    /// SMTP relay host
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP port (STARTTLS)
    #[serde(default = "default_smtp_port")]
    #[validate(range(min = 1))]
    pub smtp_port: u16,

    /// SMTP username
    #[serde(default)]
    pub username: String,

    /// SMTP password (sensitive - uses `SecretString`)
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,

    /// Sender address; falls back to the username
    #[serde(default)]
    pub from: Option<String>,

    /// Recipient address
    #[serde(default)]
    pub to: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: None,
            from: None,
            to: String::new(),
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl EmailConfig {
    /// Enabled and carrying everything needed to send
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.enabled
            && !self.smtp_host.trim().is_empty()
            && !self.username.trim().is_empty()
            && !self.to.trim().is_empty()
            && self
                .password
                .as_ref()
                .is_some_and(|p| !p.expose_secret().is_empty())
    }

    /// Sender address used in the `From` header
    #[must_use]
    pub fn sender(&self) -> &str {
        self.from
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(&self.username)
    }
}
