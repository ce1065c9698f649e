//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use chrono::FixedOffset;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::api::{ApiSettings, DEFAULT_PAGE_SIZE};
use crate::auth::AuthSettings;

/// Default token endpoint.
pub const DEFAULT_AUTH_URL: &str =
    "https://auth.contabo.com/auth/realms/contabo/protocol/openid-connect/token";

/// Default compute API base.
pub const DEFAULT_API_BASE_URL: &str = "https://api.contabo.com";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Largest page size accepted by the inventory endpoint.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Settings derived from defaults, configuration files and environment
/// variables prefixed with `CONTABO_`.
#[derive(Clone, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "CONTABO",
    discovery(
        app_name = "snapwarden",
        env_var = "SNAPWARDEN_CONFIG_PATH",
        config_file_name = "snapwarden.toml",
        dotfile_name = ".snapwarden.toml",
        project_file_name = "snapwarden.toml"
    )
)]
pub struct SnapwardenConfig {
    /// OAuth client identifier issued with the API credentials.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// API user (usually the account e-mail address).
    pub api_user: String,
    /// API password.
    pub api_password: String,
    /// Token endpoint.
    #[ortho_config(default = DEFAULT_AUTH_URL.to_owned())]
    pub auth_url: String,
    /// Compute API base URL.
    #[ortho_config(default = DEFAULT_API_BASE_URL.to_owned())]
    pub api_base_url: String,
    /// Timezone used to render snapshot names: `UTC`, `Z`, `+HH:MM` or
    /// `-HHMM`.
    #[ortho_config(default = "UTC".to_owned())]
    pub timezone: String,
    /// Instances requested per inventory page.
    #[ortho_config(default = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
    /// Timeout applied to every HTTP request, in seconds.
    #[ortho_config(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
    /// Optional webhook receiving the run summary as JSON.
    pub webhook_url: Option<String>,
    /// Log output format: `text` or `json`.
    #[ortho_config(default = "text".to_owned())]
    pub log_format: String,
}

impl std::fmt::Debug for SnapwardenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapwardenConfig")
            .field("client_id", &self.client_id)
            .field("api_user", &self.api_user)
            .field("auth_url", &self.auth_url)
            .field("api_base_url", &self.api_base_url)
            .field("timezone", &self.timezone)
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("webhook_url", &self.webhook_url)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

/// Output format for log lines.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl SnapwardenConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to snapwarden.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("snapwarden")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and configuration key that supply each value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for empty required values and
    /// [`ConfigError::Invalid`] for out-of-range ones.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (
                self.client_id.as_str(),
                FieldMetadata::new("API client id", "CONTABO_CLIENT_ID", "client_id"),
            ),
            (
                self.client_secret.as_str(),
                FieldMetadata::new("API client secret", "CONTABO_CLIENT_SECRET", "client_secret"),
            ),
            (
                self.api_user.as_str(),
                FieldMetadata::new("API user", "CONTABO_API_USER", "api_user"),
            ),
            (
                self.api_password.as_str(),
                FieldMetadata::new("API password", "CONTABO_API_PASSWORD", "api_password"),
            ),
            (
                self.auth_url.as_str(),
                FieldMetadata::new("token endpoint", "CONTABO_AUTH_URL", "auth_url"),
            ),
            (
                self.api_base_url.as_str(),
                FieldMetadata::new("API base URL", "CONTABO_API_BASE_URL", "api_base_url"),
            ),
        ];
        for (value, metadata) in &required {
            Self::require_field(value, metadata)?;
        }

        for (field, url) in [("auth_url", &self.auth_url), ("api_base_url", &self.api_base_url)] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::Invalid {
                    field: field.to_owned(),
                    message: format!("expected an http(s) URL, got {url}"),
                });
            }
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid {
                field: String::from("page_size"),
                message: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: String::from("request_timeout_secs"),
                message: String::from("must be greater than zero"),
            });
        }
        if self
            .webhook_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                field: String::from("webhook_url"),
                message: String::from("must not be blank when set"),
            });
        }
        self.timezone()?;
        self.log_format()?;
        Ok(())
    }

    /// Parses [`Self::timezone`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the value is not a recognised
    /// offset.
    pub fn timezone(&self) -> Result<FixedOffset, ConfigError> {
        parse_timezone(&self.timezone)
    }

    /// Parses [`Self::log_format`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for anything other than `text` or
    /// `json`.
    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        match self.log_format.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid {
                field: String::from("log_format"),
                message: format!("expected text or json, got {other}"),
            }),
        }
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Builds the token endpoint settings.
    #[must_use]
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            auth_url: self.auth_url.trim().to_owned(),
            client_id: self.client_id.trim().to_owned(),
            client_secret: self.client_secret.clone(),
            username: self.api_user.trim().to_owned(),
            password: self.api_password.clone(),
        }
    }

    /// Builds the compute API settings.
    #[must_use]
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings::new(self.api_base_url.trim(), self.page_size)
    }
}

/// Parses `UTC`, `Z`, `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH` into an offset.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for any other value or an offset outside
/// ±23:59.
pub fn parse_timezone(value: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::Invalid {
        field: String::from("timezone"),
        message: format!("expected UTC or an offset such as +02:00, got {value}"),
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let mut chars = trimmed.chars();
    let sign = match chars.next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Err(invalid()),
    };
    let digits: String = chars.filter(|ch| *ch != ':').collect();
    if !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.as_str(), "00"),
        4 => digits.split_at(2),
        _ => return Err(invalid()),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds an unusable value.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Name of the offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}
