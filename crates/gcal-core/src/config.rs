use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Google Calendar REST endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// RFC 3339 without fractional seconds, e.g. `2024-06-01T10:00:00+02:00`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

pub const DEFAULT_TIME_ZONE: &str = "Europe/Amsterdam";

/// Environment variable that overrides `calendar.access_token`.
pub const ACCESS_TOKEN_ENV: &str = "GCAL_ACCESS_TOKEN";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Calendar service settings
    #[serde(default)]
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Base URL of the Calendar REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// IANA time zone attached to every start/end sent to the service
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// strftime pattern used for precise instants and listing bounds.
    /// Must render RFC 3339.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Calendar used when a caller does not name one
    #[serde(default = "default_calendar_id")]
    pub default_calendar_id: String,

    /// OAuth access token. Obtained outside gcal; never written back to disk.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            time_zone: default_time_zone(),
            timestamp_format: default_timestamp_format(),
            default_calendar_id: default_calendar_id(),
            access_token: None,
        }
    }
}

/// Check that `format` is a strftime pattern whose output is RFC 3339 and
/// parses back to the instant it was rendered from.
pub fn check_timestamp_format(format: &str) -> Result<(), String> {
    if format.trim().is_empty() {
        return Err("timestamp format is empty".to_string());
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("unsupported strftime pattern: {format}"));
    }

    for sample in timestamp_samples()? {
        let mut rendered = String::new();
        write!(rendered, "{}", sample.format(format))
            .map_err(|_| format!("pattern cannot be rendered: {format}"))?;

        match DateTime::parse_from_rfc3339(&rendered) {
            Ok(parsed) if parsed == sample && parsed.offset() == sample.offset() => {}
            Ok(_) => {
                return Err(format!(
                    "pattern does not preserve the instant, rendered {rendered:?} for {sample}"
                ));
            }
            Err(e) => return Err(format!("rendered {rendered:?} is not RFC 3339: {e}")),
        }
    }

    Ok(())
}

/// Instants that differ in every field, including the offset.
fn timestamp_samples() -> Result<[DateTime<FixedOffset>; 2], String> {
    let sample = |offset_secs: i32, (y, mo, d): (i32, u32, u32), (h, mi, s): (u32, u32, u32)| {
        FixedOffset::east_opt(offset_secs)
            .and_then(|offset| offset.with_ymd_and_hms(y, mo, d, h, mi, s).single())
            .ok_or_else(|| "invalid sample instant".to_string())
    };

    Ok([
        sample(2 * 3600, (2024, 6, 1), (10, 30, 45))?,
        sample(-(5 * 3600 + 30 * 60), (1987, 11, 23), (23, 59, 58))?,
    ])
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if
    /// the file does not exist yet. The access token env var always wins.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context("Failed to read config file")?;

            toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::ParseError(e.to_string()))
                .context("Failed to parse config file")?
        } else {
            tracing::info!("No config at {}, writing defaults", config_path.display());
            let config = Self::default();
            config.save_to(config_path)?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.trim().is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.calendar.access_token = Some(token);
            }
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let calendar = &self.calendar;

        self.validate_url(&calendar.api_base_url, "calendar.api_base_url", &mut result);

        if calendar.time_zone.parse::<chrono_tz::Tz>().is_err() {
            result.add_error(
                "calendar.time_zone",
                format!("Unknown IANA time zone: {}", calendar.time_zone),
            );
        }

        if let Err(message) = check_timestamp_format(&calendar.timestamp_format) {
            result.add_error("calendar.timestamp_format", message);
        }

        if calendar.default_calendar_id.trim().is_empty() {
            result.add_error("calendar.default_calendar_id", "Calendar id cannot be empty");
        }

        match calendar.access_token.as_deref() {
            None => result.add_warning(
                "calendar.access_token",
                format!("No access token configured; set {ACCESS_TOKEN_ENV}"),
            ),
            Some(token) if token.trim().is_empty() => {
                result.add_warning("calendar.access_token", "Access token is blank")
            }
            Some(_) => {}
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Write configuration to `config_path`, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("platform config directory".to_string()))?
            .join("gcal");

        Ok(config_dir.join("config.toml"))
    }
}
