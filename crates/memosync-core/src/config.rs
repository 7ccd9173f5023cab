//! Configuration module for memosync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::domain::{ApiVersion, DomainError};

/// Environment variable that overrides `memos.api_token`.
pub const API_TOKEN_ENV: &str = "MEMOSYNC_API_TOKEN";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for memosync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub memos: MemosConfig,
    pub daily_notes: DailyNotesConfig,
    pub logging: LoggingConfig,
}

/// Remote Memos server settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemosConfig {
    /// Which API generation the server speaks.
    pub api_version: ApiVersion,
    /// Base endpoint, e.g. `http://localhost:5230`.
    pub api_url: String,
    /// Bearer access token.
    pub api_token: String,
    /// Memos requested per page.
    pub page_size: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for MemosConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemosConfig")
            .field("api_version", &self.api_version)
            .field("api_url", &self.api_url)
            .field("api_token", &"[REDACTED]")
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Local daily notes settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyNotesConfig {
    /// Root directory of the notes vault.
    pub vault: PathBuf,
    /// Folder (relative to the vault) holding daily notes.
    pub folder: String,
    /// chrono strftime pattern for the daily note file stem.
    pub format: String,
    /// Heading under which memos are inserted.
    pub header: String,
    /// Folder (relative to the vault) for downloaded attachments.
    pub attachment_folder: String,
    /// `None` for the system timezone, otherwise `UTC` or an offset like `+08:00`.
    pub timezone: Option<String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    ///
    /// The `MEMOSYNC_API_TOKEN` environment variable, when set and non-empty,
    /// replaces `memos.api_token`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|_| {
            let mut config = Self::default();
            config.apply_env_overrides();
            config
        })
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/memosync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("memosync")
            .join("config.yaml")
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.memos.api_token = token.trim().to_string();
            }
        }
    }
}

impl MemosConfig {
    /// API URL without trailing slashes.
    pub fn normalized_api_url(&self) -> &str {
        self.api_url.trim().trim_end_matches('/')
    }
}

impl DailyNotesConfig {
    /// Vault root with a leading `~` expanded to the home directory.
    pub fn vault_path(&self) -> PathBuf {
        let raw = self.vault.to_string_lossy();
        if let Some(rest) = raw.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        } else if raw == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
        self.vault.clone()
    }

    /// Parsed fixed offset, or `None` for the system timezone.
    pub fn utc_offset(&self) -> Result<Option<FixedOffset>, DomainError> {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("") | Some("local") => Ok(None),
            Some(tz) => parse_utc_offset(tz).map(Some),
        }
    }
}

/// Parse `UTC`, `Z`, `+08:00`, `-0530` or `+8` into a [`FixedOffset`].
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, DomainError> {
    let invalid = || DomainError::ValidationFailed(format!("invalid timezone offset: {raw}"));
    let value = raw.trim();
    if value.eq_ignore_ascii_case("utc") || value == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match value.chars().next() {
        Some('+') => (1, &value[1..]),
        Some('-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().map_err(|_| invalid())?, 0),
        4 => (
            digits[..2].parse::<i32>().map_err(|_| invalid())?,
            digits[2..].parse::<i32>().map_err(|_| invalid())?,
        ),
        _ => return Err(invalid()),
    };
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn is_valid_strftime(pattern: &str) -> bool {
    !pattern.is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for MemosConfig {
    fn default() -> Self {
        Self {
            api_version: ApiVersion::V0191,
            api_url: "https://usememos.com".to_string(),
            api_token: String::new(),
            page_size: 50,
            timeout_secs: 30,
        }
    }
}

impl Default for DailyNotesConfig {
    fn default() -> Self {
        Self {
            vault: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Notes"),
            folder: String::new(),
            format: "%Y-%m-%d".to_string(),
            header: "Memos".to_string(),
            attachment_folder: "Attachments".to_string(),
            timezone: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"memos.api_url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest page size accepted by every supported server generation.
const MAX_PAGE_SIZE: u32 = 1000;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- memos ---
        let url = self.memos.normalized_api_url();
        if url.is_empty() {
            errors.push(ValidationError {
                field: "memos.api_url".into(),
                message: "must not be empty".into(),
            });
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "memos.api_url".into(),
                message: format!("must include http:// or https://, got '{url}'"),
            });
        }
        if self.memos.api_token.trim().is_empty() {
            errors.push(ValidationError {
                field: "memos.api_token".into(),
                message: format!("must not be empty (or set {API_TOKEN_ENV})"),
            });
        }
        if self.memos.page_size == 0 || self.memos.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "memos.page_size".into(),
                message: format!("must be in range 1..={MAX_PAGE_SIZE}"),
            });
        }
        if self.memos.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "memos.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- daily_notes ---
        if self.daily_notes.header.trim().trim_start_matches('#').trim().is_empty() {
            errors.push(ValidationError {
                field: "daily_notes.header".into(),
                message: "must not be empty".into(),
            });
        }
        if !is_valid_strftime(&self.daily_notes.format) {
            errors.push(ValidationError {
                field: "daily_notes.format".into(),
                message: format!("invalid date pattern '{}'", self.daily_notes.format),
            });
        }
        if self.daily_notes.attachment_folder.trim().is_empty() {
            errors.push(ValidationError {
                field: "daily_notes.attachment_folder".into(),
                message: "must not be empty".into(),
            });
        }
        if let Err(e) = self.daily_notes.utc_offset() {
            errors.push(ValidationError {
                field: "daily_notes.timezone".into(),
                message: e.to_string(),
            });
        }

        // Check the vault only when it does not start with `~` (expanded at runtime).
        let vault_str = self.daily_notes.vault.to_string_lossy();
        if !vault_str.starts_with('~') && !self.daily_notes.vault.exists() {
            errors.push(ValidationError {
                field: "daily_notes.vault".into(),
                message: format!(
                    "directory does not exist: {}",
                    self.daily_notes.vault.display()
                ),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use memosync_core::config::ConfigBuilder;
/// use memosync_core::domain::ApiVersion;
///
/// let config = ConfigBuilder::new()
///     .api_version(ApiVersion::V0220)
///     .api_url("http://localhost:5230")
///     .api_token("secret")
///     .header("Journal")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- memos ---

    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.config.memos.api_version = version;
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.memos.api_url = url.into();
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.memos.api_token = token.into();
        self
    }

    pub fn page_size(mut self, n: u32) -> Self {
        self.config.memos.page_size = n;
        self
    }

    pub fn timeout_secs(mut self, seconds: u64) -> Self {
        self.config.memos.timeout_secs = seconds;
        self
    }

    // --- daily_notes ---

    pub fn vault(mut self, vault: PathBuf) -> Self {
        self.config.daily_notes.vault = vault;
        self
    }

    pub fn daily_folder(mut self, folder: impl Into<String>) -> Self {
        self.config.daily_notes.folder = folder.into();
        self
    }

    pub fn daily_format(mut self, format: impl Into<String>) -> Self {
        self.config.daily_notes.format = format.into();
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.config.daily_notes.header = header.into();
        self
    }

    pub fn attachment_folder(mut self, folder: impl Into<String>) -> Self {
        self.config.daily_notes.attachment_folder = folder.into();
        self
    }

    pub fn timezone(mut self, tz: impl Into<String>) -> Self {
        self.config.daily_notes.timezone = Some(tz.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
