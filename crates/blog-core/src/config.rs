//! Configuration types and loading
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `blog.toml` (or the file named by `BLOG_CONFIG`), `BLOG__*` environment
//! variables, and finally `DATABASE_URL`.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

/// Config file looked up when `BLOG_CONFIG` is unset (any extension `config` understands)
pub const DEFAULT_CONFIG_FILE: &str = "blog";

/// Prefix for environment overrides, e.g. `BLOG__DATABASE__HOST`
pub const ENV_PREFIX: &str = "BLOG";

const LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Store connection settings.
///
/// When `url` is set it wins; the individual components are used otherwise.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: String,
    /// Schema the tables live in; becomes the session `search_path`
    pub schema: Option<String>,
    /// Session time zone
    pub timezone: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            username: "blog".to_string(),
            password: None,
            database: "blog".to_string(),
            schema: None,
            timezone: "UTC".to_string(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl DatabaseConfig {
    /// Create config with a specific URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Use a dedicated schema
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Connection target suitable for logs (never includes credentials)
    pub fn display_target(&self) -> String {
        match &self.url {
            Some(url) => redact_url(url),
            None => format!("{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

/// Logging settings, including statement tracing for the store driver
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Level at which every executed statement is logged
    pub statement_level: String,
    /// Statements slower than this are logged at `slow_statement_level`
    pub slow_statement_threshold_ms: u64,
    pub slow_statement_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,blog_db=debug,sqlx=warn".to_string(),
            json: false,
            statement_level: "debug".to_string(),
            slow_statement_threshold_ms: 1000,
            slow_statement_level: "warn".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl AppConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("BLOG_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from a specific file (which may be absent) and environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config = Self::from_builder(builder)?;
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = Some(url);
        }
        config.validate()?;
        Ok(config)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Reject values that would only fail later, at connect time
    pub fn validate(&self) -> Result<(), ConfigError> {
        let db = &self.database;
        if db.max_connections == 0 {
            return Err(invalid("database.max_connections", "must be at least 1"));
        }
        if db.min_connections > db.max_connections {
            return Err(invalid(
                "database.min_connections",
                "must not exceed database.max_connections",
            ));
        }
        if let Some(schema) = &db.schema {
            if !is_identifier(schema) {
                return Err(invalid(
                    "database.schema",
                    "must be a lowercase identifier ([a-z_][a-z0-9_]*)",
                ));
            }
        }
        for (key, level) in [
            ("logging.statement_level", &self.logging.statement_level),
            ("logging.slow_statement_level", &self.logging.slow_statement_level),
        ] {
            if !LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(invalid(key, format!("unknown level '{}'", level)));
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Schema names are interpolated into DDL, so only plain identifiers pass
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((_, host)) => format!("{}://***@{}", scheme, host),
        None => url.to_string(),
    }
}
