//! Configuration management

use clap::{Parser, Subcommand};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config as Settings, ConfigError as BuilderError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Minimum length of the HMAC signing key in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid auth configuration: {0}")]
    InvalidAuth(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid CORS configuration: {0}")]
    InvalidCors(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
}

impl Config {
    /// Load configuration with precedence: CLI args > Environment variables > Config file > Defaults
    pub fn load(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut builder = with_defaults(Settings::builder())?;

        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string(),
                ));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // MASHEBI_AUTH__JWT_SECRET, MASHEBI_SERVER__PORT, ...
        builder = builder.add_source(
            Environment::with_prefix("MASHEBI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins"),
        );

        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(db_path) = &cli_args.database {
            builder = builder.set_override("database.path", db_path.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize().map_err(missing_secret_hint)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.logging.validate()?;
        self.cors.validate()?;
        Ok(())
    }
}

/// Defaults for every non-secret key. `auth.jwt_secret`, `auth.issuer` and
/// `auth.audience` are left unset so that startup fails without them.
fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.request_timeout", 30)?
        .set_default("database.path", "./data/mashebi.db")?
        .set_default("database.connection_pool_size", 10)?
        .set_default("database.busy_timeout", 5000)?
        .set_default("database.connection_timeout", 15)?
        .set_default("auth.token_ttl_hours", 12)?
        .set_default("auth.clock_skew_secs", 60)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "json")?
        .set_default("logging.output", "stdout")?
        .set_default("cors.allowed_origins", vec!["*"])?)
}

/// Turn serde's "missing field" for a required auth key into an actionable message
fn missing_secret_hint(err: BuilderError) -> ConfigError {
    let message = err.to_string();
    if message.contains("missing field") {
        for key in ["jwt_secret", "issuer", "audience"] {
            if message.contains(key) {
                return ConfigError::InvalidAuth(format!(
                    "auth.{} must be provided (e.g. MASHEBI_AUTH__{})",
                    key,
                    key.to_uppercase()
                ));
            }
        }
    }
    ConfigError::LoadError(message)
}

/// Command-line arguments for configuration override
#[derive(Debug, Parser)]
#[command(name = "mashebi-api")]
#[command(about = "Mashebi API Server", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database file path
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Provision an account; the password is read from the first line of stdin
    AddAccount {
        #[arg(long)]
        username: String,

        #[arg(long)]
        account_name: String,

        #[arg(long)]
        email: String,

        /// Create the account disabled
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64, // seconds
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port must be greater than 0".to_string()));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidServer("request_timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub connection_pool_size: u32,
    pub busy_timeout: u64,       // milliseconds
    pub connection_timeout: u64, // seconds
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDatabase("path cannot be empty".to_string()));
        }

        if self.connection_pool_size == 0 {
            return Err(ConfigError::InvalidDatabase("connection_pool_size must be greater than 0".to_string()));
        }

        if self.busy_timeout == 0 {
            return Err(ConfigError::InvalidDatabase("busy_timeout must be greater than 0".to_string()));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::InvalidDatabase("connection_timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl_hours: u64,
    pub clock_skew_secs: u64,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::InvalidAuth(format!(
                "jwt_secret must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            )));
        }

        if self.issuer.trim().is_empty() {
            return Err(ConfigError::InvalidAuth("issuer cannot be empty".to_string()));
        }

        if self.audience.trim().is_empty() {
            return Err(ConfigError::InvalidAuth("audience cannot be empty".to_string()));
        }

        if self.token_ttl_hours == 0 {
            return Err(ConfigError::InvalidAuth("token_ttl_hours must be greater than 0".to_string()));
        }

        Ok(())
    }
}

// Keeps the signing key out of `{:?}` output.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("level must be one of: {:?}", valid_levels)
            ));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("format must be one of: {:?}", valid_formats)
            ));
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("output must be one of: {:?}", valid_outputs)
            ));
        }

        if self.output == "file" && self.log_dir.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_dir must be specified when output is 'file'".to_string()
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidCors("allowed_origins cannot be empty".to_string()));
        }
        Ok(())
    }
}
