use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_STORAGE_BACKEND: &str = "json-file";
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;
const CONFIG_DIR: &str = "config";

pub const STORAGE_BACKEND_JSON_FILE: &str = "json-file";
pub const STORAGE_BACKEND_IN_MEMORY: &str = "in-memory";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Directory holding `orders.json` and `currentUser.json`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Order persistence: "json-file" or "in-memory"
    #[serde(default = "default_storage_backend")]
    #[validate(custom = "validate_storage_backend")]
    pub storage_backend: String,

    /// Optional JSON file replacing the built-in user table
    #[serde(default)]
    pub users_file: Option<PathBuf>,

    /// Firm name -> sequence prefix overrides (e.g. CCC -> REF)
    #[serde(default = "default_firm_prefix_aliases")]
    pub firm_prefix_aliases: HashMap<String, String>,

    /// Capacity of the domain event channel
    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(default_host(), DEFAULT_PORT, DEFAULT_ENV.to_string())
    }
}

impl AppConfig {
    /// Builds a configuration with defaults for everything but the listener.
    pub fn new(host: String, port: u16, environment: String) -> Self {
        Self {
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            data_dir: default_data_dir(),
            storage_backend: default_storage_backend(),
            users_file: None,
            firm_prefix_aliases: default_firm_prefix_aliases(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn uses_in_memory_storage(&self) -> bool {
        self.storage_backend == STORAGE_BACKEND_IN_MEMORY
    }

    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.cors_allow_any_origin || self.is_development()
    }

    /// Alias table with upper-cased keys and values.
    ///
    /// The `config` crate lowercases map keys read from files, so lookups
    /// must never depend on the case used in the source.
    pub fn prefix_aliases(&self) -> HashMap<String, String> {
        self.firm_prefix_aliases
            .iter()
            .map(|(firm, prefix)| {
                (
                    firm.trim().to_uppercase(),
                    prefix.trim().to_uppercase(),
                )
            })
            .collect()
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.is_development() && !self.has_cors_allowed_origins() && !self.cors_allow_any_origin
        {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "cors_allowed_origins must be set outside development (or set cors_allow_any_origin)"
                    .into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self
            .prefix_aliases()
            .iter()
            .any(|(firm, prefix)| firm.is_empty() || prefix.is_empty())
        {
            let mut err = ValidationError::new("firm_prefix_aliases");
            err.message = Some("firm prefix aliases cannot contain empty names".into());
            errors.add("firm_prefix_aliases", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_storage_backend() -> String {
    DEFAULT_STORAGE_BACKEND.to_string()
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

pub fn default_firm_prefix_aliases() -> HashMap<String, String> {
    HashMap::from([
        ("CCC".to_string(), "REF".to_string()),
        ("REFRASYNTH".to_string(), "REF".to_string()),
    ])
}

fn validate_storage_backend(value: &str) -> Result<(), ValidationError> {
    match value {
        STORAGE_BACKEND_JSON_FILE | STORAGE_BACKEND_IN_MEMORY => Ok(()),
        _ => {
            let mut err = ValidationError::new("storage_backend");
            err.message = Some("storage_backend must be either 'json-file' or 'in-memory'".into());
            Err(err)
        }
    }
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("o2d_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same as [`load_config`] but reading TOML files from `config_dir`.
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env.clone())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("data_dir", DEFAULT_DATA_DIR)?
        .set_default("storage_backend", DEFAULT_STORAGE_BACKEND)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!(
        data_dir = %app_config.data_dir.display(),
        storage_backend = %app_config.storage_backend,
        "Configuration loaded successfully"
    );
    Ok(app_config)
}
