//! Configuration for the gateway.

use std::collections::HashMap;
use std::env;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable naming the configuration file (without extension).
pub const CONFIG_PATH_VAR: &str = "REMBG_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config";

/// Flat environment variables kept for deployments that predate the
/// `REMBG__SECTION__KEY` layout. They take precedence over everything else.
const LEGACY_OVERRIDES: [(&str, &str); 4] = [
    ("X_API_KEY", "auth.api_key"),
    ("ALLOWED_ORIGINS", "cors.allowed_origins"),
    ("HOST", "server.host"),
    ("PORT", "server.port"),
];

/// Main configuration structure, built once at startup and never mutated.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a request body on the upload routes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    /// Shared secret expected in the `X-API-Key` header.
    /// Unset or empty disables authentication.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl AuthConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, or `*`.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn allows_any_origin(&self) -> bool {
        self.origins().iter().any(|origin| origin == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Which collaborator implementation to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Spawn the `rembg` command line per request.
    #[default]
    Cli,
    /// Forward to a running `rembg s` server.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: EngineKind,
    /// Path to the rembg binary or a wrapper command.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Arguments inserted before the rembg subcommand.
    /// Use this for wrappers, e.g. `["run", "rembg"]` with `binary = "uv"`.
    #[serde(default)]
    pub binary_args: Vec<String>,
    /// Base URL of the rembg server for the `http` engine.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Abort startup when the engine fails its capability check.
    #[serde(default)]
    pub require_available: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            binary: default_binary(),
            binary_args: vec![],
            base_url: default_base_url(),
            require_available: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8001
}
fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}
fn default_allowed_origins() -> String {
    "*".to_string()
}
fn default_binary() -> String {
    "rembg".to_string()
}
fn default_base_url() -> String {
    "http://127.0.0.1:7000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and the process environment.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Legacy flat variables (`X_API_KEY`, `ALLOWED_ORIGINS`, `HOST`, `PORT`)
    /// 2. Environment variables (REMBG__SECTION__KEY format)
    /// 3. config.toml file (if present; path from `REMBG_CONFIG`)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let file = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&file, env::vars().collect())
    }

    /// Load configuration from `file` and an explicit set of variables.
    pub fn load_from(file: &str, vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("cors.allowed_origins", default_allowed_origins())?
            .set_default("logging.level", default_log_level())?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("REMBG")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        for (var, key) in LEGACY_OVERRIDES {
            builder = builder.set_override_option(key, vars.get(var).cloned())?;
        }

        builder.build()?.try_deserialize()
    }
}
