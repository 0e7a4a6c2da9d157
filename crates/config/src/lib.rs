//! Configuration loading and validation for shopclerk.
//!
//! Loads `shopclerk.toml` with environment variable overrides
//! (`SHOPCLERK_API_KEY` and friends). Every field has a default so a
//! missing config file means "run with defaults", not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use shopclerk_core::Error;

/// The root configuration structure. Maps directly to `shopclerk.toml`.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Model-service configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Data file locations
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for the model service (overridable via SHOPCLERK_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_api_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_chat_model() -> String {
    "llama-3.1-8b-instant".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    256
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Seed corpus directory (one document per .txt file)
    #[serde(default = "default_seed_docs_dir")]
    pub seed_docs_dir: PathBuf,

    /// Store catalog JSON file
    #[serde(default = "default_stores_file")]
    pub stores_file: PathBuf,

    /// Persisted vector index file
    #[serde(default = "default_index_file")]
    pub index_file: PathBuf,

    /// Persisted index metadata file (sibling of `index_file`)
    #[serde(default = "default_meta_file")]
    pub meta_file: PathBuf,

    /// SQLite users/purchases database
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

fn default_seed_docs_dir() -> PathBuf {
    "data/seed_docs".into()
}
fn default_stores_file() -> PathBuf {
    "data/stores.json".into()
}
fn default_index_file() -> PathBuf {
    "data/seed.index".into()
}
fn default_meta_file() -> PathBuf {
    "data/seed.meta.json".into()
}
fn default_db_file() -> String {
    "data/users.db".into()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            seed_docs_dir: default_seed_docs_dir(),
            stores_file: default_stores_file(),
            index_file: default_index_file(),
            meta_file: default_meta_file(),
            db_file: default_db_file(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("gateway", &self.gateway)
            .field("data", &self.data)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist, then apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
                message: format!("read {path:?}: {e}"),
            })?;
            toml::from_str(&content).map_err(|e| Error::Config {
                message: format!("parse {path:?}: {e}"),
            })?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides from a lookup function.
    ///
    /// Split out from `load` so tests can inject values without touching
    /// process-global environment state.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(key) = get("SHOPCLERK_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = get("SHOPCLERK_API_URL") {
            self.provider.api_url = url;
        }
        if let Some(model) = get("SHOPCLERK_CHAT_MODEL") {
            self.provider.chat_model = model;
        }
        if let Some(model) = get("SHOPCLERK_EMBEDDING_MODEL") {
            self.provider.embedding_model = model;
        }
        if let Some(port) = get("SHOPCLERK_PORT")
            && let Ok(port) = port.parse()
        {
            self.gateway.port = port;
        }
    }

    /// Check numeric ranges and required shapes.
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(Error::Config {
                message: format!(
                    "temperature {} out of range [0, 2]",
                    self.provider.temperature
                ),
            });
        }
        if self.provider.max_tokens == 0 {
            return Err(Error::Config {
                message: "max_tokens must be positive".into(),
            });
        }
        if self.gateway.port == 0 {
            return Err(Error::Config {
                message: "gateway port must be non-zero".into(),
            });
        }
        Ok(())
    }
}
