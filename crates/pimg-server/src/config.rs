use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::HeaderValue;
use pimg_store::StorageConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Default object ceiling: 5 MB in the service's historical units.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1000 * 1024;

/// Default ceiling on a whole request body (a multipart form may carry
/// several files).
pub const DEFAULT_MAX_BODY_SIZE: u64 = 64 * 1024 * 1024;

/// Process-wide settings, fixed at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub base_path: PathBuf,
    pub max_file_size: u64,
    pub max_body_size: u64,
    pub request_timeout_secs: u64,
    pub allowed_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 9091)),
            log_level: "debug".into(),
            base_path: PathBuf::from("./imagestore"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_timeout_secs: 10,
            allowed_origin: Some("http://localhost:3000".into()),
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.max_file_size == 0 {
            return Err(ServerError::Config("max_file_size must be positive".into()));
        }
        if self.max_body_size < self.max_file_size {
            return Err(ServerError::Config(format!(
                "max_body_size ({}) is smaller than max_file_size ({})",
                self.max_body_size, self.max_file_size
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ServerError::Config("request_timeout_secs must be positive".into()));
        }
        if let Some(origin) = &self.allowed_origin {
            HeaderValue::from_str(origin)
                .map_err(|_| ServerError::Config(format!("invalid allowed_origin: {origin:?}")))?;
        }
        Ok(())
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig::new(&self.base_path, self.max_file_size)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
