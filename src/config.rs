//! Configuration types for linkzip

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Task registry capacity limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Archive building behavior
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Where produced archives are stored
    #[serde(default)]
    pub storage: StorageConfig,

    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("failed to parse config file '{}': {}", path.display(), e),
            key: None,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the registry and builder cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_tasks == 0 {
            return Err(Error::Config {
                message: "max_tasks must be greater than zero".into(),
                key: Some("limits.max_tasks".into()),
            });
        }
        if self.limits.max_files == 0 {
            return Err(Error::Config {
                message: "max_files must be greater than zero".into(),
                key: Some("limits.max_files".into()),
            });
        }
        if self.archive.fetch_timeout.is_zero() {
            return Err(Error::Config {
                message: "fetch_timeout must be greater than zero".into(),
                key: Some("archive.fetch_timeout".into()),
            });
        }
        Ok(())
    }

    /// Base URL used to build download links
    ///
    /// Falls back to `http://{bind_address}` when no public URL is configured.
    pub fn public_url(&self) -> String {
        match &self.api.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.api.bind_address),
        }
    }
}

/// Task registry capacity limits
///
/// Captured by value when the registry is constructed and never changed afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LimitsConfig {
    /// Maximum number of live tasks (default: 3)
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,

    /// Number of files that completes a task (default: 3)
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_tasks: default_max_tasks(),
            max_files: default_max_files(),
        }
    }
}

/// Archive building configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveConfig {
    /// Per-file fetch timeout in seconds (default: 30)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub fetch_timeout: Duration,

    /// Compression method for archive entries (default: deflated)
    #[serde(default)]
    pub compression: Compression,

    /// User-Agent sent when fetching remote files
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: default_fetch_timeout(),
            compression: Compression::default(),
            user_agent: default_user_agent(),
        }
    }
}

/// Compression method for archive entries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Deflate compression
    #[default]
    Deflated,
    /// No compression
    Stored,
}

impl From<Compression> for zip::CompressionMethod {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Archive storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Directory where archives are written and served from (default: "./data")
    #[serde(default = "default_data_dir")]
    #[schema(value_type = String)]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Externally visible base URL for download links (default: http://{bind_address})
    #[serde(default)]
    pub public_url: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            public_url: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_max_tasks() -> usize {
    3
}

fn default_max_files() -> usize {
    3
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("linkzip/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_true() -> bool {
    true
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
