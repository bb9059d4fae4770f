use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Object-storage backend settings.
///
/// Credentials are never read from the file; `S3Store` takes them from
/// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` (and optionally
/// `AWS_SESSION_TOKEN`) in the environment.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack).
    /// When unset, the standard `<bucket>.s3.<region>.amazonaws.com`
    /// virtual-hosted addressing is used.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// Backend container holding all device data.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Per-request timeout for existence checks and fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}
fn default_bucket() -> String {
    "iotbackend".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8701".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Deployment override, matching the env-driven backend setting of the
    // hosted variant of this service.
    if let Ok(bucket) = std::env::var("WEATHERVANE_BUCKET") {
        if !bucket.is_empty() {
            config.storage.bucket = bucket;
        }
    }

    if config.storage.bucket.is_empty() {
        anyhow::bail!("storage.bucket must not be empty");
    }

    if config.storage.timeout_secs == 0 {
        anyhow::bail!("storage.timeout_secs must be > 0");
    }

    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}
