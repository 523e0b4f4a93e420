//! Application configuration
//!
//! Configuration is loaded once at startup from built-in defaults overlaid
//! with `TUBELY_`-prefixed environment variables (`__` separates nested
//! keys, e.g. `TUBELY_STORAGE__BUCKET`). The resulting [`AppConfig`] is
//! immutable and handed to the services that need it.

use crate::database::DatabaseConfig;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Upload ceiling enforced at the HTTP layer and while staging (1 GiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1 << 30;

/// Lifetime of signed read URLs (15 minutes)
pub const DEFAULT_PRESIGN_TTL_SECS: u64 = 15 * 60;

/// Top-level configuration for the API service
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body in bytes
    pub max_upload_bytes: u64,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Object storage settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub endpoint_url: Option<String>,
    pub presign_ttl_secs: u64,
}

impl StorageConfig {
    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_ttl_secs)
    }
}

/// External media tool settings
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub tool_timeout_secs: u64,
    /// Directory for staged uploads; the system temp dir when unset
    pub staging_dir: Option<PathBuf>,
}

impl MediaConfig {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Bearer token verification settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// RS256 public key in PEM format, or a path to a PEM file
    pub jwt_public_key: Option<String>,
}

impl AppConfig {
    /// Load configuration from defaults and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(
            Environment::with_prefix("TUBELY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Load configuration from defaults overlaid with the given environment source
    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let database = DatabaseConfig::default();

        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8091)?
            .set_default("server.max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as i64)?
            .set_default("storage.bucket", "tubely-videos")?
            .set_default("storage.region", "us-east-1")?
            .set_default("storage.presign_ttl_secs", DEFAULT_PRESIGN_TTL_SECS as i64)?
            .set_default("media.ffprobe_path", "ffprobe")?
            .set_default("media.ffmpeg_path", "ffmpeg")?
            .set_default("media.tool_timeout_secs", 300)?
            .set_default("database.url", database.url)?
            .set_default("database.max_connections", database.max_connections as i64)?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Environment::with_prefix("TUBELY")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_environment(environment(&[])).expect("defaults load");

        assert_eq!(config.server.port, 8091);
        assert_eq!(config.server.max_upload_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.storage.bucket, "tubely-videos");
        assert_eq!(config.storage.presign_ttl(), Duration::from_secs(900));
        assert_eq!(config.media.tool_timeout(), Duration::from_secs(300));
        assert_eq!(config.media.staging_dir(), std::env::temp_dir());
        assert!(config.storage.endpoint_url.is_none());
        assert!(config.auth.jwt_public_key.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_environment(environment(&[
            ("TUBELY_SERVER__PORT", "9000"),
            ("TUBELY_STORAGE__BUCKET", "bucket1"),
            ("TUBELY_STORAGE__ENDPOINT_URL", "http://localhost:9000"),
            ("TUBELY_MEDIA__STAGING_DIR", "/var/tmp/tubely"),
        ]))
        .expect("overrides load");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.storage.bucket, "bucket1");
        assert_eq!(
            config.storage.endpoint_url.as_deref(),
            Some("http://localhost:9000")
        );
        assert_eq!(
            config.media.staging_dir(),
            PathBuf::from("/var/tmp/tubely")
        );
    }
}
