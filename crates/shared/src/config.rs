//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// User upload configuration.
    pub uploads: UploadsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public host name; realms live on subdomains of it.
    #[serde(default = "default_external_host")]
    pub external_host: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_external_host() -> String {
    "localhost:8080".to_string()
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as read from config files.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// User upload configuration.
///
/// When `local_uploads_dir` is set, files live on local disk and are handed
/// to the reverse proxy; otherwise the `s3` section must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    /// Root of the local upload tree.
    #[serde(default)]
    pub local_uploads_dir: Option<PathBuf>,
    /// Maximum size of a single uploaded file, in MiB.
    #[serde(default = "default_max_file_upload_size_mib")]
    pub max_file_upload_size_mib: u64,
    /// Serve local files from the application instead of the reverse proxy.
    #[serde(default)]
    pub development: bool,
    /// MIME types that browsers may render inline.
    #[serde(default = "default_inline_mime_types")]
    pub inline_mime_types: Vec<String>,
    /// Secret used to sign temporary local access URLs.
    pub access_token_secret: String,
    /// Lifetime of temporary local access URLs, in seconds.
    #[serde(default = "default_access_token_max_age")]
    pub access_token_max_age_secs: u64,
    /// Object storage settings.
    #[serde(default)]
    pub s3: Option<S3Config>,
}

/// S3-compatible object storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// S3 endpoint URL.
    pub endpoint: String,
    /// Bucket holding user uploads.
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Lifetime of signed download URLs, in seconds.
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_secs: u64,
}

fn default_max_file_upload_size_mib() -> u64 {
    25
}

fn default_access_token_max_age() -> u64 {
    60
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_presign_ttl() -> u64 {
    60
}

/// MIME types safe to display inline.
///
/// Never add types that can carry script: `text/html`, `image/svg+xml`,
/// `application/xhtml+xml`, `text/xml`.
#[must_use]
pub fn default_inline_mime_types() -> Vec<String> {
    [
        "application/pdf",
        "audio/aac",
        "audio/flac",
        "audio/mp4",
        "audio/mpeg",
        "audio/wav",
        "audio/webm",
        "image/apng",
        "image/avif",
        "image/gif",
        "image/jpeg",
        "image/png",
        "image/webp",
        "text/plain",
        "video/mp4",
        "video/webm",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

/// Bytes in `mib` mebibytes, saturating at `u64::MAX`.
#[must_use]
pub const fn mib_to_bytes(mib: u64) -> u64 {
    mib.saturating_mul(1024 * 1024)
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PARLEY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
