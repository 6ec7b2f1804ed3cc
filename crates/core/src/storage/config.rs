//! Storage provider configuration.

use std::path::PathBuf;

use parley_shared::S3Config;
use serde::{Deserialize, Serialize};

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Local filesystem
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Create S3-compatible provider from application settings.
    #[must_use]
    pub fn from_s3_config(config: &S3Config) -> Self {
        Self::S3 {
            endpoint: config.endpoint.clone(),
            bucket: config.bucket.clone(),
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            region: config.region.clone(),
        }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_provider_s3() {
        let provider = StorageProvider::from_s3_config(&S3Config {
            endpoint: "https://account.r2.cloudflarestorage.com".to_string(),
            bucket: "uploads".to_string(),
            access_key_id: "access_key".to_string(),
            secret_access_key: "secret_key".to_string(),
            region: "auto".to_string(),
            presign_ttl_secs: 60,
        });
        assert_eq!(provider.name(), "s3");
        assert!(matches!(provider, StorageProvider::S3 { ref bucket, .. } if bucket == "uploads"));
    }

    #[test]
    fn test_storage_provider_local() {
        let provider = StorageProvider::local_fs("./storage");
        assert_eq!(provider.name(), "local");
    }
}
