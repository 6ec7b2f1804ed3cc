//! Upload error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Upload and file-serving errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No attachment exists at the requested path.
    #[error("File not found.")]
    NotFound,

    /// The principal may not see the attachment.
    #[error("You are not authorized to view this file.")]
    Forbidden,

    /// The request carried no file.
    #[error("You must specify a file to upload")]
    NoFile,

    /// The request carried more than one file.
    #[error("You may only upload one file at a time")]
    TooManyFiles,

    /// The file exceeds the per-file size limit.
    #[error("Uploaded file is larger than the allowed limit of {limit_mib} MiB")]
    FileTooLarge {
        /// Configured limit in MiB.
        limit_mib: u64,
    },

    /// Storing the file would exceed the realm's upload quota.
    #[error("Upload would exceed your organization's upload quota.")]
    QuotaExceeded,

    /// Temporary access token is malformed, expired, forged or used.
    #[error("Invalid token")]
    InvalidToken,

    /// Temporary access token does not match the requested file name.
    #[error("Invalid filename")]
    InvalidFilename,

    /// Upload backend is misconfigured.
    #[error("upload configuration error: {0}")]
    Configuration(String),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl UploadError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
