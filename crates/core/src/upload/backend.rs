//! Upload backends: local disk behind the reverse proxy, or object storage.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parley_shared::UploadsConfig;

use super::disposition::{content_disposition, internal_redirect_path};
use super::error::UploadError;
use super::path::{file_name, is_safe_path_id};
use super::token::{AccessTokenSigner, access_url};
use super::types::{ServeOutcome, UploadedFile};
use crate::storage::{StorageProvider, StorageService};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Files stored under `<root>/files/<path_id>`.
#[derive(Debug, Clone)]
pub struct LocalUploadBackend {
    files_dir: PathBuf,
    storage: StorageService,
    signer: AccessTokenSigner,
    development: bool,
    inline_mime_types: Vec<String>,
}

impl LocalUploadBackend {
    /// Creates a backend rooted at `root`.
    ///
    /// In development the application streams files itself; otherwise it
    /// hands them to the reverse proxy.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operator cannot be created.
    pub fn new(
        root: &Path,
        signer: AccessTokenSigner,
        development: bool,
        inline_mime_types: Vec<String>,
    ) -> Result<Self, UploadError> {
        let files_dir = root.join("files");
        let storage = StorageService::from_provider(&StorageProvider::local_fs(&files_dir))?;
        Ok(Self {
            files_dir,
            storage,
            signer,
            development,
            inline_mime_types,
        })
    }

    /// Signer for temporary access URLs.
    #[must_use]
    pub fn signer(&self) -> &AccessTokenSigner {
        &self.signer
    }

    /// Location of an existing file, or `None` for unknown or unsafe ids.
    pub async fn local_file_path(&self, path_id: &str) -> Option<PathBuf> {
        if !is_safe_path_id(path_id) {
            return None;
        }
        let path = self.files_dir.join(path_id);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Some(path),
            _ => None,
        }
    }

    /// Answers a request for a permitted file.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the file is missing on disk.
    pub async fn serve(
        &self,
        path_id: &str,
        url_only: bool,
        download: bool,
    ) -> Result<ServeOutcome, UploadError> {
        let local_path = self
            .local_file_path(path_id)
            .await
            .ok_or(UploadError::NotFound)?;

        if url_only {
            let token = self.signer.sign(path_id);
            return Ok(ServeOutcome::AccessUrl(access_url(&token, file_name(path_id))));
        }

        let mime = mime_guess::from_path(&local_path).first();
        let inline = mime
            .as_ref()
            .is_some_and(|m| self.inline_mime_types.iter().any(|t| t == m.essence_str()));
        let disposition = content_disposition(&local_path.to_string_lossy(), download || !inline);

        if self.development {
            return Ok(ServeOutcome::Stream {
                path: local_path,
                content_type: mime.map_or_else(|| DEFAULT_CONTENT_TYPE.to_string(), |m| m.to_string()),
                content_disposition: disposition,
            });
        }

        Ok(ServeOutcome::InternalRedirect {
            path: internal_redirect_path(path_id),
            content_disposition: disposition,
        })
    }
}

/// Files stored in an S3-compatible bucket and served through signed URLs.
#[derive(Debug, Clone)]
pub struct S3UploadBackend {
    storage: StorageService,
    presign_ttl: Duration,
}

impl S3UploadBackend {
    /// Creates a backend over an object storage service.
    #[must_use]
    pub const fn new(storage: StorageService, presign_ttl: Duration) -> Self {
        Self {
            storage,
            presign_ttl,
        }
    }

    /// Answers a request for a permitted file.
    ///
    /// Downloads ask the store to send an `attachment` disposition.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be signed.
    pub async fn serve(
        &self,
        path_id: &str,
        url_only: bool,
        download: bool,
    ) -> Result<ServeOutcome, UploadError> {
        let disposition = download.then(|| content_disposition(path_id, true));
        let signed = self
            .storage
            .presign_read(path_id, self.presign_ttl, disposition.as_deref())
            .await?;

        if url_only {
            Ok(ServeOutcome::AccessUrl(signed.url))
        } else {
            Ok(ServeOutcome::Redirect(signed.url))
        }
    }
}

/// The configured upload backend, chosen once at startup.
#[derive(Debug, Clone)]
pub enum UploadBackend {
    /// Local disk.
    Local(LocalUploadBackend),
    /// Object storage.
    S3(S3UploadBackend),
}

impl UploadBackend {
    /// Builds the backend described by the configuration.
    ///
    /// A configured `local_uploads_dir` wins over object storage.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when neither backend is configured.
    pub fn from_config(config: &UploadsConfig) -> Result<Self, UploadError> {
        if let Some(root) = &config.local_uploads_dir {
            let signer = AccessTokenSigner::new(
                &config.access_token_secret,
                Duration::from_secs(config.access_token_max_age_secs),
            )?;
            return Ok(Self::Local(LocalUploadBackend::new(
                root,
                signer,
                config.development,
                config.inline_mime_types.clone(),
            )?));
        }

        let s3 = config.s3.as_ref().ok_or_else(|| {
            UploadError::configuration("either uploads.local_uploads_dir or uploads.s3 must be set")
        })?;
        let storage = StorageService::from_provider(&StorageProvider::from_s3_config(s3))?;
        Ok(Self::S3(S3UploadBackend::new(
            storage,
            Duration::from_secs(s3.presign_ttl_secs),
        )))
    }

    /// Backend name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::S3(_) => "s3",
        }
    }

    /// The local backend, if configured.
    #[must_use]
    pub const fn as_local(&self) -> Option<&LocalUploadBackend> {
        match self {
            Self::Local(local) => Some(local),
            Self::S3(_) => None,
        }
    }

    /// Answers a request for a permitted file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be signed.
    pub async fn serve(
        &self,
        path_id: &str,
        url_only: bool,
        download: bool,
    ) -> Result<ServeOutcome, UploadError> {
        match self {
            Self::Local(local) => local.serve(path_id, url_only, download).await,
            Self::S3(s3) => s3.serve(path_id, url_only, download).await,
        }
    }

    /// Stores a file under `path_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn save(
        &self,
        path_id: &str,
        file: &UploadedFile,
        content_type: &str,
    ) -> Result<(), UploadError> {
        self.storage()
            .write(path_id, file.data.clone(), content_type)
            .await?;
        Ok(())
    }

    /// Removes a stored file.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, path_id: &str) -> Result<(), UploadError> {
        self.storage().delete(path_id).await?;
        Ok(())
    }

    const fn storage(&self) -> &StorageService {
        match self {
            Self::Local(local) => &local.storage,
            Self::S3(s3) => &s3.storage,
        }
    }
}
