//! Upload service: authorization, serving and storing user uploads.

use std::sync::Arc;

use parley_shared::config::mib_to_bytes;
use parley_shared::types::{AttachmentId, RealmId, UserId};
use tracing::warn;

use super::access::{AccessCheck, check_access};
use super::backend::UploadBackend;
use super::error::UploadError;
use super::path::{file_name, generate_path_id};
use super::types::{
    Attachment, CreateAttachmentInput, Principal, RealmContext, ServeOutcome, UploadResult,
    UploadedFile,
};

/// Repository trait for attachment persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait UploadRepository: Send + Sync {
    /// Find an attachment by path id.
    fn find_by_path_id(
        &self,
        path_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Attachment>, UploadError>> + Send;

    /// Whether the user received the attachment.
    fn is_recipient(
        &self,
        attachment_id: AttachmentId,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<bool, UploadError>> + Send;

    /// Total bytes uploaded to a realm.
    fn used_upload_space(
        &self,
        realm_id: RealmId,
    ) -> impl std::future::Future<Output = Result<i64, UploadError>> + Send;

    /// Record a new attachment.
    fn create(
        &self,
        input: CreateAttachmentInput,
    ) -> impl std::future::Future<Output = Result<Attachment, UploadError>> + Send;
}

/// Service for user uploads.
pub struct UploadService<R: UploadRepository> {
    backend: Arc<UploadBackend>,
    repo: Arc<R>,
    max_file_upload_size_mib: u64,
}

impl<R: UploadRepository> UploadService<R> {
    /// Create a new upload service.
    #[must_use]
    pub fn new(backend: Arc<UploadBackend>, repo: Arc<R>, max_file_upload_size_mib: u64) -> Self {
        Self {
            backend,
            repo,
            max_file_upload_size_mib,
        }
    }

    /// Checks whether `principal` may see the file at `path_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown paths and `Forbidden` when access is
    /// denied.
    pub async fn validate_attachment_request(
        &self,
        principal: &Principal,
        realm_id: RealmId,
        path_id: &str,
    ) -> Result<Attachment, UploadError> {
        let attachment = self
            .repo
            .find_by_path_id(path_id)
            .await?
            .ok_or(UploadError::NotFound)?;

        let allowed = match check_access(principal, realm_id, &attachment) {
            AccessCheck::Granted => true,
            AccessCheck::Denied => false,
            AccessCheck::NeedsRecipientCheck(user_id) => {
                self.repo.is_recipient(attachment.id, user_id).await?
            }
        };

        if allowed {
            Ok(attachment)
        } else {
            Err(UploadError::Forbidden)
        }
    }

    /// Serves `{realm_id_str}/{filename}` to an authorized principal.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, or a backend error.
    pub async fn serve_file(
        &self,
        principal: &Principal,
        realm_id: RealmId,
        realm_id_str: &str,
        filename: &str,
        url_only: bool,
        download: bool,
    ) -> Result<ServeOutcome, UploadError> {
        let path_id = format!("{realm_id_str}/{filename}");
        self.validate_attachment_request(principal, realm_id, &path_id)
            .await?;
        self.backend.serve(&path_id, url_only, download).await
    }

    /// Serves a local file through a temporary access token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` for bad or used tokens, `InvalidFilename` when
    /// the token belongs to another file, and `NotFound` when uploads are not
    /// stored locally.
    pub async fn serve_local_file_unauthed(
        &self,
        token: &str,
        filename: &str,
    ) -> Result<ServeOutcome, UploadError> {
        let local = self.backend.as_local().ok_or(UploadError::NotFound)?;
        let signer = local.signer();
        let path_id = signer.verify(token).ok_or(UploadError::InvalidToken)?;
        if file_name(&path_id) != filename {
            return Err(UploadError::InvalidFilename);
        }
        if !signer.consume(token) {
            return Err(UploadError::InvalidToken);
        }
        local.serve(&path_id, false, false).await
    }

    /// Stores the single file of an upload request.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request has no file or more than one
    /// - The file exceeds the size limit or the realm quota
    /// - Storage or the repository fails
    pub async fn upload_file(
        &self,
        owner_id: UserId,
        realm: &RealmContext,
        files: Vec<UploadedFile>,
    ) -> Result<UploadResult, UploadError> {
        let mut files = files.into_iter();
        let file = files.next().ok_or(UploadError::NoFile)?;
        if files.next().is_some() {
            return Err(UploadError::TooManyFiles);
        }

        let size = file.data.len() as u64;
        if size > mib_to_bytes(self.max_file_upload_size_mib) {
            return Err(UploadError::FileTooLarge {
                limit_mib: self.max_file_upload_size_mib,
            });
        }
        let size = i64::try_from(size).map_err(|_| UploadError::FileTooLarge {
            limit_mib: self.max_file_upload_size_mib,
        })?;

        if let Some(quota) = realm.upload_quota_bytes {
            let used = self.repo.used_upload_space(realm.id).await?;
            if used.saturating_add(size) > quota {
                return Err(UploadError::QuotaExceeded);
            }
        }

        let path_id = generate_path_id(realm.id, &file.file_name);
        let content_type = file
            .content_type
            .clone()
            .filter(|ct| !ct.is_empty())
            .or_else(|| mime_guess::from_path(&file.file_name).first().map(|m| m.to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        self.backend.save(&path_id, &file, &content_type).await?;

        let created = self
            .repo
            .create(CreateAttachmentInput {
                path_id: path_id.clone(),
                realm_id: realm.id,
                owner_id,
                file_name: file.file_name,
                size,
                content_type,
            })
            .await;
        if let Err(err) = created {
            if let Err(cleanup) = self.backend.delete(&path_id).await {
                warn!(path_id = %path_id, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(err);
        }

        Ok(UploadResult {
            uri: format!("/user_uploads/{path_id}"),
            path_id,
        })
    }
}
