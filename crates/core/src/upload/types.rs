//! Upload domain types.

use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parley_shared::types::{AttachmentId, RealmId, UserId};
use serde::Serialize;

/// `Cache-Control` value for served uploads.
pub const CACHE_CONTROL: &str = "private, immutable";

/// An uploaded file as recorded in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment ID.
    pub id: AttachmentId,
    /// Storage locator, `{realm_id}/{random}/{file name}`.
    pub path_id: String,
    /// Realm the file was uploaded to.
    pub realm_id: RealmId,
    /// Uploader.
    pub owner_id: UserId,
    /// Original file name.
    pub file_name: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type recorded at upload.
    pub content_type: String,
    /// Visible to every member of the realm.
    pub is_realm_public: bool,
    /// Visible to anyone, including logged-out visitors.
    pub is_web_public: bool,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a new attachment.
#[derive(Debug, Clone)]
pub struct CreateAttachmentInput {
    /// Storage locator.
    pub path_id: String,
    /// Realm.
    pub realm_id: RealmId,
    /// Uploader.
    pub owner_id: UserId,
    /// Original file name.
    pub file_name: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    pub content_type: String,
}

/// Who is asking for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// Logged-out visitor.
    Anonymous,
    /// Authenticated user.
    User {
        /// User ID.
        user_id: UserId,
        /// The user's realm.
        realm_id: RealmId,
    },
}

/// The realm a request was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealmContext {
    /// Realm ID.
    pub id: RealmId,
    /// Upload quota in bytes; `None` is unlimited.
    pub upload_quota_bytes: Option<i64>,
}

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: String,
    /// Client-supplied MIME type.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// Link to the file, `/user_uploads/{path_id}`.
    pub uri: String,
    /// Storage locator.
    #[serde(skip)]
    pub path_id: String,
}

/// How a permitted file request is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// JSON `{"url": ...}` with a short-lived URL.
    AccessUrl(String),
    /// `302` to a signed object storage URL.
    Redirect(String),
    /// Empty response the reverse proxy completes from its internal location.
    InternalRedirect {
        /// Value of `X-Accel-Redirect`.
        path: String,
        /// Value of `Content-Disposition`.
        content_disposition: String,
    },
    /// The application streams the file itself.
    Stream {
        /// File on disk.
        path: PathBuf,
        /// Value of `Content-Type`.
        content_type: String,
        /// Value of `Content-Disposition`.
        content_disposition: String,
    },
}
