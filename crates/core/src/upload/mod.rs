//! User uploads.
//!
//! Files are uploaded one per request and served only to principals allowed
//! to see them, either from local disk through the reverse proxy or from
//! object storage through signed URLs.
//!
//! # Modules
//!
//! - `types` - Attachments, principals and serve outcomes
//! - `access` - Who may see a file
//! - `disposition` - `Content-Disposition` and internal redirect paths
//! - `path` - Path id generation and checks
//! - `token` - Signed single-use temporary access tokens
//! - `backend` - Local and object storage backends
//! - `service` - Upload and serving logic over a repository

pub mod access;
pub mod backend;
pub mod disposition;
pub mod error;
pub mod path;
pub mod service;
pub mod token;
pub mod types;


pub use backend::{LocalUploadBackend, S3UploadBackend, UploadBackend};
pub use disposition::content_disposition;
pub use error::UploadError;
pub use service::{UploadRepository, UploadService};
pub use token::AccessTokenSigner;
pub use types::{
    Attachment, CACHE_CONTROL, CreateAttachmentInput, Principal, RealmContext, ServeOutcome,
    UploadResult, UploadedFile,
};
