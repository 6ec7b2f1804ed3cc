//! JSON error responses.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use parley_core::profile_field::ProfileFieldError;
use parley_core::upload::UploadError;
use parley_shared::AppError;

/// Handler error rendered as `{"error": code, "message": msg}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        if err.is_server_error() {
            error!(error = %err, "Request failed");
        }
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "error": err.error_code(),
                "message": err.public_message(),
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        let message = err.to_string();
        Self(match err {
            UploadError::NotFound => AppError::NotFound(message),
            UploadError::Forbidden => AppError::Forbidden(message),
            UploadError::NoFile
            | UploadError::TooManyFiles
            | UploadError::InvalidToken
            | UploadError::InvalidFilename => AppError::BadRequest(message),
            UploadError::FileTooLarge { .. } | UploadError::QuotaExceeded => {
                AppError::LimitExceeded(message)
            }
            UploadError::Storage(_) => AppError::Storage(message),
            UploadError::Repository(_) => AppError::Database(message),
            UploadError::Configuration(_) => AppError::Internal(message),
        })
    }
}

impl From<ProfileFieldError> for ApiError {
    fn from(err: ProfileFieldError) -> Self {
        let message = err.to_string();
        Self(match err {
            ProfileFieldError::Validation(_) => AppError::Validation(message),
            ProfileFieldError::NotFound(_) => AppError::NotFound(message),
            ProfileFieldError::DuplicateName => AppError::Conflict(message),
            ProfileFieldError::AdminRequired => AppError::Forbidden(message),
            ProfileFieldError::Repository(_) => AppError::Database(message),
        })
    }
}

/// Maps a multipart parse failure, keeping the size limit message when the
/// body limit was hit.
pub fn multipart_error(err: &MultipartError, limit_mib: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::FileTooLarge { limit_mib }.into()
    } else {
        ApiError(AppError::BadRequest(err.body_text()))
    }
}
