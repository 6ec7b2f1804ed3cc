use super::error::*;
use rstest::rstest;

#[rstest]
#[case(AppError::Unauthorized("test".into()), 401, "UNAUTHORIZED")]
#[case(AppError::Forbidden("test".into()), 403, "FORBIDDEN")]
#[case(AppError::NotFound("test".into()), 404, "NOT_FOUND")]
#[case(AppError::Validation("test".into()), 400, "VALIDATION_ERROR")]
#[case(AppError::BadRequest("test".into()), 400, "BAD_REQUEST")]
#[case(AppError::LimitExceeded("test".into()), 400, "UPLOAD_LIMIT_EXCEEDED")]
#[case(AppError::Conflict("test".into()), 409, "CONFLICT")]
#[case(AppError::Database("test".into()), 500, "DATABASE_ERROR")]
#[case(AppError::Storage("test".into()), 500, "STORAGE_ERROR")]
#[case(AppError::Internal("test".into()), 500, "INTERNAL_ERROR")]
fn test_app_error_status_and_code(
    #[case] err: AppError,
    #[case] status: u16,
    #[case] code: &str,
) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
}

#[test]
fn test_app_error_display() {
    assert_eq!(
        format!("{}", AppError::Unauthorized("msg".into())),
        "Authentication failed: msg"
    );
    assert_eq!(
        format!("{}", AppError::BadRequest("msg".into())),
        "Bad request: msg"
    );
    assert_eq!(
        format!("{}", AppError::Validation("msg".into())),
        "Validation error: msg"
    );
    assert_eq!(
        format!("{}", AppError::Storage("msg".into())),
        "Storage error: msg"
    );
}

#[test]
fn test_public_message_hides_server_errors() {
    assert_eq!(
        AppError::Database("connection refused".into()).public_message(),
        "An error occurred"
    );
    assert_eq!(
        AppError::BadRequest("Invalid token".into()).public_message(),
        "Invalid token"
    );
    assert!(AppError::Storage(String::new()).is_server_error());
    assert!(!AppError::Forbidden(String::new()).is_server_error());
}
