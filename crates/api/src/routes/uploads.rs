//! User upload routes.
//!
//! Uploading goes through `/api/v1/user_uploads`. Serving lives outside the
//! API prefix at `/user_uploads/...` so browsers can follow the links that
//! messages carry.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{
        HeaderMap, HeaderName, StatusCode,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION},
    },
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::{
    AppState,
    error::{ApiError, multipart_error},
    middleware::{AuthUser, MaybeAuthUser, auth_middleware, optional_auth_middleware},
    realm::resolve_realm,
};
use parley_core::upload::{
    CACHE_CONTROL as PRIVATE_IMMUTABLE, Principal, RealmContext, ServeOutcome, UploadResult,
    UploadService, UploadedFile,
};
use parley_db::{AttachmentRepository, RealmRepository};
use parley_shared::AppError;
use parley_shared::config::mib_to_bytes;
use parley_shared::types::RealmId;

const X_ACCEL_REDIRECT: HeaderName = HeaderName::from_static("x-accel-redirect");

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Authenticated upload routes mounted under `/api/v1`.
pub fn api_routes(max_file_upload_size_mib: u64) -> Router<AppState> {
    Router::new()
        .route(
            "/user_uploads",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit(max_file_upload_size_mib))),
        )
        .route("/user_uploads/{realm_id}/{*filename}", get(serve_file_url))
}

/// File serving routes mounted at the root.
pub fn serve_routes_with_state(state: AppState) -> Router<AppState> {
    let viewable = Router::new()
        .route("/user_uploads/{realm_id}/{*filename}", get(serve_file))
        .layer(from_fn_with_state(state.clone(), optional_auth_middleware));

    let downloads = Router::new()
        .route(
            "/user_uploads/download/{realm_id}/{*filename}",
            get(serve_file_download),
        )
        .layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        .route(
            "/user_uploads/temporary/{token}/{filename}",
            get(serve_local_file_unauthed),
        )
        .merge(viewable)
        .merge(downloads)
}

fn body_limit(max_file_upload_size_mib: u64) -> usize {
    usize::try_from(mib_to_bytes(max_file_upload_size_mib))
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES)
}

fn upload_service(state: &AppState) -> UploadService<AttachmentRepository> {
    UploadService::new(
        Arc::clone(&state.upload_backend),
        Arc::new(AttachmentRepository::new((*state.db).clone())),
        state.max_file_upload_size_mib,
    )
}

fn internal_error(err: &axum::http::Error) -> ApiError {
    ApiError(AppError::Internal(err.to_string()))
}

/// Turns a serving decision into the HTTP response.
async fn outcome_response(outcome: ServeOutcome) -> Result<Response, ApiError> {
    match outcome {
        ServeOutcome::AccessUrl(url) => Ok(Json(json!({ "url": url })).into_response()),
        ServeOutcome::Redirect(url) => Ok((StatusCode::FOUND, [(LOCATION, url)]).into_response()),
        ServeOutcome::InternalRedirect {
            path,
            content_disposition,
        } => Response::builder()
            .header(X_ACCEL_REDIRECT, path)
            .header(CONTENT_DISPOSITION, content_disposition)
            .header(CACHE_CONTROL, PRIVATE_IMMUTABLE)
            .body(Body::empty())
            .map_err(|e| internal_error(&e)),
        ServeOutcome::Stream {
            path,
            content_type,
            content_disposition,
        } => {
            let file = tokio::fs::File::open(&path).await.map_err(|e| {
                warn!(path = %path.display(), error = %e, "Upload vanished before streaming");
                ApiError::from(parley_core::upload::UploadError::NotFound)
            })?;
            Response::builder()
                .header(CONTENT_TYPE, content_type)
                .header(CONTENT_DISPOSITION, content_disposition)
                .header(CACHE_CONTROL, PRIVATE_IMMUTABLE)
                .body(Body::from_stream(ReaderStream::new(file)))
                .map_err(|e| internal_error(&e))
        }
    }
}

async fn serve(
    state: &AppState,
    headers: &HeaderMap,
    principal: Principal,
    realm_id_str: &str,
    filename: &str,
    url_only: bool,
    download: bool,
) -> Result<Response, ApiError> {
    let realm = resolve_realm(state, headers).await?;
    let outcome = upload_service(state)
        .serve_file(
            &principal,
            RealmId::from_uuid(realm.id),
            realm_id_str,
            filename,
            url_only,
            download,
        )
        .await?;
    outcome_response(outcome).await
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/user_uploads/{realm_id}/{*filename}`
/// View a file; logged-out visitors see web-public files.
async fn serve_file(
    State(state): State<AppState>,
    auth: MaybeAuthUser,
    headers: HeaderMap,
    Path((realm_id_str, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    serve(
        &state,
        &headers,
        auth.principal(),
        &realm_id_str,
        &filename,
        false,
        false,
    )
    .await
}

/// GET `/user_uploads/download/{realm_id}/{*filename}`
/// Same as viewing, but always served as an attachment.
async fn serve_file_download(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path((realm_id_str, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    serve(
        &state,
        &headers,
        auth.principal(),
        &realm_id_str,
        &filename,
        false,
        true,
    )
    .await
}

/// GET `/api/v1/user_uploads/{realm_id}/{*filename}`
/// Returns a short-lived URL instead of the file.
async fn serve_file_url(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path((realm_id_str, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    serve(
        &state,
        &headers,
        auth.principal(),
        &realm_id_str,
        &filename,
        true,
        false,
    )
    .await
}

/// GET `/user_uploads/temporary/{token}/{filename}`
/// Serves a local file to whoever holds a valid access token.
async fn serve_local_file_unauthed(
    State(state): State<AppState>,
    Path((token, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let outcome = upload_service(&state)
        .serve_local_file_unauthed(&token, &filename)
        .await?;
    outcome_response(outcome).await
}

/// POST `/api/v1/user_uploads`
/// Stores the single file of a multipart request.
async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResult>, ApiError> {
    let limit_mib = state.max_file_upload_size_mib;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, limit_mib))?
    {
        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(ToString::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(&e, limit_mib))?;
        files.push(UploadedFile {
            file_name,
            content_type,
            data,
        });
    }

    let realm = RealmRepository::new((*state.db).clone())
        .find_by_id(auth.realm_id().into_inner())
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound("Realm not found".to_string())))?;
    let realm = RealmContext {
        id: RealmId::from_uuid(realm.id),
        upload_quota_bytes: realm.upload_quota_bytes,
    };

    let result = upload_service(&state)
        .upload_file(auth.user_id(), &realm, files)
        .await?;

    info!(
        user_id = %auth.user_id(),
        realm_id = %realm.id,
        path_id = %result.path_id,
        backend = state.upload_backend.name(),
        "File uploaded"
    );

    Ok(Json(result))
}
