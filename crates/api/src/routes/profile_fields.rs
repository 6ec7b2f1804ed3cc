//! Custom profile field routes.
//!
//! Realm administrators manage the field schema; every user manages their
//! own values.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use parley_core::profile_field::{
    CreateProfileFieldInput, ProfileDataUpdate, ProfileFieldDict, ProfileFieldService,
    field_type_choices,
};
use parley_db::ProfileFieldRepository;
use parley_shared::types::ProfileFieldId;

/// Creates the profile field routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/realm/profile_fields",
            get(list_profile_fields).post(create_profile_field),
        )
        .route("/realm/profile_fields/{field_id}", delete(delete_profile_field))
        .route(
            "/users/me/profile_data",
            get(get_profile_data)
                .patch(update_profile_data)
                .delete(remove_profile_data),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Body of `PATCH /users/me/profile_data`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileDataRequest {
    /// Values to set.
    pub data: Vec<ProfileDataUpdate>,
}

/// Body of `DELETE /users/me/profile_data`.
#[derive(Debug, Deserialize)]
pub struct RemoveProfileDataRequest {
    /// Fields whose values are removed.
    pub data: Vec<ProfileFieldId>,
}

fn service(state: &AppState) -> ProfileFieldService<ProfileFieldRepository> {
    ProfileFieldService::new(Arc::new(ProfileFieldRepository::new((*state.db).clone())))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/realm/profile_fields`
/// Lists the realm's fields and the available field types.
async fn list_profile_fields(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let fields: Vec<ProfileFieldDict> = service(&state)
        .list_fields(auth.realm_id())
        .await?
        .iter()
        .map(|field| field.as_dict())
        .collect();

    Ok(Json(json!({
        "custom_fields": fields,
        "field_types": field_type_choices(),
    })))
}

/// POST `/realm/profile_fields`
/// Creates a field. Administrators only.
async fn create_profile_field(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateProfileFieldInput>,
) -> Result<impl IntoResponse, ApiError> {
    let field = service(&state)
        .create_field(auth.realm_id(), auth.is_realm_admin(), payload)
        .await?;

    info!(
        realm_id = %auth.realm_id(),
        field_id = %field.id,
        field_type = %field.field_type,
        "Custom profile field created"
    );

    Ok((StatusCode::CREATED, Json(json!({ "id": field.id }))))
}

/// DELETE `/realm/profile_fields/{field_id}`
/// Deletes a field and every value stored for it. Administrators only.
async fn delete_profile_field(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(field_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let field_id = ProfileFieldId::from_uuid(field_id);
    service(&state)
        .delete_field(auth.realm_id(), auth.is_realm_admin(), field_id)
        .await?;

    info!(realm_id = %auth.realm_id(), field_id = %field_id, "Custom profile field deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// GET `/users/me/profile_data`
/// The caller's values in field order.
async fn get_profile_data(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile_data = service(&state)
        .user_profile_data(auth.realm_id(), auth.user_id())
        .await?;

    Ok(Json(json!({ "profile_data": profile_data })))
}

/// PATCH `/users/me/profile_data`
/// Validates and stores the caller's values; nothing is written if any is invalid.
async fn update_profile_data(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileDataRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let count = payload.data.len();
    service(&state)
        .update_user_data(auth.realm_id(), auth.user_id(), payload.data)
        .await?;

    info!(user_id = %auth.user_id(), count, "Profile data updated");

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE `/users/me/profile_data`
/// Removes the caller's values for the given fields.
async fn remove_profile_data(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RemoveProfileDataRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = service(&state)
        .remove_user_data(auth.realm_id(), auth.user_id(), &payload.data)
        .await?;

    Ok(Json(json!({ "removed": removed })))
}
