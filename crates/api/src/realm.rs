//! Realm resolution from the request host.

use axum::http::{HeaderMap, header::HOST};

use crate::{AppState, error::ApiError};
use parley_db::{RealmRepository, entities::realms};
use parley_shared::AppError;

/// Subdomain of `host` under `external_host`.
///
/// The bare external host is the root realm with subdomain `""`. Hosts
/// outside the external host, and nested subdomains, have none.
pub fn subdomain_for_host(host: &str, external_host: &str) -> Option<String> {
    let host = host.trim().to_ascii_lowercase();
    let external_host = external_host.to_ascii_lowercase();

    if host == external_host {
        return Some(String::new());
    }
    host.strip_suffix(&external_host)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .filter(|subdomain| !subdomain.is_empty() && !subdomain.contains('.'))
        .map(ToString::to_string)
}

/// Resolves the active realm addressed by the `Host` header.
///
/// # Errors
///
/// Returns not-found when the host names no realm.
pub async fn resolve_realm(state: &AppState, headers: &HeaderMap) -> Result<realms::Model, ApiError> {
    let not_found = || ApiError(AppError::NotFound("Realm not found".to_string()));

    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(not_found)?;
    let subdomain = subdomain_for_host(host, &state.external_host).ok_or_else(not_found)?;

    RealmRepository::new((*state.db).clone())
        .find_by_subdomain(&subdomain)
        .await?
        .ok_or_else(not_found)
}
