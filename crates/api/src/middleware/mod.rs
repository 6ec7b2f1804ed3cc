//! Request middleware and extractors.

pub mod auth;

pub use auth::{AuthUser, MaybeAuthUser, auth_middleware, optional_auth_middleware};
