//! Core business logic for Parley.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Domain types, validation rules and the storage abstraction live here.
//!
//! # Modules
//!
//! - `profile_field` - Custom profile field schema, registry and validators
//! - `upload` - File upload, authorization and serving
//! - `storage` - Object storage through OpenDAL

pub mod profile_field;
pub mod storage;
pub mod upload;
