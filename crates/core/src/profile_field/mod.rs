//! Custom profile fields.
//!
//! Realms define their own profile fields; users fill them in. Each field
//! type is described by an entry of a static registry that says how values
//! of that type are validated and converted.
//!
//! # Modules
//!
//! - `types` - Field definitions, values and the numeric field types
//! - `registry` - Field type registry (display name, validator, converter, keyword)
//! - `validators` - Value and `field_data` validators
//! - `render` - Markdown rendering for text fields
//! - `service` - Field management and profile data over a repository

pub mod error;
pub mod registry;
pub mod render;
pub mod service;
pub mod types;
pub mod validators;

#[cfg(test)]
mod validators_props;

pub use error::ProfileFieldError;
pub use registry::{FieldTypeEntry, FieldValidator, ValueConverter, field_type_choices};
pub use service::{ProfileFieldRepository, ProfileFieldService};
pub use types::{
    CreateProfileFieldInput, CustomProfileField, NewProfileField, ProfileDataEntry,
    ProfileDataUpdate, ProfileFieldDict, ProfileFieldType, ProfileFieldValue, RealmUser,
    RealmUserIndex,
};
