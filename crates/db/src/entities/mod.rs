//! `SeaORM` entity definitions.

pub mod attachment_recipients;
pub mod attachments;
pub mod custom_profile_field_values;
pub mod custom_profile_fields;
pub mod realms;
pub mod users;
