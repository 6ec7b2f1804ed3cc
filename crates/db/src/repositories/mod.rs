//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod attachment;
pub mod profile_field;
pub mod realm;
pub mod user;

pub use attachment::AttachmentRepository;
pub use profile_field::ProfileFieldRepository;
pub use realm::RealmRepository;
pub use user::UserRepository;
