//! Profile field service: definitions and per-user values.

use std::collections::HashMap;
use std::sync::Arc;

use parley_shared::types::{ProfileFieldId, RealmId, UserId};
use serde_json::Value;

use super::error::ProfileFieldError;
use super::registry::FieldValidator;
use super::render::render_markdown;
use super::types::{
    CreateProfileFieldInput, CustomProfileField, HINT_MAX_LENGTH,
    MAX_DISPLAY_IN_PROFILE_SUMMARY_FIELDS, NAME_MAX_LENGTH, NewProfileField, ProfileDataEntry,
    ProfileDataUpdate, ProfileFieldValue, RealmUser, RealmUserIndex,
};
use super::validators::{parse_user_ids, validate_field_data};

/// Repository trait for profile field persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait ProfileFieldRepository: Send + Sync {
    /// Insert a field definition.
    fn create_field(
        &self,
        input: NewProfileField,
    ) -> impl std::future::Future<Output = Result<CustomProfileField, ProfileFieldError>> + Send;

    /// Find a field of a realm.
    fn find_field(
        &self,
        realm_id: RealmId,
        field_id: ProfileFieldId,
    ) -> impl std::future::Future<Output = Result<Option<CustomProfileField>, ProfileFieldError>> + Send;

    /// All fields of a realm ordered by `order`.
    fn list_fields(
        &self,
        realm_id: RealmId,
    ) -> impl std::future::Future<Output = Result<Vec<CustomProfileField>, ProfileFieldError>> + Send;

    /// Whether the realm already has a field with this name.
    fn field_name_exists(
        &self,
        realm_id: RealmId,
        name: &str,
    ) -> impl std::future::Future<Output = Result<bool, ProfileFieldError>> + Send;

    /// Number of fields shown in profile summaries.
    fn count_summary_fields(
        &self,
        realm_id: RealmId,
    ) -> impl std::future::Future<Output = Result<u64, ProfileFieldError>> + Send;

    /// Delete a field and, by cascade, its values.
    fn delete_field(
        &self,
        realm_id: RealmId,
        field_id: ProfileFieldId,
    ) -> impl std::future::Future<Output = Result<bool, ProfileFieldError>> + Send;

    /// The given users, restricted to the realm.
    fn find_realm_users(
        &self,
        realm_id: RealmId,
        user_ids: &[UserId],
    ) -> impl std::future::Future<Output = Result<Vec<RealmUser>, ProfileFieldError>> + Send;

    /// Insert or replace the value of each (user, field) pair. Either all
    /// values are stored or none are.
    fn upsert_values(
        &self,
        values: Vec<ProfileFieldValue>,
    ) -> impl std::future::Future<Output = Result<(), ProfileFieldError>> + Send;

    /// Delete a user's values for the given fields.
    fn delete_values(
        &self,
        user_id: UserId,
        field_ids: &[ProfileFieldId],
    ) -> impl std::future::Future<Output = Result<u64, ProfileFieldError>> + Send;

    /// All values of a user.
    fn list_values(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<ProfileFieldValue>, ProfileFieldError>> + Send;
}

/// Service for realm profile field schemas and user profile data.
pub struct ProfileFieldService<R: ProfileFieldRepository> {
    repo: Arc<R>,
}

impl<R: ProfileFieldRepository> ProfileFieldService<R> {
    /// Create a new profile field service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Validates a value for a field and returns the string to store.
    ///
    /// USER fields are stored as a JSON list; every other type stores the
    /// submitted string.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the value does not fit the field type.
    pub async fn validate_value(
        &self,
        field: &CustomProfileField,
        value: &Value,
        allow_deactivated: bool,
    ) -> Result<String, ProfileFieldError> {
        match field.field_type.entry().validator {
            FieldValidator::Plain(validate) => {
                validate(&field.name, value)?;
            }
            FieldValidator::WithConfig(validate) => {
                validate(&field.name, &field.field_data, value)?;
            }
            FieldValidator::RealmScoped(validate) => {
                let requested = parse_user_ids(value)?;
                let users: RealmUserIndex = self
                    .repo
                    .find_realm_users(field.realm_id, &requested)
                    .await?
                    .into_iter()
                    .collect();
                let user_ids = validate(&users, value, allow_deactivated)?;
                return serde_json::to_string(&user_ids)
                    .map_err(|e| ProfileFieldError::repository(e.to_string()));
            }
        }

        value
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| ProfileFieldError::validation(format!("{} is not a string", field.name)))
    }

    /// Creates a field definition at the end of the realm's list.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller is not a realm administrator
    /// - Name or hint are invalid, or the name is taken
    /// - `field_data` does not fit the field type
    /// - The profile summary already shows the maximum number of fields
    pub async fn create_field(
        &self,
        realm_id: RealmId,
        is_admin: bool,
        input: CreateProfileFieldInput,
    ) -> Result<CustomProfileField, ProfileFieldError> {
        if !is_admin {
            return Err(ProfileFieldError::AdminRequired);
        }

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ProfileFieldError::validation("Label cannot be blank."));
        }
        if name.chars().count() > NAME_MAX_LENGTH {
            return Err(ProfileFieldError::validation(format!(
                "name is too long (limit: {NAME_MAX_LENGTH} characters)"
            )));
        }
        if input.hint.chars().count() > HINT_MAX_LENGTH {
            return Err(ProfileFieldError::validation(format!(
                "hint is too long (limit: {HINT_MAX_LENGTH} characters)"
            )));
        }
        validate_field_data(input.field_type, &input.field_data)?;

        if self.repo.field_name_exists(realm_id, &name).await? {
            return Err(ProfileFieldError::DuplicateName);
        }
        if input.display_in_profile_summary
            && self.repo.count_summary_fields(realm_id).await?
                >= MAX_DISPLAY_IN_PROFILE_SUMMARY_FIELDS
        {
            return Err(ProfileFieldError::validation(format!(
                "Only {MAX_DISPLAY_IN_PROFILE_SUMMARY_FIELDS} custom profile fields can be displayed in the profile summary."
            )));
        }

        let order = self
            .repo
            .list_fields(realm_id)
            .await?
            .iter()
            .map(|field| field.order)
            .max()
            .map_or(0, |max| max + 1);

        self.repo
            .create_field(NewProfileField {
                realm_id,
                name,
                hint: input.hint,
                order,
                display_in_profile_summary: input.display_in_profile_summary,
                field_type: input.field_type,
                field_data: input.field_data,
            })
            .await
    }

    /// Fields of a realm ordered by `order`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list_fields(
        &self,
        realm_id: RealmId,
    ) -> Result<Vec<CustomProfileField>, ProfileFieldError> {
        self.repo.list_fields(realm_id).await
    }

    /// Deletes a field together with all its values.
    ///
    /// # Errors
    ///
    /// Returns `AdminRequired` for non-administrators and `NotFound` when the
    /// realm has no such field.
    pub async fn delete_field(
        &self,
        realm_id: RealmId,
        is_admin: bool,
        field_id: ProfileFieldId,
    ) -> Result<(), ProfileFieldError> {
        if !is_admin {
            return Err(ProfileFieldError::AdminRequired);
        }
        if self.repo.delete_field(realm_id, field_id).await? {
            Ok(())
        } else {
            Err(ProfileFieldError::NotFound(field_id))
        }
    }

    /// Sets the caller's values for several fields.
    ///
    /// Every value is validated before anything is written, and the values
    /// are stored together.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for unknown fields or values that do not fit, and
    /// `Repository` if storing fails.
    pub async fn update_user_data(
        &self,
        realm_id: RealmId,
        user_id: UserId,
        updates: Vec<ProfileDataUpdate>,
    ) -> Result<(), ProfileFieldError> {
        let fields: HashMap<ProfileFieldId, CustomProfileField> = self
            .repo
            .list_fields(realm_id)
            .await?
            .into_iter()
            .map(|field| (field.id, field))
            .collect();

        let mut validated = Vec::with_capacity(updates.len());
        for update in updates {
            let field = fields.get(&update.id).ok_or_else(|| {
                ProfileFieldError::validation(format!("Field id {} not found.", update.id))
            })?;
            let value = self.validate_value(field, &update.value, false).await?;
            let rendered_value = field.is_renderable().then(|| render_markdown(&value));
            validated.push(ProfileFieldValue {
                user_id,
                field_id: field.id,
                value,
                rendered_value,
            });
        }

        self.repo.upsert_values(validated).await
    }

    /// Clears the caller's values for the given fields.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when a field does not belong to the realm.
    pub async fn remove_user_data(
        &self,
        realm_id: RealmId,
        user_id: UserId,
        field_ids: &[ProfileFieldId],
    ) -> Result<u64, ProfileFieldError> {
        for &field_id in field_ids {
            if self.repo.find_field(realm_id, field_id).await?.is_none() {
                return Err(ProfileFieldError::validation(format!(
                    "Field id {field_id} not found."
                )));
            }
        }
        self.repo.delete_values(user_id, field_ids).await
    }

    /// A user's values, converted per field type, in field order.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails or a stored value is corrupt.
    pub async fn user_profile_data(
        &self,
        realm_id: RealmId,
        user_id: UserId,
    ) -> Result<Vec<ProfileDataEntry>, ProfileFieldError> {
        let mut values: HashMap<ProfileFieldId, ProfileFieldValue> = self
            .repo
            .list_values(user_id)
            .await?
            .into_iter()
            .map(|value| (value.field_id, value))
            .collect();

        let mut entries = Vec::new();
        for field in self.repo.list_fields(realm_id).await? {
            let Some(stored) = values.remove(&field.id) else {
                continue;
            };
            entries.push(ProfileDataEntry {
                id: field.id,
                value: field.field_type.entry().converter.convert(&stored.value)?,
                rendered_value: stored.rendered_value,
            });
        }
        Ok(entries)
    }
}
