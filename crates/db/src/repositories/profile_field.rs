//! Custom profile field repository for database operations.
//!
//! Stores realm field definitions and per-user values using SeaORM.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{custom_profile_field_values, custom_profile_fields, users};
use parley_core::profile_field::{
    CustomProfileField, NewProfileField, ProfileFieldError,
    ProfileFieldRepository as ProfileFieldRepoTrait, ProfileFieldType, ProfileFieldValue,
    RealmUser,
};
use parley_shared::types::{ProfileFieldId, RealmId, UserId};

/// Profile field repository implementation.
#[derive(Debug, Clone)]
pub struct ProfileFieldRepository {
    db: DatabaseConnection,
}

impl ProfileFieldRepository {
    /// Create a new profile field repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl ProfileFieldRepoTrait for ProfileFieldRepository {
    async fn create_field(
        &self,
        input: NewProfileField,
    ) -> Result<CustomProfileField, ProfileFieldError> {
        let active_model = custom_profile_fields::ActiveModel {
            id: Set(ProfileFieldId::new().into_inner()),
            realm_id: Set(input.realm_id.into_inner()),
            name: Set(input.name),
            hint: Set(input.hint),
            order: Set(input.order),
            display_in_profile_summary: Set(input.display_in_profile_summary),
            field_type: Set(input.field_type.as_i16()),
            field_data: Set(input.field_data),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                ProfileFieldError::DuplicateName
            } else {
                repository_error(&e)
            }
        })?;

        to_domain(model)
    }

    async fn find_field(
        &self,
        realm_id: RealmId,
        field_id: ProfileFieldId,
    ) -> Result<Option<CustomProfileField>, ProfileFieldError> {
        let model = custom_profile_fields::Entity::find_by_id(field_id.into_inner())
            .filter(custom_profile_fields::Column::RealmId.eq(realm_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        model.map(to_domain).transpose()
    }

    async fn list_fields(
        &self,
        realm_id: RealmId,
    ) -> Result<Vec<CustomProfileField>, ProfileFieldError> {
        let models = custom_profile_fields::Entity::find()
            .filter(custom_profile_fields::Column::RealmId.eq(realm_id.into_inner()))
            .order_by_asc(custom_profile_fields::Column::Order)
            .all(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        models.into_iter().map(to_domain).collect()
    }

    async fn field_name_exists(
        &self,
        realm_id: RealmId,
        name: &str,
    ) -> Result<bool, ProfileFieldError> {
        let count = custom_profile_fields::Entity::find()
            .filter(custom_profile_fields::Column::RealmId.eq(realm_id.into_inner()))
            .filter(custom_profile_fields::Column::Name.eq(name))
            .count(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        Ok(count > 0)
    }

    async fn count_summary_fields(&self, realm_id: RealmId) -> Result<u64, ProfileFieldError> {
        custom_profile_fields::Entity::find()
            .filter(custom_profile_fields::Column::RealmId.eq(realm_id.into_inner()))
            .filter(custom_profile_fields::Column::DisplayInProfileSummary.eq(true))
            .count(&self.db)
            .await
            .map_err(|e| repository_error(&e))
    }

    async fn delete_field(
        &self,
        realm_id: RealmId,
        field_id: ProfileFieldId,
    ) -> Result<bool, ProfileFieldError> {
        let result = custom_profile_fields::Entity::delete_many()
            .filter(custom_profile_fields::Column::Id.eq(field_id.into_inner()))
            .filter(custom_profile_fields::Column::RealmId.eq(realm_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        Ok(result.rows_affected > 0)
    }

    async fn find_realm_users(
        &self,
        realm_id: RealmId,
        user_ids: &[UserId],
    ) -> Result<Vec<RealmUser>, ProfileFieldError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = users::Entity::find()
            .filter(users::Column::RealmId.eq(realm_id.into_inner()))
            .filter(users::Column::Id.is_in(user_ids.iter().map(|id| id.into_inner())))
            .all(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        Ok(models
            .into_iter()
            .map(|user| RealmUser {
                id: UserId::from_uuid(user.id),
                is_active: user.is_active,
                is_bot: user.is_bot,
            })
            .collect())
    }

    async fn upsert_values(&self, values: Vec<ProfileFieldValue>) -> Result<(), ProfileFieldError> {
        if values.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await.map_err(|e| repository_error(&e))?;

        for value in values {
            let active_model = custom_profile_field_values::ActiveModel {
                id: Set(Uuid::now_v7()),
                user_id: Set(value.user_id.into_inner()),
                field_id: Set(value.field_id.into_inner()),
                value: Set(value.value),
                rendered_value: Set(value.rendered_value),
                updated_at: Set(Utc::now().into()),
            };

            custom_profile_field_values::Entity::insert(active_model)
                .on_conflict(
                    OnConflict::columns([
                        custom_profile_field_values::Column::UserId,
                        custom_profile_field_values::Column::FieldId,
                    ])
                    .update_columns([
                        custom_profile_field_values::Column::Value,
                        custom_profile_field_values::Column::RenderedValue,
                        custom_profile_field_values::Column::UpdatedAt,
                    ])
                    .to_owned(),
                )
                .exec(&txn)
                .await
                .map_err(|e| repository_error(&e))?;
        }

        txn.commit().await.map_err(|e| repository_error(&e))
    }

    async fn delete_values(
        &self,
        user_id: UserId,
        field_ids: &[ProfileFieldId],
    ) -> Result<u64, ProfileFieldError> {
        if field_ids.is_empty() {
            return Ok(0);
        }

        let result = custom_profile_field_values::Entity::delete_many()
            .filter(custom_profile_field_values::Column::UserId.eq(user_id.into_inner()))
            .filter(
                custom_profile_field_values::Column::FieldId
                    .is_in(field_ids.iter().map(|id| id.into_inner())),
            )
            .exec(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        Ok(result.rows_affected)
    }

    async fn list_values(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ProfileFieldValue>, ProfileFieldError> {
        let models = custom_profile_field_values::Entity::find()
            .filter(custom_profile_field_values::Column::UserId.eq(user_id.into_inner()))
            .all(&self.db)
            .await
            .map_err(|e| repository_error(&e))?;

        Ok(models
            .into_iter()
            .map(|model| ProfileFieldValue {
                user_id: UserId::from_uuid(model.user_id),
                field_id: ProfileFieldId::from_uuid(model.field_id),
                value: model.value,
                rendered_value: model.rendered_value,
            })
            .collect())
    }
}

fn repository_error(err: &DbErr) -> ProfileFieldError {
    ProfileFieldError::repository(err.to_string())
}

/// Convert database model to domain model.
fn to_domain(model: custom_profile_fields::Model) -> Result<CustomProfileField, ProfileFieldError> {
    let Some(field_type) = ProfileFieldType::from_i16(model.field_type) else {
        tracing::error!(field_id = %model.id, field_type = model.field_type, "Unknown profile field type");
        return Err(ProfileFieldError::repository(format!(
            "unknown field type {}",
            model.field_type
        )));
    };

    Ok(CustomProfileField {
        id: ProfileFieldId::from_uuid(model.id),
        realm_id: RealmId::from_uuid(model.realm_id),
        name: model.name,
        hint: model.hint,
        order: model.order,
        display_in_profile_summary: model.display_in_profile_summary,
        field_type,
        field_data: model.field_data,
    })
}
