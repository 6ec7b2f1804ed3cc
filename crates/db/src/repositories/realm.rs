//! Realm repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::realms;

/// Realm repository for tenant lookups.
#[derive(Debug, Clone)]
pub struct RealmRepository {
    db: DatabaseConnection,
}

impl RealmRepository {
    /// Creates a new realm repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a realm by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<realms::Model>, DbErr> {
        realms::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds an active realm by subdomain.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<realms::Model>, DbErr> {
        realms::Entity::find()
            .filter(realms::Column::Subdomain.eq(subdomain))
            .filter(realms::Column::IsActive.eq(true))
            .one(&self.db)
            .await
    }

    /// Creates a new realm.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        name: &str,
        subdomain: &str,
        upload_quota_bytes: Option<i64>,
    ) -> Result<realms::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let realm = realms::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            subdomain: Set(subdomain.to_string()),
            upload_quota_bytes: Set(upload_quota_bytes),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        realm.insert(&self.db).await
    }
}
