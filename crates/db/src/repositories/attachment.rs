//! Attachment repository for database operations.
//!
//! Implements upload bookkeeping using SeaORM.
//!
//! Sharing an upload (adding recipients, making it realm or web public) is
//! done by the messaging layer when a message referencing the file is sent.
//! This service has no endpoint for it; `add_recipient`, `set_visibility`
//! and `delete` are the hooks that layer calls, and the tests use them to
//! set up access fixtures.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QuerySelect, Set,
};

use crate::entities::{attachment_recipients, attachments};
use parley_core::upload::{
    Attachment, CreateAttachmentInput, UploadError, UploadRepository as UploadRepoTrait,
};
use parley_shared::types::{AttachmentId, RealmId, UserId};

/// Attachment repository implementation.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Record that a user received an attachment. Called by the messaging
    /// layer on delivery.
    ///
    /// Adding the same recipient twice is a no-op.
    pub async fn add_recipient(
        &self,
        attachment_id: AttachmentId,
        user_id: UserId,
    ) -> Result<(), UploadError> {
        let active_model = attachment_recipients::ActiveModel {
            attachment_id: Set(attachment_id.into_inner()),
            user_id: Set(user_id.into_inner()),
            created_at: Set(Utc::now().into()),
        };

        attachment_recipients::Entity::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    attachment_recipients::Column::AttachmentId,
                    attachment_recipients::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await
            .map_err(|e| UploadError::repository(e.to_string()))?;

        Ok(())
    }

    /// Change who besides owner and recipients may see an attachment. Called
    /// by the messaging layer when the file is shared with the realm or the web.
    pub async fn set_visibility(
        &self,
        attachment_id: AttachmentId,
        is_realm_public: bool,
        is_web_public: bool,
    ) -> Result<Attachment, UploadError> {
        let model = attachments::Entity::find_by_id(attachment_id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| UploadError::repository(e.to_string()))?
            .ok_or(UploadError::NotFound)?;

        let mut active_model = model.into_active_model();
        active_model.is_realm_public = Set(is_realm_public);
        active_model.is_web_public = Set(is_web_public);

        let model = active_model
            .update(&self.db)
            .await
            .map_err(|e| UploadError::repository(e.to_string()))?;

        Ok(to_domain(model))
    }

    /// Delete an attachment record.
    pub async fn delete(&self, attachment_id: AttachmentId) -> Result<bool, UploadError> {
        let result = attachments::Entity::delete_by_id(attachment_id.into_inner())
            .exec(&self.db)
            .await
            .map_err(|e| UploadError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

impl UploadRepoTrait for AttachmentRepository {
    async fn find_by_path_id(&self, path_id: &str) -> Result<Option<Attachment>, UploadError> {
        let model = attachments::Entity::find()
            .filter(attachments::Column::PathId.eq(path_id))
            .one(&self.db)
            .await
            .map_err(|e| UploadError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn is_recipient(
        &self,
        attachment_id: AttachmentId,
        user_id: UserId,
    ) -> Result<bool, UploadError> {
        let count: u64 = attachment_recipients::Entity::find()
            .filter(attachment_recipients::Column::AttachmentId.eq(attachment_id.into_inner()))
            .filter(attachment_recipients::Column::UserId.eq(user_id.into_inner()))
            .count(&self.db)
            .await
            .map_err(|e| UploadError::repository(e.to_string()))?;

        Ok(count > 0)
    }

    async fn used_upload_space(&self, realm_id: RealmId) -> Result<i64, UploadError> {
        let used: Option<i64> = attachments::Entity::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(size), 0)::BIGINT"), "used")
            .filter(attachments::Column::RealmId.eq(realm_id.into_inner()))
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(|e| UploadError::repository(e.to_string()))?;

        Ok(used.unwrap_or(0))
    }

    async fn create(&self, input: CreateAttachmentInput) -> Result<Attachment, UploadError> {
        let active_model = attachments::ActiveModel {
            id: Set(AttachmentId::new().into_inner()),
            path_id: Set(input.path_id),
            realm_id: Set(input.realm_id.into_inner()),
            owner_id: Set(input.owner_id.into_inner()),
            file_name: Set(input.file_name),
            size: Set(input.size),
            content_type: Set(input.content_type),
            is_realm_public: Set(false),
            is_web_public: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| UploadError::repository(e.to_string()))?;

        Ok(to_domain(model))
    }
}

/// Convert database model to domain model.
fn to_domain(model: attachments::Model) -> Attachment {
    Attachment {
        id: AttachmentId::from_uuid(model.id),
        path_id: model.path_id,
        realm_id: RealmId::from_uuid(model.realm_id),
        owner_id: UserId::from_uuid(model.owner_id),
        file_name: model.file_name,
        size: model.size,
        content_type: model.content_type,
        is_realm_public: model.is_realm_public,
        is_web_public: model.is_web_public,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
