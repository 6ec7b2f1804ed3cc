//! Initial database migration.
//!
//! Creates realms, users, custom profile fields with their values, and
//! uploaded attachments with their recipients.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: TENANCY
        // ============================================================
        db.execute_unprepared(REALMS_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 2: CUSTOM PROFILE FIELDS
        // ============================================================
        db.execute_unprepared(CUSTOM_PROFILE_FIELDS_SQL).await?;
        db.execute_unprepared(CUSTOM_PROFILE_FIELD_VALUES_SQL).await?;

        // ============================================================
        // PART 3: UPLOADS
        // ============================================================
        db.execute_unprepared(ATTACHMENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const REALMS_SQL: &str = r"
CREATE TABLE realms (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    subdomain VARCHAR(63) NOT NULL UNIQUE,
    upload_quota_bytes BIGINT,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_upload_quota_positive CHECK (upload_quota_bytes IS NULL OR upload_quota_bytes >= 0)
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    realm_id UUID NOT NULL REFERENCES realms(id) ON DELETE CASCADE,
    email VARCHAR(255) NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    role VARCHAR(20) NOT NULL DEFAULT 'member',
    is_active BOOLEAN NOT NULL DEFAULT true,
    is_bot BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_users_realm_email UNIQUE (realm_id, email),
    CONSTRAINT chk_users_role CHECK (role IN ('owner', 'admin', 'member', 'guest'))
);

CREATE INDEX idx_users_realm ON users(realm_id);
";

const CUSTOM_PROFILE_FIELDS_SQL: &str = r"
CREATE TABLE custom_profile_fields (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    realm_id UUID NOT NULL REFERENCES realms(id) ON DELETE CASCADE,
    name VARCHAR(40) NOT NULL,
    hint VARCHAR(80) NOT NULL DEFAULT '',
    field_order INTEGER NOT NULL,
    display_in_profile_summary BOOLEAN NOT NULL DEFAULT false,
    field_type SMALLINT NOT NULL,
    field_data TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_custom_profile_fields_realm_name UNIQUE (realm_id, name),
    CONSTRAINT chk_field_type CHECK (field_type BETWEEN 1 AND 8)
);

CREATE INDEX idx_custom_profile_fields_realm_order ON custom_profile_fields(realm_id, field_order);
";

const CUSTOM_PROFILE_FIELD_VALUES_SQL: &str = r"
CREATE TABLE custom_profile_field_values (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    field_id UUID NOT NULL REFERENCES custom_profile_fields(id) ON DELETE CASCADE,
    value TEXT NOT NULL,
    rendered_value TEXT,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_custom_profile_field_values_user_field UNIQUE (user_id, field_id)
);

CREATE INDEX idx_custom_profile_field_values_field ON custom_profile_field_values(field_id);
";

const ATTACHMENTS_SQL: &str = r"
CREATE TABLE attachments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    path_id TEXT NOT NULL UNIQUE,
    realm_id UUID NOT NULL REFERENCES realms(id) ON DELETE CASCADE,
    owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    file_name TEXT NOT NULL,
    size BIGINT NOT NULL,
    content_type VARCHAR(255) NOT NULL,
    is_realm_public BOOLEAN NOT NULL DEFAULT false,
    is_web_public BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_attachment_size CHECK (size >= 0)
);

CREATE INDEX idx_attachments_realm ON attachments(realm_id);

CREATE TABLE attachment_recipients (
    attachment_id UUID NOT NULL REFERENCES attachments(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (attachment_id, user_id)
);
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- ============================================================
DROP TABLE IF EXISTS attachment_recipients CASCADE;
DROP TABLE IF EXISTS attachments CASCADE;
DROP TABLE IF EXISTS custom_profile_field_values CASCADE;
DROP TABLE IF EXISTS custom_profile_fields CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS realms CASCADE;
";
