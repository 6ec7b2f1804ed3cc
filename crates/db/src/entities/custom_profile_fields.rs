//! `SeaORM` Entity for custom_profile_fields table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "custom_profile_fields")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub realm_id: Uuid,
    pub name: String,
    pub hint: String,
    #[sea_orm(column_name = "field_order")]
    pub order: i32,
    pub display_in_profile_summary: bool,
    pub field_type: i16,
    #[sea_orm(column_type = "Text")]
    pub field_data: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::realms::Entity",
        from = "Column::RealmId",
        to = "super::realms::Column::Id"
    )]
    Realms,
    #[sea_orm(has_many = "super::custom_profile_field_values::Entity")]
    CustomProfileFieldValues,
}

impl Related<super::realms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Realms.def()
    }
}

impl Related<super::custom_profile_field_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomProfileFieldValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
