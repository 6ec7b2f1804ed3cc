//! Integration tests for the custom profile field repository.
//!
//! These run against a migrated database named by `DATABASE_URL` and are
//! skipped when it is unset.

use parley_core::profile_field::{
    NewProfileField, ProfileFieldError, ProfileFieldRepository as _, ProfileFieldType,
    ProfileFieldValue,
};
use parley_db::{ProfileFieldRepository, RealmRepository, UserRepository};
use parley_shared::types::{ProfileFieldId, RealmId, UserId};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

async fn connect() -> Option<DatabaseConnection> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(
        Database::connect(&url)
            .await
            .expect("Failed to connect to database"),
    )
}

async fn realm_with_user(db: &DatabaseConnection) -> (RealmId, UserId) {
    let subdomain = format!("realm-{}", &Uuid::new_v4().simple().to_string()[..12]);
    let realm = RealmRepository::new(db.clone())
        .create("Profile Realm", &subdomain, None)
        .await
        .expect("Failed to create realm");
    let user = UserRepository::new(db.clone())
        .create(
            realm.id,
            &format!("test-{}@example.com", Uuid::new_v4()),
            "Test User",
            "member",
        )
        .await
        .expect("Failed to create user");
    (RealmId::from_uuid(realm.id), UserId::from_uuid(user.id))
}

fn new_field(realm_id: RealmId, name: &str, order: i32) -> NewProfileField {
    NewProfileField {
        realm_id,
        name: name.to_string(),
        hint: String::new(),
        order,
        display_in_profile_summary: false,
        field_type: ProfileFieldType::ShortText,
        field_data: String::new(),
    }
}

#[tokio::test]
async fn test_fields_listed_in_order() {
    let Some(db) = connect().await else { return };
    let (realm_id, _) = realm_with_user(&db).await;
    let repo = ProfileFieldRepository::new(db.clone());

    repo.create_field(new_field(realm_id, "Second", 1))
        .await
        .expect("Failed to create field");
    repo.create_field(new_field(realm_id, "First", 0))
        .await
        .expect("Failed to create field");

    let names: Vec<_> = repo
        .list_fields(realm_id)
        .await
        .expect("Query should succeed")
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["First", "Second"]);
    assert!(repo.field_name_exists(realm_id, "First").await.unwrap());
    assert!(!repo.field_name_exists(realm_id, "Third").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_field_name_rejected() {
    let Some(db) = connect().await else { return };
    let (realm_id, _) = realm_with_user(&db).await;
    let repo = ProfileFieldRepository::new(db.clone());

    repo.create_field(new_field(realm_id, "Phone", 0))
        .await
        .expect("Failed to create field");
    let err = repo
        .create_field(new_field(realm_id, "Phone", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ProfileFieldError::DuplicateName));
}

#[tokio::test]
async fn test_upsert_replaces_value_and_delete_cascades() {
    let Some(db) = connect().await else { return };
    let (realm_id, user_id) = realm_with_user(&db).await;
    let repo = ProfileFieldRepository::new(db.clone());
    let field = repo
        .create_field(new_field(realm_id, "Bio", 0))
        .await
        .expect("Failed to create field");

    for value in ["first", "second"] {
        repo.upsert_values(vec![ProfileFieldValue {
            user_id,
            field_id: field.id,
            value: value.to_string(),
            rendered_value: None,
        }])
        .await
        .expect("Failed to upsert value");
    }

    let values = repo.list_values(user_id).await.expect("Query should succeed");
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].value, "second");

    assert!(repo.delete_field(realm_id, field.id).await.unwrap());
    assert!(repo.list_values(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_find_realm_users_scoped_to_realm() {
    let Some(db) = connect().await else { return };
    let (realm_id, user_id) = realm_with_user(&db).await;
    let (_, foreign_user) = realm_with_user(&db).await;
    let repo = ProfileFieldRepository::new(db.clone());

    let users = repo
        .find_realm_users(realm_id, &[user_id, foreign_user])
        .await
        .expect("Query should succeed");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, user_id);
    assert!(users[0].is_active);
}

#[tokio::test]
async fn test_delete_values_only_named_fields() {
    let Some(db) = connect().await else { return };
    let (realm_id, user_id) = realm_with_user(&db).await;
    let repo = ProfileFieldRepository::new(db.clone());
    let keep = repo.create_field(new_field(realm_id, "Keep", 0)).await.unwrap();
    let drop = repo.create_field(new_field(realm_id, "Drop", 1)).await.unwrap();

    repo.upsert_values(
        [&keep, &drop]
            .into_iter()
            .map(|field| ProfileFieldValue {
                user_id,
                field_id: field.id,
                value: "x".to_string(),
                rendered_value: None,
            })
            .collect(),
    )
    .await
    .unwrap();

    let removed = repo.delete_values(user_id, &[drop.id]).await.unwrap();
    assert_eq!(removed, 1);
    let remaining = repo.list_values(user_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].field_id, keep.id);
}

#[tokio::test]
async fn test_upsert_values_all_or_nothing() {
    let Some(db) = connect().await else { return };
    let (realm_id, user_id) = realm_with_user(&db).await;
    let repo = ProfileFieldRepository::new(db.clone());
    let field = repo.create_field(new_field(realm_id, "Phone", 0)).await.unwrap();

    let result = repo
        .upsert_values(vec![
            ProfileFieldValue {
                user_id,
                field_id: field.id,
                value: "555-0100".to_string(),
                rendered_value: None,
            },
            ProfileFieldValue {
                user_id,
                field_id: ProfileFieldId::new(),
                value: "orphan".to_string(),
                rendered_value: None,
            },
        ])
        .await;

    assert!(matches!(result, Err(ProfileFieldError::Repository(_))));
    assert!(repo.list_values(user_id).await.unwrap().is_empty());
}
