//! End-to-end upload and serving flow against a real database.
//!
//! Runs against a migrated database named by `DATABASE_URL` and is skipped
//! when it is unset.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use http_body_util::BodyExt;
use parley_api::{AppState, create_router};
use parley_core::upload::{AccessTokenSigner, LocalUploadBackend, UploadBackend};
use parley_db::{RealmRepository, UserRepository};
use parley_shared::config::default_inline_mime_types;
use parley_shared::{JwtConfig, JwtService};
use sea_orm::Database;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "parley-test-boundary";

struct TestApp {
    _dir: tempfile::TempDir,
    app: Router,
    host: String,
    owner_auth: String,
    stranger_auth: String,
}

async fn setup() -> Option<TestApp> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to database");

    let subdomain = format!("up-{}", &Uuid::new_v4().simple().to_string()[..12]);
    let realm = RealmRepository::new(db.clone())
        .create("Upload Flow", &subdomain, None)
        .await
        .expect("Failed to create realm");
    let users = UserRepository::new(db.clone());
    let owner = users
        .create(realm.id, &format!("owner-{}@example.com", Uuid::new_v4()), "Owner", "member")
        .await
        .expect("Failed to create user");
    let stranger = users
        .create(realm.id, &format!("other-{}@example.com", Uuid::new_v4()), "Other", "member")
        .await
        .expect("Failed to create user");

    let dir = tempfile::tempdir().expect("tempdir");
    let signer = AccessTokenSigner::new("upload-secret", Duration::from_secs(60)).unwrap();
    let backend =
        LocalUploadBackend::new(dir.path(), signer, false, default_inline_mime_types()).unwrap();
    let jwt_service = JwtService::new(JwtConfig::default());
    let owner_auth = format!(
        "Bearer {}",
        jwt_service
            .generate_access_token(owner.id, realm.id, "member")
            .unwrap()
    );
    let stranger_auth = format!(
        "Bearer {}",
        jwt_service
            .generate_access_token(stranger.id, realm.id, "member")
            .unwrap()
    );

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        upload_backend: Arc::new(UploadBackend::Local(backend)),
        max_file_upload_size_mib: 1,
        external_host: "localhost:8080".to_string(),
    };

    Some(TestApp {
        _dir: dir,
        app: create_router(state),
        host: format!("{subdomain}.localhost:8080"),
        owner_auth,
        stranger_auth,
    })
}

fn multipart_body(file_name: &str, data: &str) -> Body {
    Body::from(format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n{data}\r\n--{BOUNDARY}--\r\n"
    ))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_upload_then_serve() {
    let Some(t) = setup().await else { return };

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/user_uploads")
                .header("host", &t.host)
                .header(AUTHORIZATION, &t.owner_auth)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(multipart_body("notes.txt", "hello"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let uri = body_json(response).await["uri"]
        .as_str()
        .expect("uri")
        .to_string();
    assert!(uri.starts_with("/user_uploads/"));
    assert!(uri.ends_with("/notes.txt"));

    let owner_view = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header("host", &t.host)
                .header(AUTHORIZATION, &t.owner_auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(owner_view.status(), StatusCode::OK);
    assert!(owner_view.headers().contains_key("x-accel-redirect"));

    let stranger_view = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header("host", &t.host)
                .header(AUTHORIZATION, &t.stranger_auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(stranger_view.status(), StatusCode::FORBIDDEN);

    let anonymous_view = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(&uri)
                .header("host", &t.host)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(anonymous_view.status(), StatusCode::FORBIDDEN);

    let url_only = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1{uri}"))
                .header("host", &t.host)
                .header(AUTHORIZATION, &t.owner_auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(url_only.status(), StatusCode::OK);
    let temporary = body_json(url_only).await["url"]
        .as_str()
        .expect("url")
        .to_string();
    assert!(temporary.starts_with("/user_uploads/temporary/"));
    assert_ne!(temporary, uri);

    let via_token = t
        .app
        .oneshot(
            Request::builder()
                .uri(&temporary)
                .header("host", &t.host)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(via_token.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_without_file_rejected() {
    let Some(t) = setup().await else { return };

    let response = t
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/user_uploads")
                .header("host", &t.host)
                .header(AUTHORIZATION, &t.owner_auth)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(format!("--{BOUNDARY}--\r\n")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "You must specify a file to upload"
    );
}
