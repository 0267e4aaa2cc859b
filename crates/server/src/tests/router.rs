use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use axum_extra::extract::cookie::SignedCookieJar;
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::session::start_session;
use crate::config::{AppConfig, ServerConfig, SessionConfig, StorageConfig, UploadConfig};
use crate::database::connection::{DbConfig, DbConnection};
use crate::models::user::UserId;
use crate::server::router::app;
use crate::server::state::AppState;
use crate::tests::storage::InMemoryStorage;

pub(super) fn test_config(database: DbConfig) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            address: "127.0.0.1:0".to_string(),
        },
        database,
        storage: StorageConfig {
            account_id: "account".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket: "studyvault".to_string(),
            presign_expiry_secs: 600,
        },
        session: SessionConfig {
            secret: "test-session-secret-that-is-long-enough".to_string(),
            ..SessionConfig::default()
        },
        uploads: UploadConfig {
            max_file_size: 1024,
        },
    }
}

/// `Cookie` header value carrying a signed session for `user_id`.
pub(super) fn session_cookie(state: &AppState, user_id: UserId) -> String {
    let jar = SignedCookieJar::new(state.session_key.clone());
    let response = start_session(jar, user_id, &state.config.session).into_response();
    cookie_from(&response)
}

pub(super) fn cookie_from(response: &Response) -> String {
    let header = response.headers()[SET_COOKIE].to_str().unwrap();
    header.split(';').next().unwrap().to_string()
}

pub(super) fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// App over a pool that never connects; only routes that skip the database work.
fn offline_app() -> (Router, Arc<AppState>, Arc<InMemoryStorage>) {
    let config = test_config(DbConfig::development("offline", "nobody", "nothing"));
    let db = DbConnection::connect_lazy(&config.database).unwrap();
    let storage = Arc::new(InMemoryStorage::default());
    let state = Arc::new(AppState::new(config, db, storage.clone()));
    (app(state.clone()), state, storage)
}

#[tokio::test]
async fn health_check() {
    let (app, _, _) = offline_app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn dashboard_requires_session() {
    let (app, _, _) = offline_app();
    let response = app
        .clone()
        .oneshot(Request::get("/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(form_request("/dashboard", "intent=load-more", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_session_is_rejected() {
    let (app, state, _) = offline_app();
    let cookie = session_cookie(&state, 7);
    let (name, value) = cookie.split_once('=').unwrap();
    let mut tampered: Vec<char> = value.chars().collect();
    tampered[0] = if tampered[0] == 'A' { 'B' } else { 'A' };
    let tampered = format!("{name}={}", tampered.into_iter().collect::<String>());

    let response = app
        .oneshot(
            Request::get("/dashboard")
                .header(COOKIE, tampered)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upload_url_is_scoped_to_the_user() {
    let (app, state, _) = offline_app();
    let cookie = session_cookie(&state, 7);
    let response = app
        .oneshot(form_request(
            "/dashboard",
            "intent=get-upload-url&fileName=My%20Notes.pdf&fileSize=512&contentType=application%2Fpdf",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let file_key = body["fileKey"].as_str().unwrap();
    assert!(file_key.starts_with("user-7/"));
    assert!(file_key.ends_with("-My_Notes.pdf"));
    assert!(body["uploadUrl"].as_str().unwrap().contains(file_key));
    assert!(body["expiresAt"].is_string());
}

#[tokio::test]
async fn upload_url_rejects_bad_files() {
    let (app, state, _) = offline_app();
    let cookie = session_cookie(&state, 7);
    for body in [
        "intent=get-upload-url&fileName=big.pdf&fileSize=4096&contentType=application%2Fpdf",
        "intent=get-upload-url&fileName=tool.exe&fileSize=10&contentType=application%2Foctet-stream",
        "intent=get-upload-url&fileName=notes.pdf&fileSize=10&contentType=image%2Fpng",
        "intent=get-upload-url&fileName=empty.pdf&fileSize=0&contentType=application%2Fpdf",
    ] {
        let response = app
            .clone()
            .oneshot(form_request("/dashboard", body, Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert!(json_body(response).await["error"].is_string());
    }
}

#[tokio::test]
async fn confirm_requires_uploaded_object() {
    let (app, state, storage) = offline_app();
    let cookie = session_cookie(&state, 7);
    let body = "intent=confirm-upload&fileKey=user-7%2F1-os.pdf&fileSize=10&title=OS\
                &subject=Systems&semester=4&resourceType=notes&isPublic=true";

    let response = app
        .clone()
        .oneshot(form_request("/dashboard", body, Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    storage.put("user-7/1-os.pdf", b"short");
    let response = app
        .oneshot(form_request("/dashboard", body, Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn confirm_rejects_foreign_keys() {
    let (app, state, storage) = offline_app();
    storage.put("user-8/1-os.pdf", b"0123456789");
    let cookie = session_cookie(&state, 7);
    let response = app
        .oneshot(form_request(
            "/dashboard",
            "intent=confirm-upload&fileKey=user-8%2F1-os.pdf&fileSize=10&title=OS\
             &subject=Systems&semester=4&resourceType=notes",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_intent_is_rejected() {
    let (app, state, _) = offline_app();
    let cookie = session_cookie(&state, 7);
    let response = app
        .oneshot(form_request("/dashboard", "intent=explode", Some(&cookie)))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn malformed_resource_ids_redirect() {
    let (app, _, _) = offline_app();
    for uri in ["/resources/abc", "/resources/0/download"] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_redirection(), "{uri}");
        assert_eq!(response.headers()["location"], "/resources");
    }
}
