use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use quill_core::captcha;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::{AccountConfig, ServerConfig};
use crate::state::AppState;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.auth.token_secret = SECRET.to_string();
    config.accounts = vec![AccountConfig {
        id: 1,
        num: "admin".to_string(),
        passwd: "hunter2".to_string(),
        role: 0,
        name: "Admin".to_string(),
        phone: String::new(),
        email: "admin@example.com".to_string(),
    }];
    config
}

fn test_router_with(config: ServerConfig) -> Router {
    super::router(AppState::new(config).unwrap())
}

fn test_router() -> Router {
    test_router_with(test_config())
}

fn login_body(passwd: &str) -> Value {
    json!({
        "num": "admin",
        "passwd": passwd,
        "vcode": "1234",
        "vreal": captcha::sign("1234", "v.c.o.d.e"),
    })
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn call(app: &Router, req: Request<Body>) -> Value {
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, passwd: &str) -> Value {
    call(app, post_json("/api/auth/login", login_body(passwd), None)).await
}

async fn token(app: &Router) -> String {
    let body = login(app, "hunter2").await;
    assert_eq!(body["success"], true, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_vcode_returns_image_and_signature() {
    let app = test_router();
    let body = call(&app, get("/api/auth/vcode", None)).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["vcode"]
        .as_str()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));
    assert_eq!(body["data"]["vreal"].as_str().unwrap().len(), 27);
}

#[tokio::test]
async fn test_login_success_returns_token() {
    let app = test_router();
    let body = login(&app, "hunter2").await;
    assert_eq!(body["success"], true);
    assert!(!body["data"]["token"].as_str().unwrap().is_empty());
    assert!(body["data"]["expires_at"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_login_accepts_form_body() {
    let app = test_router();
    let form = format!(
        "num=admin&passwd=hunter2&vcode=1234&vreal={}",
        captcha::sign("1234", "v.c.o.d.e")
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let body = call(&app, req).await;
    assert_eq!(body["success"], true, "{body}");
}

#[tokio::test]
async fn test_login_rejects_bad_captcha() {
    let app = test_router();
    let mut body = login_body("hunter2");
    body["vcode"] = json!("1235");
    let body = call(&app, post_json("/api/auth/login", body, None)).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "please enter the correct captcha");
}

#[tokio::test]
async fn test_login_rejects_malformed_body() {
    let app = test_router();
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let body = call(&app, req).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "please enter account and password");
    assert!(body["data"].is_string());
}

fn throttled_config() -> ServerConfig {
    let mut config = test_config();
    config.login.rate_per_second = 1;
    config.login.burst = 1;
    config.login.wait_timeout_secs = 0;
    config
}

#[tokio::test]
async fn test_login_rate_limited_envelope() {
    let app = test_router_with(throttled_config());
    let body = login(&app, "hunter2").await;
    assert_eq!(body["success"], true, "{body}");

    let body = login(&app, "hunter2").await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "too many concurrent logins, please wait");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_login_throttles_before_reading_body() {
    let app = test_router_with(throttled_config());
    login(&app, "hunter2").await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let body = call(&app, req).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "too many concurrent logins, please wait");
}

#[tokio::test]
async fn test_unknown_account_and_wrong_password_messages() {
    let app = test_router();
    let mut unknown = login_body("hunter2");
    unknown["num"] = json!("ghost");
    let body = call(&app, post_json("/api/auth/login", unknown, None)).await;
    assert_eq!(body["message"], "account or password incorrect");

    let body = login(&app, "wrong").await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "wrong password, 4 attempts remaining");
}

#[tokio::test]
async fn test_five_failures_lock_out_correct_password() {
    let app = test_router();
    for remaining in (1..5).rev() {
        let body = login(&app, "wrong").await;
        assert_eq!(
            body["message"],
            format!("wrong password, {remaining} attempts remaining")
        );
    }
    let body = login(&app, "wrong").await;
    assert_eq!(body["message"], "login locked, please retry in 5 minutes");

    let body = login(&app, "hunter2").await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "login locked, please retry in 5 minutes");
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = test_router();
    let body = call(&app, get("/adm/auth/get", None)).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "please log in first");

    let body = call(&app, get("/adm/auth/get", Some("not-a-token"))).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_auth_get_returns_profile_without_password() {
    let app = test_router();
    let token = token(&app).await;
    let body = call(&app, get("/adm/auth/get", Some(&token))).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], 1);
    assert_eq!(body["data"]["name"], "Admin");
    assert!(body["data"].get("passwd").is_none());
}

#[tokio::test]
async fn test_token_in_query_is_accepted() {
    let app = test_router();
    let token = token(&app).await;
    let body = call(&app, get(&format!("/adm/auth/get?token={token}"), None)).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_auth_edit_updates_profile() {
    let app = test_router();
    let token = token(&app).await;
    let edit = json!({"name": "Editor", "phone": "555-0100", "email": "ed@example.com"});
    let body = call(&app, post_json("/adm/auth/edit", edit, Some(&token))).await;
    assert_eq!(body["success"], true);

    let body = call(&app, get("/adm/auth/get", Some(&token))).await;
    assert_eq!(body["data"]["name"], "Editor");
    assert_eq!(body["data"]["phone"], "555-0100");
    assert_eq!(body["data"]["num"], "admin");
}

#[tokio::test]
async fn test_password_change_requires_old_password() {
    let app = test_router();
    let token = token(&app).await;

    let bad = json!({"opasswd": "nope", "npasswd": "s3cret"});
    let body = call(&app, post_json("/adm/auth/passwd", bad, Some(&token))).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "original password incorrect, please retry");

    let good = json!({"opasswd": "hunter2", "npasswd": "s3cret"});
    let body = call(&app, post_json("/adm/auth/passwd", good, Some(&token))).await;
    assert_eq!(body["success"], true);

    assert_eq!(login(&app, "s3cret").await["success"], true);
    assert_eq!(login(&app, "hunter2").await["success"], false);
}

#[tokio::test]
async fn test_logout_acknowledges() {
    let app = test_router();
    let body = call(&app, post_json("/api/auth/logout", json!({}), None)).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_category_and_post_crud() {
    let app = test_router();
    let token = token(&app).await;

    let body = call(&app, post_json("/adm/cate/add", json!({"name": "notes"}), Some(&token))).await;
    assert_eq!(body["success"], true);
    let cate_id = body["data"]["id"].as_u64().unwrap();

    let post = json!({"title": "Hello", "markdown": "# hi", "cate_id": cate_id});
    let body = call(&app, post_json("/adm/post/add", post, Some(&token))).await;
    assert_eq!(body["success"], true, "{body}");
    let post_id = body["data"]["id"].as_u64().unwrap();

    let body = call(&app, post_json("/adm/cate/drop", json!({"id": cate_id}), Some(&token))).await;
    assert_eq!(body["success"], false);

    let body = call(&app, get("/adm/status/appinfo", Some(&token))).await;
    assert_eq!(body["data"]["posts"], 1);
    assert_eq!(body["data"]["cates"], 1);

    let body = call(&app, post_json("/adm/post/drop", json!({"id": post_id}), Some(&token))).await;
    assert_eq!(body["success"], true);
    let body = call(&app, post_json("/adm/cate/drop", json!({"id": cate_id}), Some(&token))).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_edit_missing_record_fails() {
    let app = test_router();
    let token = token(&app).await;
    let body = call(
        &app,
        post_json("/adm/tag/edit", json!({"id": 99, "name": "x"}), Some(&token)),
    )
    .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "not found: tag 99");
}

#[tokio::test]
async fn test_global_edit_is_public_readable() {
    let app = test_router();
    let token = token(&app).await;
    let global = json!({"site_name": "Quill", "site_url": "https://example.com"});
    let body = call(&app, post_json("/adm/global/edit", global, Some(&token))).await;
    assert_eq!(body["success"], true);

    let body = call(&app, get("/api/global/get", None)).await;
    assert_eq!(body["data"]["site_name"], "Quill");
}

#[tokio::test]
async fn test_runtime_info() {
    let app = test_router();
    let token = token(&app).await;
    let body = call(&app, get("/adm/status/goinfo", Some(&token))).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["os"], std::env::consts::OS);
    assert!(body["data"]["cpus"].as_u64().unwrap() >= 1);
}

fn multipart(uri: &str, file_name: &str, data: &str, token: &str) -> Request<Body> {
    let boundary = "quill-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n\
         {data}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_file_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.upload.dir = dir.path().to_path_buf();
    let app = test_router_with(config);
    let token = token(&app).await;

    let body = call(&app, multipart("/adm/upload/file", "notes.TXT", "hello", &token)).await;
    assert_eq!(body["success"], true, "{body}");
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("/static/upload/"));
    assert!(url.ends_with(".txt"));

    let relative = url.trim_start_matches("/static/upload/");
    let stored = std::fs::read_to_string(dir.path().join(relative)).unwrap();
    assert_eq!(stored, "hello");
}

#[tokio::test]
async fn test_image_upload_rejects_non_images() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.upload.dir = dir.path().to_path_buf();
    let app = test_router_with(config);
    let token = token(&app).await;

    let body = call(&app, multipart("/adm/upload/image", "script.sh", "echo", &token)).await;
    assert_eq!(body["success"], false);

    let body = call(&app, multipart("/adm/upload/image", "logo.png", "png", &token)).await;
    assert_eq!(body["success"], true);
}
