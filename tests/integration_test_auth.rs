mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{parse_body, TestApp, ADMIN_EMAIL, ADMIN_PASSWORD};
use serde_json::json;
use carwash_backend::domain::ports::UserRepository;
use tower::ServiceExt;

fn cookie_value(response: &axum::response::Response, name: &str) -> Option<String> {
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with(&format!("{}=", name)))
        .map(|c| c[name.len() + 1..].split(';').next().unwrap_or("").to_string())
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new().await;

    let auth = app.register("  Jane@Example.com ", "Jane").await;
    assert!(!auth.access_token.is_empty());

    let res = app.request("GET", "/api/v1/auth/me", Some(&auth), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me = parse_body(res).await;
    assert_eq!(me["email"], "jane@example.com");
    assert_eq!(me["role"], "customer");
    assert!(me.get("password_hash").is_none());

    let again = app.login("JANE@example.com", "customer-password").await;
    assert_eq!(again.user_id, auth.user_id);
}

#[tokio::test]
async fn test_registration_validation() {
    let app = TestApp::new().await;
    app.register("dup@example.com", "Dup").await;

    let res = app.request("POST", "/api/v1/auth/register", None, Some(json!({
        "email": "DUP@example.com", "name": "Other", "password": "long-enough"
    }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.request("POST", "/api/v1/auth/register", None, Some(json!({
        "email": "short@example.com", "name": "Short", "password": "abc"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("POST", "/api/v1/auth/register", None, Some(json!({
        "email": "not-an-email", "name": "Nobody", "password": "long-enough"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::new().await;

    let res = app.request("POST", "/api/v1/auth/login", None, Some(json!({
        "email": ADMIN_EMAIL, "password": "wrong-password"
    }))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app.request("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "ghost@example.com", "password": ADMIN_PASSWORD
    }))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_requests_without_session_or_csrf_are_rejected() {
    let app = TestApp::new().await;

    let res = app.request("GET", "/api/v1/auth/me", None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let auth = app.register("csrf@example.com", "Csrf").await;
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/notifications/read-all")
        .header(header::COOKIE, format!("access_token={}", auth.access_token))
        .body(Body::empty())
        .unwrap();
    let res = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let app = TestApp::new().await;

    let login = app.request("POST", "/api/v1/auth/login", None, Some(json!({
        "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD
    }))).await;
    assert_eq!(login.status(), StatusCode::OK);
    let refresh_token = cookie_value(&login, "refresh_token").expect("refresh cookie");

    let refresh = |token: String| {
        Request::builder()
            .method("POST")
            .uri("/api/v1/auth/refresh")
            .header(header::COOKIE, format!("refresh_token={}", token))
            .body(Body::empty())
            .unwrap()
    };

    let res = app.router.clone().oneshot(refresh(refresh_token.clone())).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let rotated = cookie_value(&res, "refresh_token").expect("rotated refresh cookie");
    assert_ne!(rotated, refresh_token);
    let body = parse_body(res).await;
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);

    // The old token was consumed by the rotation.
    let res = app.router.clone().oneshot(refresh(refresh_token)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_manages_users() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let customer = app.register("member@example.com", "Member").await;

    // Customers cannot reach admin routes.
    let res = app.request("GET", "/api/v1/admin/users", Some(&customer), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let staff = app.create_user(&admin, "staff@carwash.test", "staff").await;
    let res = app.request("GET", "/api/v1/auth/me", Some(&staff), None).await;
    assert_eq!(parse_body(res).await["role"], "staff");

    let res = app.request("POST", "/api/v1/admin/users", Some(&admin), Some(json!({
        "email": "x@carwash.test", "name": "X", "password": "long-enough", "role": "owner"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("GET", "/api/v1/admin/users", Some(&admin), None).await;
    let users = parse_body(res).await;
    assert_eq!(users.as_array().unwrap().len(), 3);

    // Deactivation locks the account out immediately.
    let res = app.request("PUT", &format!("/api/v1/admin/users/{}", customer.user_id), Some(&admin), Some(json!({
        "active": false
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["active"], false);

    let res = app.request("GET", "/api/v1/auth/me", Some(&customer), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("POST", "/api/v1/auth/login", None, Some(json!({
        "email": "member@example.com", "password": "customer-password"
    }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_lock_themselves_out() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let uri = format!("/api/v1/admin/users/{}", admin.user_id);

    let res = app.request("PUT", &uri, Some(&admin), Some(json!({"active": false}))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.request("PUT", &uri, Some(&admin), Some(json!({"role": "staff"}))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.request("PUT", &uri, Some(&admin), Some(json!({"name": "Head Admin"}))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["name"], "Head Admin");
}

#[tokio::test]
async fn test_admin_seed_is_idempotent() {
    let app = TestApp::new().await;
    carwash_backend::infra::factory::ensure_admin_account(&app.state).await.unwrap();

    let users = app.state.user_repo.list().await.unwrap();
    assert_eq!(users.iter().filter(|u| u.email == ADMIN_EMAIL).count(), 1);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let res = app.request("GET", "/health", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
}
