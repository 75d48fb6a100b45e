mod common;

use axum::http::StatusCode;
use carwash_backend::background::run_maintenance_pass;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use common::{parse_body, AuthHeaders, TestApp};
use serde_json::{json, Value};
use std::sync::Arc;

async fn submit(app: &TestApp, customer: &AuthHeaders, package: &str) -> Value {
    let res = app.request("POST", "/api/v1/subscriptions", Some(customer), Some(json!({
        "package_type": package,
        "vehicle_plate": "AB-123-CD"
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    parse_body(res).await
}

#[tokio::test]
async fn test_membership_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let customer = app.register("member@example.com", "Member").await;

    let request = submit(&app, &customer, "basic-monthly").await;
    assert_eq!(request["status"], "pending");
    let id = request["id"].as_str().unwrap();

    // A second open request is refused.
    let res = app.request("POST", "/api/v1/subscriptions", Some(&customer), Some(json!({
        "package_type": "premium-annual"
    }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.request("GET", "/api/v1/subscriptions/active", Some(&customer), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.request("POST", &format!("/api/v1/admin/subscriptions/{}/review", id), Some(&admin), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "under_review");

    let res = app.request("POST", &format!("/api/v1/admin/subscriptions/{}/approve", id), Some(&admin), Some(json!({
        "note": "Welcome aboard"
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let approved = parse_body(res).await;
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["admin_note"], "Welcome aboard");
    assert_eq!(approved["reviewed_by"], admin.user_id.as_str());

    let today = Utc::now().date_naive();
    let valid_until = today.checked_add_months(chrono::Months::new(1)).unwrap().pred_opt().unwrap();
    assert_eq!(approved["valid_from"], today.to_string());
    assert_eq!(approved["valid_until"], valid_until.to_string());

    let res = app.request("GET", "/api/v1/subscriptions/active", Some(&customer), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["id"], id);

    // Decided requests cannot be decided again.
    let res = app.request("POST", &format!("/api/v1/admin/subscriptions/{}/reject", id), Some(&admin), Some(json!({
        "reason": "Changed our mind"
    }))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.request("GET", "/api/v1/notifications", Some(&customer), None).await;
    let kinds: Vec<String> = parse_body(res).await.as_array().unwrap().iter()
        .map(|n| n["kind"].as_str().unwrap().to_string())
        .collect();
    assert!(kinds.contains(&"subscription_under_review".to_string()));
    assert!(kinds.contains(&"subscription_approved".to_string()));
}

#[tokio::test]
async fn test_rejection_requires_reason_and_allows_resubmission() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let customer = app.register("maybe@example.com", "Maybe").await;

    let request = submit(&app, &customer, "unlimited-monthly").await;
    let uri = format!("/api/v1/admin/subscriptions/{}/reject", request["id"].as_str().unwrap());

    let res = app.request("POST", &uri, Some(&admin), Some(json!({"reason": "  "}))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("POST", &uri, Some(&admin), Some(json!({"reason": "Plate does not match"}))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let rejected = parse_body(res).await;
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["admin_note"], "Plate does not match");

    // A rejected request no longer blocks a new one.
    submit(&app, &customer, "unlimited-monthly").await;

    let res = app.request("GET", "/api/v1/subscriptions/mine", Some(&customer), None).await;
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_package_is_rejected() {
    let app = TestApp::new().await;
    let customer = app.register("typo@example.com", "Typo").await;

    let res = app.request("POST", "/api/v1/subscriptions", Some(&customer), Some(json!({
        "package_type": "gold-forever"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_owner_can_withdraw() {
    let app = TestApp::new().await;
    let owner = app.register("owner@example.com", "Owner").await;
    let other = app.register("other@example.com", "Other").await;

    let request = submit(&app, &owner, "basic-monthly").await;
    let uri = format!("/api/v1/subscriptions/{}/cancel", request["id"].as_str().unwrap());

    let res = app.request("POST", &uri, Some(&other), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.request("POST", &uri, Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "cancelled");

    let res = app.request("POST", &uri, Some(&owner), None).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_staff_reviews_but_only_admin_decides() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let staff = app.create_user(&admin, "clerk@carwash.test", "staff").await;
    let customer = app.register("c@example.com", "C").await;

    let request = submit(&app, &customer, "basic-monthly").await;
    let id = request["id"].as_str().unwrap();

    let res = app.request("GET", "/api/v1/admin/subscriptions?status=pending", Some(&staff), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 1);

    let res = app.request("GET", "/api/v1/admin/subscriptions?status=bogus", Some(&staff), None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.request("POST", &format!("/api/v1/admin/subscriptions/{}/review", id), Some(&staff), None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.request("POST", &format!("/api/v1/admin/subscriptions/{}/approve", id), Some(&staff), Some(json!({}))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("GET", "/api/v1/admin/subscriptions", Some(&customer), None).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("GET", "/api/v1/admin/subscriptions/stats", Some(&staff), None).await;
    let stats = parse_body(res).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["by_status"]["under_review"], 1);
    assert_eq!(stats["by_status"]["approved"], 0);
}

#[tokio::test]
async fn test_maintenance_expires_lapsed_memberships() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let customer = app.register("lapsed@example.com", "Lapsed").await;

    let request = submit(&app, &customer, "basic-monthly").await;
    let id = request["id"].as_str().unwrap();
    let res = app.request("POST", &format!("/api/v1/admin/subscriptions/{}/approve", id), Some(&admin), Some(json!({}))).await;
    assert_eq!(res.status(), StatusCode::OK);

    // Still valid tomorrow.
    let report = run_maintenance_pass(&app.state, Utc::now() + Duration::days(1)).await;
    assert_eq!(report.memberships_expired, 0);

    let pass_at = Utc::now().trunc_subsecs(0) + Duration::days(40);
    let report = run_maintenance_pass(&app.state, pass_at).await;
    assert_eq!(report.memberships_expired, 1);

    let res = app.request("GET", "/api/v1/subscriptions/mine", Some(&customer), None).await;
    let mine = parse_body(res).await;
    assert_eq!(mine[0]["status"], "expired");
    let updated_at: DateTime<Utc> = serde_json::from_value(mine[0]["updated_at"].clone()).unwrap();
    assert_eq!(updated_at, pass_at);

    let res = app.request("GET", "/api/v1/notifications", Some(&customer), None).await;
    let notifications = parse_body(res).await;
    assert!(notifications.as_array().unwrap().iter().any(|n| n["kind"] == "subscription_expired"));

    // Nothing left to expire.
    let report = run_maintenance_pass(&app.state, Utc::now() + Duration::days(41)).await;
    assert_eq!(report.memberships_expired, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_leave_one_open_request() {
    let app = Arc::new(TestApp::new().await);
    let customer = Arc::new(app.register("eager@example.com", "Eager").await);

    let handles: Vec<_> = (0..6).map(|_| {
        let (app, customer) = (app.clone(), customer.clone());
        tokio::spawn(async move {
            app.request("POST", "/api/v1/subscriptions", Some(&customer), Some(json!({
                "package_type": "basic-monthly"
            }))).await.status()
        })
    }).collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 5);

    let res = app.request("GET", "/api/v1/subscriptions/mine", Some(&customer), None).await;
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 1);
}
