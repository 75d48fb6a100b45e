mod common;

use axum::http::StatusCode;
use carwash_backend::background::run_maintenance_pass;
use chrono::Duration;
use common::{booking_date, parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_broadcast_reaches_active_customers_only() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let first = app.register("first@example.com", "First").await;
    let second = app.register("second@example.com", "Second").await;
    let gone = app.register("gone@example.com", "Gone").await;
    let staff = app.create_user(&admin, "crew@carwash.test", "staff").await;

    let res = app.request("PUT", &format!("/api/v1/admin/users/{}", gone.user_id), Some(&admin), Some(json!({"active": false}))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.request("POST", "/api/v1/admin/notifications", Some(&staff), Some(json!({
        "title": "Hi", "message": "Hello"
    }))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.request("POST", "/api/v1/admin/notifications", Some(&admin), Some(json!({
        "title": "Holiday hours", "message": "We close early on Friday."
    }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["count"], 2);

    for customer in [&first, &second] {
        let res = app.request("GET", "/api/v1/notifications", Some(customer), None).await;
        let notifications = parse_body(res).await;
        assert_eq!(notifications[0]["kind"], "announcement");
        assert_eq!(notifications[0]["title"], "Holiday hours");
    }

    let res = app.request("GET", "/api/v1/notifications", Some(&staff), None).await;
    assert!(parse_body(res).await.as_array().unwrap().is_empty());

    let res = app.request("POST", "/api/v1/admin/notifications", Some(&admin), Some(json!({
        "user_id": staff.user_id, "title": "Shift", "message": "You open tomorrow."
    }))).await;
    assert_eq!(parse_body(res).await["count"], 1);

    let res = app.request("POST", "/api/v1/admin/notifications", Some(&admin), Some(json!({
        "user_id": "nobody", "title": "Shift", "message": "You open tomorrow."
    }))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.request("POST", "/api/v1/admin/notifications", Some(&admin), Some(json!({
        "title": " ", "message": "Empty title"
    }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_read_state_is_per_user() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let reader = app.register("reader@example.com", "Reader").await;
    let other = app.register("other@example.com", "Other").await;

    for i in 0..3 {
        app.request("POST", "/api/v1/admin/notifications", Some(&admin), Some(json!({
            "user_id": reader.user_id, "title": format!("Note {}", i), "message": "Body"
        }))).await;
    }

    let res = app.request("GET", "/api/v1/notifications?unread=true", Some(&reader), None).await;
    let unread = parse_body(res).await;
    assert_eq!(unread.as_array().unwrap().len(), 3);
    let id = unread[0]["id"].as_str().unwrap();

    // Someone else's notification looks missing.
    let res = app.request("POST", &format!("/api/v1/notifications/{}/read", id), Some(&other), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.request("POST", &format!("/api/v1/notifications/{}/read", id), Some(&reader), None).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.request("GET", "/api/v1/notifications?unread=true", Some(&reader), None).await;
    assert_eq!(parse_body(res).await.as_array().unwrap().len(), 2);

    let res = app.request("POST", "/api/v1/notifications/read-all", Some(&reader), None).await;
    assert_eq!(parse_body(res).await["count"], 2);

    let res = app.request("GET", "/api/v1/notifications?unread=true", Some(&reader), None).await;
    assert!(parse_body(res).await.as_array().unwrap().is_empty());

    let res = app.request("GET", "/api/v1/notifications", Some(&reader), None).await;
    let all = parse_body(res).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
    assert!(all.as_array().unwrap().iter().all(|n| n["is_read"] == true));
}

#[tokio::test]
async fn test_reminder_is_sent_once_within_a_day_of_the_slot() {
    let app = TestApp::new().await;
    let customer = app.register("remind@example.com", "Remind").await;

    let res = app.request("POST", "/api/v1/bookings", Some(&customer), Some(json!({
        "date": booking_date().to_string(),
        "time_slot": "10:00",
        "service_type": "basic",
        "vehicle_type": "sedan"
    }))).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let slot_start = booking_date().and_hms_opt(10, 0, 0).unwrap().and_utc();

    let report = run_maintenance_pass(&app.state, slot_start - Duration::hours(30)).await;
    assert_eq!(report.reminders_sent, 0);

    let report = run_maintenance_pass(&app.state, slot_start - Duration::hours(2)).await;
    assert_eq!(report.reminders_sent, 1);

    let report = run_maintenance_pass(&app.state, slot_start - Duration::hours(1)).await;
    assert_eq!(report.reminders_sent, 0);

    let res = app.request("GET", "/api/v1/notifications", Some(&customer), None).await;
    let notifications = parse_body(res).await;
    let reminders: Vec<_> = notifications.as_array().unwrap().iter()
        .filter(|n| n["kind"] == "booking_reminder")
        .collect();
    assert_eq!(reminders.len(), 1);
    assert!(reminders[0]["message"].as_str().unwrap().contains("10:00"));
}

#[tokio::test]
async fn test_cancelled_bookings_get_no_reminder() {
    let app = TestApp::new().await;
    let customer = app.register("skip@example.com", "Skip").await;

    let res = app.request("POST", "/api/v1/bookings", Some(&customer), Some(json!({
        "date": booking_date().to_string(),
        "time_slot": "11:00",
        "service_type": "basic",
        "vehicle_type": "sedan"
    }))).await;
    let id = parse_body(res).await["id"].as_str().unwrap().to_string();
    app.request("POST", &format!("/api/v1/bookings/{}/cancel", id), Some(&customer), None).await;

    let slot_start = booking_date().and_hms_opt(11, 0, 0).unwrap().and_utc();
    let report = run_maintenance_pass(&app.state, slot_start - Duration::hours(3)).await;
    assert_eq!(report.reminders_sent, 0);
}
