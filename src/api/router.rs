use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{
    health, auth, user, admin_config, availability, booking, subscription, notification, inventory, pos, dashboard,
};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))

        // Users (admin)
        .route("/api/v1/admin/users", get(user::list_users).post(user::create_user))
        .route("/api/v1/admin/users/{user_id}", put(user::update_user))

        // Business config
        .route("/api/v1/config", get(admin_config::get_config))
        .route("/api/v1/admin/config", put(admin_config::update_config))
        .route("/api/v1/admin/config/blackout-dates", post(admin_config::add_blackout_date))
        .route("/api/v1/admin/config/blackout-dates/{date}", delete(admin_config::remove_blackout_date))

        // Availability (public)
        .route("/api/v1/availability", get(availability::get_availability))
        .route("/api/v1/availability/check", get(availability::check_availability))

        // Bookings
        .route("/api/v1/bookings", post(booking::create_booking).get(booking::list_bookings))
        .route("/api/v1/bookings/mine", get(booking::list_my_bookings))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/bookings/{booking_id}/reschedule", post(booking::reschedule_booking))
        .route("/api/v1/bookings/{booking_id}/complete", post(booking::complete_booking))

        // Memberships
        .route("/api/v1/subscriptions", post(subscription::create_subscription))
        .route("/api/v1/subscriptions/mine", get(subscription::list_my_subscriptions))
        .route("/api/v1/subscriptions/active", get(subscription::get_active_subscription))
        .route("/api/v1/subscriptions/{request_id}/cancel", post(subscription::cancel_subscription))
        .route("/api/v1/admin/subscriptions", get(subscription::list_subscriptions))
        .route("/api/v1/admin/subscriptions/stats", get(subscription::subscription_stats))
        .route("/api/v1/admin/subscriptions/{request_id}/review", post(subscription::review_subscription))
        .route("/api/v1/admin/subscriptions/{request_id}/approve", post(subscription::approve_subscription))
        .route("/api/v1/admin/subscriptions/{request_id}/reject", post(subscription::reject_subscription))

        // Notifications
        .route("/api/v1/notifications", get(notification::list_notifications))
        .route("/api/v1/notifications/read-all", post(notification::mark_all_read))
        .route("/api/v1/notifications/{notification_id}/read", post(notification::mark_read))
        .route("/api/v1/admin/notifications", post(notification::send_notification))

        // Inventory
        .route("/api/v1/inventory", get(inventory::list_items).post(inventory::create_item))
        .route("/api/v1/inventory/{item_id}", put(inventory::update_item).delete(inventory::delete_item))
        .route("/api/v1/inventory/{item_id}/adjust", post(inventory::adjust_stock))

        // POS
        .route("/api/v1/pos/sales", post(pos::create_sale).get(pos::list_sales))
        .route("/api/v1/pos/summary", get(pos::sales_summary))

        // Dashboard
        .route("/api/v1/admin/dashboard", get(dashboard::get_dashboard))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
