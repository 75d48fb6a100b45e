use std::sync::Arc;
use crate::domain::models::admin_config::AdminConfig;
use crate::domain::models::booking::Booking;
use crate::domain::models::notification::*;
use crate::domain::ports::NotificationRepository;
use crate::error::AppError;
use serde_json::{json, Value};
use tera::{Context, Tera};
use tracing::{error, info};

/// (kind, title template, message template)
const TEMPLATES: &[(&str, &str, &str)] = &[
    (
        KIND_BOOKING_CONFIRMED,
        "Booking confirmed",
        "Your {{ service_type }} wash at {{ branch_name }} is booked for {{ date }} at {{ time_slot }}.",
    ),
    (
        KIND_BOOKING_CANCELLED,
        "Booking cancelled",
        "Your booking at {{ branch_name }} on {{ date }} at {{ time_slot }} has been cancelled.",
    ),
    (
        KIND_BOOKING_RESCHEDULED,
        "Booking rescheduled",
        "Your booking at {{ branch_name }} was moved to {{ date }} at {{ time_slot }}.",
    ),
    (
        KIND_BOOKING_REMINDER,
        "Upcoming wash",
        "Reminder: your {{ service_type }} wash at {{ branch_name }} is on {{ date }} at {{ time_slot }}.",
    ),
    (
        KIND_SUBSCRIPTION_UNDER_REVIEW,
        "Membership request under review",
        "We are reviewing your {{ package_name }} membership request.",
    ),
    (
        KIND_SUBSCRIPTION_APPROVED,
        "Membership approved",
        "Your {{ package_name }} membership is active from {{ valid_from }} until {{ valid_until }}.{% if note %} {{ note }}{% endif %}",
    ),
    (
        KIND_SUBSCRIPTION_REJECTED,
        "Membership request declined",
        "Your {{ package_name }} membership request was declined: {{ reason }}",
    ),
    (
        KIND_SUBSCRIPTION_EXPIRED,
        "Membership expired",
        "Your {{ package_name }} membership ended on {{ valid_until }}.",
    ),
    (
        KIND_LOW_STOCK,
        "Low stock: {{ item_name }}",
        "{{ item_name }} ({{ sku }}) at {{ branch_id }} is down to {{ quantity }} {{ unit }} (reorder level {{ reorder_level }}).",
    ),
];

/// Template variables shared by every booking notification.
pub fn booking_context(config: &AdminConfig, booking: &Booking) -> Value {
    let branch_name = config.branch(&booking.branch_id)
        .map(|b| b.name.clone())
        .unwrap_or_else(|| booking.branch_id.clone());
    json!({
        "service_type": booking.service_type,
        "branch_name": branch_name,
        "date": booking.booking_date.to_string(),
        "time_slot": booking.time_slot,
    })
}

pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    tera: Tera,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Result<Self, AppError> {
        let mut tera = Tera::default();
        let mut raw = Vec::with_capacity(TEMPLATES.len() * 2);
        for (kind, title, message) in TEMPLATES {
            raw.push((format!("{}.title", kind), *title));
            raw.push((format!("{}.message", kind), *message));
        }
        tera.add_raw_templates(raw)
            .map_err(|e| AppError::InternalWithMsg(format!("Notification template error: {:?}", e)))?;

        Ok(Self { repo, tera })
    }

    pub fn render(&self, kind: &str, context: &Value) -> Result<(String, String), AppError> {
        let ctx = Context::from_value(context.clone())
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid notification context: {:?}", e)))?;

        let render = |part: &str| {
            self.tera.render(&format!("{}.{}", kind, part), &ctx).map_err(|e| {
                error!("Notification render error for {}: {:?}", kind, e);
                AppError::InternalWithMsg(format!("Notification render error: {:?}", e))
            })
        };

        Ok((render("title")?, render("message")?))
    }

    pub async fn notify(&self, user_id: &str, kind: &str, context: &Value) -> Result<Notification, AppError> {
        let (title, message) = self.render(kind, context)?;
        let created = self.repo.create(&Notification::new(user_id, kind, title, message)).await?;
        info!(user_id = %user_id, kind = %kind, "Notification created");
        Ok(created)
    }

    pub async fn notify_users(&self, user_ids: &[String], kind: &str, context: &Value) -> Result<usize, AppError> {
        let (title, message) = self.render(kind, context)?;
        self.store_for_all(user_ids, kind, &title, &message).await
    }

    /// Free-text message from an administrator.
    pub async fn announce(&self, user_ids: &[String], title: &str, message: &str) -> Result<usize, AppError> {
        self.store_for_all(user_ids, KIND_ANNOUNCEMENT, title, message).await
    }

    async fn store_for_all(&self, user_ids: &[String], kind: &str, title: &str, message: &str) -> Result<usize, AppError> {
        let notifications: Vec<Notification> = user_ids.iter()
            .map(|id| Notification::new(id, kind, title.to_string(), message.to_string()))
            .collect();
        self.repo.create_many(&notifications).await?;
        info!(kind = %kind, recipients = notifications.len(), "Notifications created");
        Ok(notifications.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NullRepo;

    #[async_trait]
    impl NotificationRepository for NullRepo {
        async fn create(&self, n: &Notification) -> Result<Notification, AppError> { Ok(n.clone()) }
        async fn create_many(&self, _n: &[Notification]) -> Result<(), AppError> { Ok(()) }
        async fn list_by_user(&self, _u: &str, _unread: bool) -> Result<Vec<Notification>, AppError> { Ok(vec![]) }
        async fn mark_read(&self, _u: &str, _id: &str) -> Result<bool, AppError> { Ok(true) }
        async fn mark_all_read(&self, _u: &str) -> Result<u64, AppError> { Ok(0) }
    }

    fn service() -> NotificationService {
        NotificationService::new(Arc::new(NullRepo)).unwrap()
    }

    #[test]
    fn test_every_kind_renders() {
        let service = service();
        let context = json!({
            "service_type": "basic", "branch_name": "Main", "date": "2030-01-01", "time_slot": "09:00",
            "package_name": "Basic Monthly", "valid_from": "2030-01-01", "valid_until": "2030-01-31",
            "note": null, "reason": "Incomplete", "item_name": "Wax", "sku": "WAX-1", "branch_id": "main",
            "quantity": 2, "unit": "l", "reorder_level": 5
        });
        for (kind, _, _) in TEMPLATES {
            let (title, message) = service.render(kind, &context).unwrap();
            assert!(!title.is_empty());
            assert!(!message.contains("{{"));
        }
    }

    #[test]
    fn test_approval_message_includes_optional_note() {
        let service = service();
        let base = json!({"package_name": "Gold", "valid_from": "2030-01-01", "valid_until": "2030-01-31", "note": null});
        let (_, message) = service.render(KIND_SUBSCRIPTION_APPROVED, &base).unwrap();
        assert_eq!(message, "Your Gold membership is active from 2030-01-01 until 2030-01-31.");

        let with_note = json!({"package_name": "Gold", "valid_from": "2030-01-01", "valid_until": "2030-01-31", "note": "Welcome!"});
        let (_, message) = service.render(KIND_SUBSCRIPTION_APPROVED, &with_note).unwrap();
        assert!(message.ends_with("Welcome!"));
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        assert!(service().render(KIND_BOOKING_CONFIRMED, &json!({})).is_err());
    }
}
