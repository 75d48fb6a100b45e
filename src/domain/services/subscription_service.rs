use std::sync::Arc;
use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::domain::models::admin_config::AdminConfig;
use crate::domain::models::notification::{
    KIND_SUBSCRIPTION_APPROVED, KIND_SUBSCRIPTION_EXPIRED, KIND_SUBSCRIPTION_REJECTED,
    KIND_SUBSCRIPTION_UNDER_REVIEW,
};
use crate::domain::models::subscription::{NewSubscriptionRequest, SubscriptionRequest, SubscriptionStatus};
use crate::domain::ports::SubscriptionRepository;
use crate::domain::services::notification_service::NotificationService;
use crate::error::AppError;

/// First and last valid day of a membership starting on `start`.
///
/// Calendar months are added with chrono's end-of-month clamping, so a
/// membership starting on Jan 31 ends on Feb 27 (or Feb 28 in leap years).
pub fn membership_window(start: NaiveDate, duration_months: u32) -> Option<(NaiveDate, NaiveDate)> {
    let end_exclusive = start.checked_add_months(Months::new(duration_months))?;
    Some((start, end_exclusive.pred_opt()?))
}

#[derive(Debug, Serialize)]
pub struct SubscriptionStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
}

pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepository>,
    notifications: Arc<NotificationService>,
}

impl SubscriptionService {
    pub fn new(repo: Arc<dyn SubscriptionRepository>, notifications: Arc<NotificationService>) -> Self {
        Self { repo, notifications }
    }

    pub async fn submit(
        &self,
        config: &AdminConfig,
        params: NewSubscriptionRequest,
        today: NaiveDate,
    ) -> Result<SubscriptionRequest, AppError> {
        if config.package(&params.package_type).is_none() {
            return Err(AppError::Validation(format!("Unknown package: {}", params.package_type)));
        }
        if let Some(branch_id) = &params.branch_id
            && config.active_branch(branch_id).is_none() {
            return Err(AppError::Validation(format!("Unknown branch: {}", branch_id)));
        }

        let existing = self.repo.list_by_user(&params.user_id).await?;
        let blocking = existing.iter().find(|r| {
            r.status().is_some_and(|s| s.is_open()) || r.is_active_on(today)
        });
        if let Some(request) = blocking {
            warn!(user_id = %params.user_id, existing = %request.id, "Duplicate membership request refused");
            return Err(duplicate_request());
        }

        let user_id = params.user_id.clone();
        let created = self.repo.create(&SubscriptionRequest::new(params)).await.map_err(|e| {
            if e.is_unique_violation() {
                warn!(user_id = %user_id, "Concurrent membership request refused");
                duplicate_request()
            } else {
                e
            }
        })?;
        info!(request_id = %created.id, package = %created.package_type, "Membership request submitted");
        Ok(created)
    }

    pub async fn active_for_user(&self, user_id: &str, today: NaiveDate) -> Result<Option<SubscriptionRequest>, AppError> {
        let requests = self.repo.list_by_user(user_id).await?;
        Ok(requests.into_iter().find(|r| r.is_active_on(today)))
    }

    pub async fn cancel_by_owner(&self, user_id: &str, id: &str) -> Result<SubscriptionRequest, AppError> {
        let mut request = self.find(id).await?;
        if request.user_id != user_id {
            return Err(AppError::NotFound("Subscription request not found".into()));
        }
        let previous = transition(&mut request, SubscriptionStatus::Cancelled, Utc::now())?;
        let saved = self.persist(&request, previous).await?;
        info!(request_id = %saved.id, "Membership request withdrawn by customer");
        Ok(saved)
    }

    pub async fn mark_under_review(
        &self,
        config: &AdminConfig,
        id: &str,
        reviewer_id: &str,
    ) -> Result<SubscriptionRequest, AppError> {
        let mut request = self.find(id).await?;
        let now = Utc::now();
        let previous = transition(&mut request, SubscriptionStatus::UnderReview, now)?;
        request.reviewed_by = Some(reviewer_id.to_string());
        request.reviewed_at = Some(now);

        let saved = self.persist(&request, previous).await?;
        info!(request_id = %saved.id, reviewer = %reviewer_id, "Membership request under review");

        self.notify_owner(&saved, KIND_SUBSCRIPTION_UNDER_REVIEW, json!({
            "package_name": package_name(config, &saved.package_type),
        })).await;
        Ok(saved)
    }

    pub async fn approve(
        &self,
        config: &AdminConfig,
        id: &str,
        reviewer_id: &str,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionRequest, AppError> {
        let mut request = self.find(id).await?;
        let package = config.package(&request.package_type)
            .ok_or_else(|| AppError::Conflict(format!("Package {} no longer exists", request.package_type)))?;

        let (valid_from, valid_until) = membership_window(config.today(now), package.duration_months)
            .ok_or_else(|| AppError::Validation("Membership period is out of range".into()))?;

        let previous = transition(&mut request, SubscriptionStatus::Approved, now)?;
        request.reviewed_by = Some(reviewer_id.to_string());
        request.reviewed_at = Some(now);
        request.admin_note = note.clone();
        request.valid_from = Some(valid_from);
        request.valid_until = Some(valid_until);

        let saved = self.persist(&request, previous).await?;
        info!(request_id = %saved.id, reviewer = %reviewer_id, %valid_from, %valid_until, "Membership approved");

        self.notify_owner(&saved, KIND_SUBSCRIPTION_APPROVED, json!({
            "package_name": package.name,
            "valid_from": valid_from.to_string(),
            "valid_until": valid_until.to_string(),
            "note": note,
        })).await;
        Ok(saved)
    }

    pub async fn reject(
        &self,
        config: &AdminConfig,
        id: &str,
        reviewer_id: &str,
        reason: String,
    ) -> Result<SubscriptionRequest, AppError> {
        if reason.trim().is_empty() {
            return Err(AppError::Validation("A rejection reason is required".into()));
        }

        let mut request = self.find(id).await?;
        let now = Utc::now();
        let previous = transition(&mut request, SubscriptionStatus::Rejected, now)?;
        request.reviewed_by = Some(reviewer_id.to_string());
        request.reviewed_at = Some(now);
        request.admin_note = Some(reason.clone());

        let saved = self.persist(&request, previous).await?;
        info!(request_id = %saved.id, reviewer = %reviewer_id, "Membership request rejected");

        self.notify_owner(&saved, KIND_SUBSCRIPTION_REJECTED, json!({
            "package_name": package_name(config, &saved.package_type),
            "reason": reason,
        })).await;
        Ok(saved)
    }

    /// Moves approvals whose last valid day is before the business-local date of `now`
    /// to expired. Returns how many moved; rows that cannot move are logged and skipped.
    pub async fn expire_due(&self, config: &AdminConfig, now: DateTime<Utc>) -> Result<usize, AppError> {
        let due = self.repo.list_expired_approvals(config.today(now)).await?;
        let mut expired = 0;

        for mut request in due {
            let previous = match transition(&mut request, SubscriptionStatus::Expired, now) {
                Ok(previous) => previous,
                Err(e) => {
                    error!(request_id = %request.id, "Cannot expire membership: {:?}", e);
                    continue;
                }
            };
            match self.repo.update_if_status(&request, previous.as_str()).await? {
                Some(saved) => {
                    expired += 1;
                    info!(request_id = %saved.id, "Membership expired");
                    self.notify_owner(&saved, KIND_SUBSCRIPTION_EXPIRED, json!({
                        "package_name": package_name(config, &saved.package_type),
                        "valid_until": saved.valid_until.map(|d| d.to_string()).unwrap_or_default(),
                    })).await;
                }
                None => warn!(request_id = %request.id, "Membership changed while expiring, skipped"),
            }
        }

        Ok(expired)
    }

    pub async fn stats(&self) -> Result<SubscriptionStats, AppError> {
        let mut by_status: BTreeMap<String, i64> = SubscriptionStatus::ALL
            .iter()
            .map(|s| (s.to_string(), 0))
            .collect();
        for (status, count) in self.repo.count_by_status().await? {
            by_status.insert(status, count);
        }
        Ok(SubscriptionStats { total: by_status.values().sum(), by_status })
    }

    async fn find(&self, id: &str) -> Result<SubscriptionRequest, AppError> {
        self.repo.find_by_id(id).await?
            .ok_or(AppError::NotFound("Subscription request not found".into()))
    }

    async fn persist(&self, request: &SubscriptionRequest, previous: SubscriptionStatus) -> Result<SubscriptionRequest, AppError> {
        self.repo.update_if_status(request, previous.as_str()).await?
            .ok_or(AppError::Conflict("Subscription request was modified concurrently".into()))
    }

    async fn notify_owner(&self, request: &SubscriptionRequest, kind: &str, context: serde_json::Value) {
        if let Err(e) = self.notifications.notify(&request.user_id, kind, &context).await {
            error!(request_id = %request.id, "Failed to notify member: {:?}", e);
        }
    }
}

/// Applies a status change in memory and returns the status it replaced.
fn transition(
    request: &mut SubscriptionRequest,
    next: SubscriptionStatus,
    now: DateTime<Utc>,
) -> Result<SubscriptionStatus, AppError> {
    let current = request.status()
        .ok_or_else(|| AppError::InternalWithMsg(format!("Corrupt subscription status: {}", request.status)))?;

    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!("Cannot move a {} request to {}", current, next)));
    }

    request.status = next.to_string();
    request.updated_at = now;
    Ok(current)
}

fn duplicate_request() -> AppError {
    AppError::Conflict("You already have an open or active membership request".into())
}

fn package_name(config: &AdminConfig, package_type: &str) -> String {
    config.package(package_type)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| package_type.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::notification::Notification;
    use crate::domain::ports::NotificationRepository;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct NullNotifications;

    #[async_trait]
    impl NotificationRepository for NullNotifications {
        async fn create(&self, n: &Notification) -> Result<Notification, AppError> { Ok(n.clone()) }
        async fn create_many(&self, _n: &[Notification]) -> Result<(), AppError> { Ok(()) }
        async fn list_by_user(&self, _u: &str, _unread: bool) -> Result<Vec<Notification>, AppError> { Ok(vec![]) }
        async fn mark_read(&self, _u: &str, _id: &str) -> Result<bool, AppError> { Ok(true) }
        async fn mark_all_read(&self, _u: &str) -> Result<u64, AppError> { Ok(0) }
    }

    /// Hands out a fixed batch of due rows and records what gets written back.
    struct DueRows {
        due: Vec<SubscriptionRequest>,
        written: Mutex<Vec<SubscriptionRequest>>,
    }

    #[async_trait]
    impl SubscriptionRepository for DueRows {
        async fn create(&self, r: &SubscriptionRequest) -> Result<SubscriptionRequest, AppError> { Ok(r.clone()) }
        async fn find_by_id(&self, _id: &str) -> Result<Option<SubscriptionRequest>, AppError> { Ok(None) }
        async fn list_by_user(&self, _u: &str) -> Result<Vec<SubscriptionRequest>, AppError> { Ok(vec![]) }
        async fn list(&self, _s: Option<&str>) -> Result<Vec<SubscriptionRequest>, AppError> { Ok(vec![]) }
        async fn update_if_status(&self, r: &SubscriptionRequest, _expected: &str) -> Result<Option<SubscriptionRequest>, AppError> {
            self.written.lock().unwrap().push(r.clone());
            Ok(Some(r.clone()))
        }
        async fn count_by_status(&self) -> Result<Vec<(String, i64)>, AppError> { Ok(vec![]) }
        async fn list_expired_approvals(&self, _today: NaiveDate) -> Result<Vec<SubscriptionRequest>, AppError> {
            Ok(self.due.clone())
        }
    }

    fn request_with_status(status: &str) -> SubscriptionRequest {
        let mut request = SubscriptionRequest::new(NewSubscriptionRequest {
            user_id: "u1".into(),
            package_type: "basic-monthly".into(),
            branch_id: None,
            vehicle_plate: None,
            notes: None,
        });
        request.status = status.to_string();
        request.valid_until = Some(ymd(2026, 1, 31));
        request
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_window() {
        assert_eq!(membership_window(ymd(2026, 1, 15), 1), Some((ymd(2026, 1, 15), ymd(2026, 2, 14))));
    }

    #[test]
    fn test_window_clamps_to_month_end() {
        assert_eq!(membership_window(ymd(2026, 1, 31), 1), Some((ymd(2026, 1, 31), ymd(2026, 2, 27))));
        assert_eq!(membership_window(ymd(2028, 1, 31), 1), Some((ymd(2028, 1, 31), ymd(2028, 2, 28))));
    }

    #[test]
    fn test_annual_window() {
        assert_eq!(membership_window(ymd(2026, 3, 1), 12), Some((ymd(2026, 3, 1), ymd(2027, 2, 28))));
    }

    #[test]
    fn test_transition_refuses_decided_requests() {
        let mut request = SubscriptionRequest::new(NewSubscriptionRequest {
            user_id: "u1".into(),
            package_type: "basic-monthly".into(),
            branch_id: None,
            vehicle_plate: None,
            notes: None,
        });
        let now = Utc::now();

        assert_eq!(transition(&mut request, SubscriptionStatus::Rejected, now).unwrap(), SubscriptionStatus::Pending);
        assert_eq!(request.status, "rejected");

        let err = transition(&mut request, SubscriptionStatus::Approved, now).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(request.status, "rejected");
    }

    #[tokio::test]
    async fn test_expire_due_skips_rows_it_cannot_move() {
        let repo = Arc::new(DueRows {
            due: vec![
                request_with_status("garbled"),
                request_with_status("pending"),
                request_with_status("approved"),
            ],
            written: Mutex::new(vec![]),
        });
        let notifications = Arc::new(NotificationService::new(Arc::new(NullNotifications)).unwrap());
        let service = SubscriptionService::new(repo.clone(), notifications);

        let now = DateTime::parse_from_rfc3339("2026-03-01T06:00:00Z").unwrap().with_timezone(&Utc);
        let expired = service.expire_due(&AdminConfig::default(), now).await.unwrap();
        assert_eq!(expired, 1);

        let written = repo.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].status, "expired");
        assert_eq!(written[0].updated_at, now);
    }
}
