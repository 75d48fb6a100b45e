use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SubscriptionRequest {
    pub id: String,
    pub user_id: String,
    pub package_type: String,
    pub branch_id: Option<String>,
    pub vehicle_plate: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub admin_note: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewSubscriptionRequest {
    pub user_id: String,
    pub package_type: String,
    pub branch_id: Option<String>,
    pub vehicle_plate: Option<String>,
    pub notes: Option<String>,
}

impl SubscriptionRequest {
    pub fn new(params: NewSubscriptionRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: params.user_id,
            package_type: params.package_type,
            branch_id: params.branch_id,
            vehicle_plate: params.vehicle_plate,
            notes: params.notes,
            status: SubscriptionStatus::Pending.to_string(),
            admin_note: None,
            reviewed_by: None,
            reviewed_at: None,
            valid_from: None,
            valid_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> Option<SubscriptionStatus> {
        self.status.parse().ok()
    }

    /// Approved and not yet past its last valid day.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.status() == Some(SubscriptionStatus::Approved)
            && self.valid_from.is_some_and(|from| from <= date)
            && self.valid_until.is_some_and(|until| until >= date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 6] = [
        SubscriptionStatus::Pending,
        SubscriptionStatus::UnderReview,
        SubscriptionStatus::Approved,
        SubscriptionStatus::Rejected,
        SubscriptionStatus::Cancelled,
        SubscriptionStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::UnderReview => "under_review",
            SubscriptionStatus::Approved => "approved",
            SubscriptionStatus::Rejected => "rejected",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// Still waiting on a decision.
    pub fn is_open(&self) -> bool {
        matches!(self, SubscriptionStatus::Pending | SubscriptionStatus::UnderReview)
    }

    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (UnderReview, Cancelled)
                | (Approved, Expired)
        )
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown subscription status: {}", s))
    }
}
