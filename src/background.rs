use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::admin_config::{parse_hhmm, AdminConfig};
use crate::domain::models::notification::KIND_BOOKING_REMINDER;
use crate::domain::services::admin_config::load;
use crate::domain::services::availability::slot_start_utc;
use crate::domain::services::notification_service::booking_context;
use crate::error::AppError;

const REMINDER_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub memberships_expired: usize,
    pub reminders_sent: usize,
}

pub async fn start_background_worker(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.config.worker_interval_secs.max(1));
    info!("Starting maintenance worker (every {:?})...", interval);

    loop {
        run_maintenance_pass(&state, Utc::now()).await;
        sleep(interval).await;
    }
}

/// One sweep over time-driven state: membership expiry and booking reminders.
/// Failures are logged and the next pass retries.
pub async fn run_maintenance_pass(state: &AppState, now: DateTime<Utc>) -> MaintenanceReport {
    let span = info_span!("maintenance_pass", at = %now);

    async move {
        let config = match load(state.config_repo.as_ref()).await {
            Ok(config) => config,
            Err(e) => {
                error!("Maintenance skipped, config unavailable: {:?}", e);
                return MaintenanceReport::default();
            }
        };

        let mut report = MaintenanceReport::default();

        match state.subscriptions.expire_due(&config, now).await {
            Ok(count) => report.memberships_expired = count,
            Err(e) => error!("Failed to expire memberships: {:?}", e),
        }

        match send_reminders(state, &config, now).await {
            Ok(count) => report.reminders_sent = count,
            Err(e) => error!("Failed to send booking reminders: {:?}", e),
        }

        if report != MaintenanceReport::default() {
            info!(
                expired = report.memberships_expired,
                reminders = report.reminders_sent,
                "Maintenance pass finished"
            );
        }
        report
    }
        .instrument(span)
        .await
}

async fn send_reminders(state: &AppState, config: &AdminConfig, now: DateTime<Utc>) -> Result<usize, AppError> {
    let horizon = now + chrono::Duration::hours(REMINDER_WINDOW_HOURS);
    let candidates = state.booking_repo
        .list_reminder_candidates(config.today(now), config.today(horizon))
        .await?;

    let mut sent = 0;
    for booking in candidates {
        let Some(start) = parse_hhmm(&booking.time_slot)
            .and_then(|time| slot_start_utc(config, booking.booking_date, time)) else {
            continue;
        };
        if start <= now || start > horizon {
            continue;
        }

        if let Some(user_id) = &booking.user_id
            && let Err(e) = state.notifications.notify(user_id, KIND_BOOKING_REMINDER, &booking_context(config, &booking)).await
        {
            error!(booking_id = %booking.id, "Failed to create reminder: {:?}", e);
            continue;
        }

        state.booking_repo.mark_reminder_sent(&booking.id).await?;
        sent += 1;
    }

    Ok(sent)
}
