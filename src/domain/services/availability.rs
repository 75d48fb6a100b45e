use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::Serialize;
use crate::domain::models::admin_config::{format_minutes, parse_hhmm, AdminConfig};
use crate::domain::models::booking::Booking;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotRejection {
    UnknownBranch,
    BlackoutDate,
    InvalidTimeSlot,
    ClosedDay,
    OutsideWorkingHours,
    NonexistentLocalTime,
    LeadTime,
    FullyBooked,
}

impl SlotRejection {
    pub fn message(&self) -> &'static str {
        match self {
            SlotRejection::UnknownBranch => "Unknown or inactive branch",
            SlotRejection::BlackoutDate => "Date is unavailable",
            SlotRejection::InvalidTimeSlot => "Invalid time slot format (HH:MM)",
            SlotRejection::ClosedDay => "Branch is closed on this day",
            SlotRejection::OutsideWorkingHours => "Time slot is outside working hours",
            SlotRejection::NonexistentLocalTime => "Time slot does not exist on this date (clock change)",
            SlotRejection::LeadTime => "Time slot is too soon to book",
            SlotRejection::FullyBooked => "Time slot is fully booked",
        }
    }
}

impl From<SlotRejection> for AppError {
    fn from(rejection: SlotRejection) -> Self {
        match rejection {
            SlotRejection::UnknownBranch | SlotRejection::InvalidTimeSlot => {
                AppError::Validation(rejection.message().into())
            }
            _ => AppError::Conflict(rejection.message().into()),
        }
    }
}

pub struct SlotQuery<'a> {
    pub date: NaiveDate,
    pub time_slot: &'a str,
    pub branch_id: &'a str,
    /// Booking being moved; it must not count against its own target slot.
    pub exclude_booking: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotCapacity {
    pub capacity: i32,
    pub booked: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotStatus {
    pub time_slot: String,
    pub capacity: i32,
    pub booked: i32,
    pub available: bool,
    pub reason: Option<SlotRejection>,
}

/// Canonical `HH:MM` form of a slot, so "9:00" and "09:00" count as the same slot.
pub fn normalize_time_slot(time_slot: &str) -> Option<String> {
    parse_hhmm(time_slot.trim()).map(|t| format_minutes(t.hour() * 60 + t.minute()))
}

/// UTC instant at which a local slot starts. `None` inside a DST gap.
pub fn slot_start_utc(config: &AdminConfig, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    config.tz()
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn count_active(bookings: &[Booking], query: &SlotQuery, time_slot: &str) -> i32 {
    bookings.iter()
        .filter(|b| {
            !b.is_cancelled()
                && b.booking_date == query.date
                && b.time_slot == time_slot
                && b.branch_id == query.branch_id
                && Some(b.id.as_str()) != query.exclude_booking
        })
        .count() as i32
}

/// Decides whether one slot can take another booking.
///
/// Checks run in a fixed order and the first failure wins: branch, blackout
/// date, slot format, opening hours, lead time, then capacity.
pub fn check_slot(
    config: &AdminConfig,
    query: &SlotQuery,
    bookings: &[Booking],
    now: DateTime<Utc>,
) -> Result<SlotCapacity, SlotRejection> {
    let branch = config.active_branch(query.branch_id).ok_or(SlotRejection::UnknownBranch)?;

    if config.is_blackout(query.date) {
        return Err(SlotRejection::BlackoutDate);
    }

    let time = parse_hhmm(query.time_slot.trim()).ok_or(SlotRejection::InvalidTimeSlot)?;
    let minute = time.hour() * 60 + time.minute();

    let starts = config.slot_starts(query.date.weekday());
    if starts.is_empty() {
        return Err(SlotRejection::ClosedDay);
    }
    if !starts.contains(&minute) {
        return Err(SlotRejection::OutsideWorkingHours);
    }

    let slot_start = slot_start_utc(config, query.date, time)
        .ok_or(SlotRejection::NonexistentLocalTime)?;

    if slot_start - now < Duration::minutes(config.lead_time_minutes) {
        return Err(SlotRejection::LeadTime);
    }

    let capacity = config.capacity_for(branch);
    let booked = count_active(bookings, query, &format_minutes(minute));
    if booked >= capacity {
        return Err(SlotRejection::FullyBooked);
    }

    Ok(SlotCapacity { capacity, booked })
}

pub fn is_slot_available(
    config: &AdminConfig,
    query: &SlotQuery,
    bookings: &[Booking],
    now: DateTime<Utc>,
) -> bool {
    check_slot(config, query, bookings, now).is_ok()
}

/// Status of every slot on the branch's grid for one day. Empty when nothing on
/// that day could ever be booked (unknown branch, blackout, closed).
pub fn list_slots(
    config: &AdminConfig,
    date: NaiveDate,
    branch_id: &str,
    bookings: &[Booking],
    now: DateTime<Utc>,
) -> Vec<SlotStatus> {
    let Some(branch) = config.active_branch(branch_id) else {
        return Vec::new();
    };
    if config.is_blackout(date) {
        return Vec::new();
    }

    let capacity = config.capacity_for(branch);

    config.slot_starts(date.weekday())
        .into_iter()
        .map(|minute| {
            let time_slot = format_minutes(minute);
            let query = SlotQuery { date, time_slot: &time_slot, branch_id, exclude_booking: None };
            let booked = count_active(bookings, &query, &time_slot);
            let result = check_slot(config, &query, bookings, now);
            SlotStatus {
                capacity,
                booked,
                available: result.is_ok(),
                reason: result.err(),
                time_slot,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::admin_config::{Branch, TimeWindow, WeekdayHours};
    use crate::domain::models::booking::{NewBookingParams, BOOKING_CANCELLED};

    fn config() -> AdminConfig {
        let mut config = AdminConfig::default();
        config.working_hours = WeekdayHours::every_day("09:00", "12:00");
        config.slot_interval_minutes = 60;
        config.slot_capacity = 2;
        config.lead_time_minutes = 120;
        config.branches.push(Branch {
            id: "north".into(),
            name: "North".into(),
            address: String::new(),
            active: true,
            capacity: Some(1),
        });
        config.branches.push(Branch {
            id: "closed".into(),
            name: "Closed".into(),
            address: String::new(),
            active: false,
            capacity: None,
        });
        config
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, 14).unwrap()
    }

    fn day_before() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 13, 12, 0, 0).unwrap()
    }

    fn booking(branch: &str, slot: &str) -> Booking {
        Booking::new(NewBookingParams {
            user_id: None,
            customer_name: "Test".into(),
            customer_email: "test@example.com".into(),
            customer_phone: None,
            branch_id: branch.into(),
            booking_date: date(),
            time_slot: slot.into(),
            service_type: "basic".into(),
            vehicle_type: "sedan".into(),
            price_cents: 1500,
            notes: None,
        })
    }

    fn query<'a>(slot: &'a str, branch: &'a str) -> SlotQuery<'a> {
        SlotQuery { date: date(), time_slot: slot, branch_id: branch, exclude_booking: None }
    }

    #[test]
    fn test_open_slot_is_available() {
        let result = check_slot(&config(), &query("10:00", "main"), &[], day_before());
        assert_eq!(result, Ok(SlotCapacity { capacity: 2, booked: 0 }));
    }

    #[test]
    fn test_blackout_date_rejected() {
        let mut config = config();
        config.blackout_dates.push(date());
        assert_eq!(check_slot(&config, &query("10:00", "main"), &[], day_before()), Err(SlotRejection::BlackoutDate));
        assert!(list_slots(&config, date(), "main", &[], day_before()).is_empty());
    }

    #[test]
    fn test_unknown_and_inactive_branch_rejected() {
        assert_eq!(check_slot(&config(), &query("10:00", "south"), &[], day_before()), Err(SlotRejection::UnknownBranch));
        assert_eq!(check_slot(&config(), &query("10:00", "closed"), &[], day_before()), Err(SlotRejection::UnknownBranch));
    }

    #[test]
    fn test_lead_time_boundary() {
        let config = config();
        let slot = Utc.with_ymd_and_hms(2030, 3, 14, 10, 0, 0).unwrap();

        // exactly the lead time ahead is still bookable
        let now = slot - Duration::minutes(120);
        assert!(is_slot_available(&config, &query("10:00", "main"), &[], now));

        let now = slot - Duration::minutes(119);
        assert_eq!(check_slot(&config, &query("10:00", "main"), &[], now), Err(SlotRejection::LeadTime));
    }

    #[test]
    fn test_past_slot_rejected() {
        let now = Utc.with_ymd_and_hms(2030, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(check_slot(&config(), &query("09:00", "main"), &[], now), Err(SlotRejection::LeadTime));
    }

    #[test]
    fn test_capacity_counts_only_matching_active_bookings() {
        let config = config();
        let mut cancelled = booking("main", "10:00");
        cancelled.status = BOOKING_CANCELLED.to_string();
        let mut other_day = booking("main", "10:00");
        other_day.booking_date = date().succ_opt().unwrap();

        let bookings = vec![
            booking("main", "10:00"),
            cancelled,
            other_day,
            booking("main", "11:00"),
            booking("north", "10:00"),
        ];
        assert_eq!(
            check_slot(&config, &query("10:00", "main"), &bookings, day_before()),
            Ok(SlotCapacity { capacity: 2, booked: 1 })
        );

        let full = vec![booking("main", "10:00"), booking("main", "10:00")];
        assert_eq!(check_slot(&config, &query("10:00", "main"), &full, day_before()), Err(SlotRejection::FullyBooked));
    }

    #[test]
    fn test_branch_capacity_override() {
        let bookings = vec![booking("north", "10:00")];
        assert_eq!(check_slot(&config(), &query("10:00", "north"), &bookings, day_before()), Err(SlotRejection::FullyBooked));
    }

    #[test]
    fn test_excluded_booking_does_not_block_itself() {
        let bookings = vec![booking("north", "10:00")];
        let own_id = bookings[0].id.clone();
        let q = SlotQuery { exclude_booking: Some(&own_id), ..query("10:00", "north") };
        assert!(is_slot_available(&config(), &q, &bookings, day_before()));
    }

    #[test]
    fn test_working_hours_grid() {
        let config = config();
        assert_eq!(check_slot(&config, &query("08:00", "main"), &[], day_before()), Err(SlotRejection::OutsideWorkingHours));
        assert_eq!(check_slot(&config, &query("10:30", "main"), &[], day_before()), Err(SlotRejection::OutsideWorkingHours));
        // would end at 13:00, after closing
        assert_eq!(check_slot(&config, &query("12:00", "main"), &[], day_before()), Err(SlotRejection::OutsideWorkingHours));
        assert_eq!(check_slot(&config, &query("ten", "main"), &[], day_before()), Err(SlotRejection::InvalidTimeSlot));
        assert!(is_slot_available(&config, &query("9:00", "main"), &[], day_before()));
    }

    #[test]
    fn test_closed_day() {
        let mut config = config();
        config.working_hours = WeekdayHours::default();
        assert_eq!(check_slot(&config, &query("10:00", "main"), &[], day_before()), Err(SlotRejection::ClosedDay));
        assert!(list_slots(&config, date(), "main", &[], day_before()).is_empty());
    }

    #[test]
    fn test_dst_gap_slot_rejected() {
        let mut config = config();
        config.timezone = "Europe/Berlin".into();
        config.lead_time_minutes = 0;
        config.working_hours = WeekdayHours::every_day("00:00", "06:00");
        // clocks jump from 02:00 to 03:00 on 2030-03-31 in Berlin
        let dst_day = NaiveDate::from_ymd_opt(2030, 3, 31).unwrap();
        let q = SlotQuery { date: dst_day, time_slot: "02:00", branch_id: "main", exclude_booking: None };
        assert_eq!(check_slot(&config, &q, &[], day_before()), Err(SlotRejection::NonexistentLocalTime));
    }

    #[test]
    fn test_lead_time_uses_business_timezone() {
        let mut config = config();
        config.timezone = "America/New_York".into();
        config.lead_time_minutes = 60;
        // 09:00 in New York on 2030-03-14 is 13:00 UTC
        let now = Utc.with_ymd_and_hms(2030, 3, 14, 11, 30, 0).unwrap();
        assert!(is_slot_available(&config, &query("09:00", "main"), &[], now));
        let now = Utc.with_ymd_and_hms(2030, 3, 14, 12, 30, 0).unwrap();
        assert!(!is_slot_available(&config, &query("09:00", "main"), &[], now));
    }

    #[test]
    fn test_list_slots_reports_each_grid_slot() {
        let mut config = config();
        // 2030-03-14 is a Thursday; other days must not leak into the grid
        config.working_hours.monday.push(TimeWindow::new("14:00", "15:00"));

        let bookings = vec![booking("main", "09:00"), booking("main", "09:00"), booking("main", "10:00")];
        let slots = list_slots(&config, date(), "main", &bookings, day_before());

        let times: Vec<&str> = slots.iter().map(|s| s.time_slot.as_str()).collect();
        assert_eq!(times, vec!["09:00", "10:00", "11:00"]);
        assert!(!slots[0].available);
        assert_eq!(slots[0].reason, Some(SlotRejection::FullyBooked));
        assert!(slots[1].available);
        assert_eq!(slots[1].booked, 1);
        assert_eq!(slots[2].booked, 0);
    }

    #[test]
    fn test_normalize_time_slot() {
        assert_eq!(normalize_time_slot("9:05").as_deref(), Some("09:05"));
        assert_eq!(normalize_time_slot(" 14:30 ").as_deref(), Some("14:30"));
        assert_eq!(normalize_time_slot("25:00"), None);
    }
}
