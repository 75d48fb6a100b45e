use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use sqlx::FromRow;
use std::collections::{BTreeMap, HashSet};

const MINUTES_PER_DAY: u32 = 1440;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    pub fn new(start: &str, end: &str) -> Self {
        Self { start: start.to_string(), end: end.to_string() }
    }

    /// Window bounds in minutes since midnight. A closing time of 23:59 means end of day.
    pub fn minutes(&self) -> Option<(u32, u32)> {
        let start = parse_hhmm(&self.start)?;
        let end = parse_hhmm(&self.end)?;
        let start_min = start.hour() * 60 + start.minute();
        let mut end_min = end.hour() * 60 + end.minute();
        if end_min == MINUTES_PER_DAY - 1 {
            end_min = MINUTES_PER_DAY;
        }
        Some((start_min, end_min))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct WeekdayHours {
    pub monday: Vec<TimeWindow>,
    pub tuesday: Vec<TimeWindow>,
    pub wednesday: Vec<TimeWindow>,
    pub thursday: Vec<TimeWindow>,
    pub friday: Vec<TimeWindow>,
    pub saturday: Vec<TimeWindow>,
    pub sunday: Vec<TimeWindow>,
}

impl WeekdayHours {
    pub fn every_day(start: &str, end: &str) -> Self {
        let day = vec![TimeWindow::new(start, end)];
        Self {
            monday: day.clone(),
            tuesday: day.clone(),
            wednesday: day.clone(),
            thursday: day.clone(),
            friday: day.clone(),
            saturday: day.clone(),
            sunday: day,
        }
    }

    pub fn for_weekday(&self, weekday: Weekday) -> &[TimeWindow] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    fn all(&self) -> [(&'static str, &[TimeWindow]); 7] {
        [
            ("monday", self.monday.as_slice()),
            ("tuesday", self.tuesday.as_slice()),
            ("wednesday", self.wednesday.as_slice()),
            ("thursday", self.thursday.as_slice()),
            ("friday", self.friday.as_slice()),
            ("saturday", self.saturday.as_slice()),
            ("sunday", self.sunday.as_slice()),
        ]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Branch {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Overrides the global per-slot capacity for this branch.
    #[serde(default)]
    pub capacity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MembershipPackage {
    pub id: String,
    pub name: String,
    pub duration_months: u32,
    pub price_cents: i64,
    #[serde(default)]
    pub washes_included: Option<i32>,
}

/// Business configuration edited from the admin dashboard. Persisted as one JSON blob.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    pub timezone: String,
    pub lead_time_minutes: i64,
    pub slot_interval_minutes: u32,
    pub slot_capacity: i32,
    pub working_hours: WeekdayHours,
    pub blackout_dates: Vec<NaiveDate>,
    pub branches: Vec<Branch>,
    /// service type -> vehicle type -> price in cents
    pub pricing: BTreeMap<String, BTreeMap<String, i64>>,
    pub packages: Vec<MembershipPackage>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        let mut working_hours = WeekdayHours::every_day("08:00", "18:00");
        working_hours.sunday = vec![TimeWindow::new("10:00", "16:00")];

        let mut pricing = BTreeMap::new();
        for (service, base) in [("basic", 1500), ("deluxe", 2500), ("premium", 4000)] {
            let mut by_vehicle = BTreeMap::new();
            by_vehicle.insert("sedan".to_string(), base);
            by_vehicle.insert("suv".to_string(), base + 500);
            by_vehicle.insert("truck".to_string(), base + 1000);
            pricing.insert(service.to_string(), by_vehicle);
        }

        Self {
            timezone: "UTC".to_string(),
            lead_time_minutes: 60,
            slot_interval_minutes: 30,
            slot_capacity: 2,
            working_hours,
            blackout_dates: Vec::new(),
            branches: vec![Branch {
                id: "main".to_string(),
                name: "Main Branch".to_string(),
                address: String::new(),
                active: true,
                capacity: None,
            }],
            pricing,
            packages: vec![
                MembershipPackage {
                    id: "basic-monthly".to_string(),
                    name: "Basic Monthly".to_string(),
                    duration_months: 1,
                    price_cents: 3999,
                    washes_included: Some(4),
                },
                MembershipPackage {
                    id: "unlimited-monthly".to_string(),
                    name: "Unlimited Monthly".to_string(),
                    duration_months: 1,
                    price_cents: 7999,
                    washes_included: None,
                },
                MembershipPackage {
                    id: "premium-annual".to_string(),
                    name: "Premium Annual".to_string(),
                    duration_months: 12,
                    price_cents: 79900,
                    washes_included: None,
                },
            ],
        }
    }
}

impl AdminConfig {
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }

    /// Calendar date at the business location.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz()).date_naive()
    }

    pub fn branch(&self, id: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.id == id)
    }

    pub fn active_branch(&self, id: &str) -> Option<&Branch> {
        self.branch(id).filter(|b| b.active)
    }

    /// First active branch; used when a request does not name one.
    pub fn default_branch(&self) -> Option<&Branch> {
        self.branches.iter().find(|b| b.active)
    }

    pub fn capacity_for(&self, branch: &Branch) -> i32 {
        branch.capacity.unwrap_or(self.slot_capacity)
    }

    pub fn is_blackout(&self, date: NaiveDate) -> bool {
        self.blackout_dates.contains(&date)
    }

    pub fn price_for(&self, service_type: &str, vehicle_type: &str) -> Option<i64> {
        self.pricing.get(service_type)?.get(vehicle_type).copied()
    }

    pub fn package(&self, id: &str) -> Option<&MembershipPackage> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// Every slot start of the given weekday, in minutes since midnight, sorted.
    pub fn slot_starts(&self, weekday: Weekday) -> Vec<u32> {
        let interval = self.slot_interval_minutes;
        if interval == 0 {
            return Vec::new();
        }

        let mut starts = Vec::new();
        for window in self.working_hours.for_weekday(weekday) {
            if let Some((start, end)) = window.minutes() {
                let mut cursor = start;
                while cursor + interval <= end {
                    starts.push(cursor);
                    cursor += interval;
                }
            }
        }
        starts.sort_unstable();
        starts.dedup();
        starts
    }

    pub fn normalize(&mut self) {
        self.blackout_dates.sort_unstable();
        self.blackout_dates.dedup();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timezone.parse::<Tz>().is_err() {
            return Err(format!("Unknown timezone: {}", self.timezone));
        }
        if self.slot_interval_minutes == 0 || self.slot_interval_minutes > MINUTES_PER_DAY {
            return Err("slot_interval_minutes must be between 1 and 1440".into());
        }
        if self.slot_capacity <= 0 {
            return Err("slot_capacity must be positive".into());
        }
        if self.lead_time_minutes < 0 {
            return Err("lead_time_minutes cannot be negative".into());
        }

        for (day, windows) in self.working_hours.all() {
            for window in windows {
                match window.minutes() {
                    Some((start, end)) if start < end => {}
                    Some(_) => return Err(format!("{}: opening time must be before closing time", day)),
                    None => return Err(format!("{}: times must use HH:MM", day)),
                }
            }
        }

        if self.branches.is_empty() {
            return Err("At least one branch is required".into());
        }
        let mut branch_ids = HashSet::new();
        for branch in &self.branches {
            if branch.id.trim().is_empty() {
                return Err("Branch id cannot be empty".into());
            }
            if !branch_ids.insert(branch.id.as_str()) {
                return Err(format!("Duplicate branch id: {}", branch.id));
            }
            if branch.capacity.is_some_and(|c| c <= 0) {
                return Err(format!("Branch {} capacity must be positive", branch.id));
            }
        }

        for (service, by_vehicle) in &self.pricing {
            if let Some((vehicle, _)) = by_vehicle.iter().find(|(_, price)| **price < 0) {
                return Err(format!("Negative price for {} / {}", service, vehicle));
            }
        }

        let mut package_ids = HashSet::new();
        for package in &self.packages {
            if !package_ids.insert(package.id.as_str()) {
                return Err(format!("Duplicate package id: {}", package.id));
            }
            if package.duration_months == 0 {
                return Err(format!("Package {} must last at least one month", package.id));
            }
            if package.price_cents < 0 {
                return Err(format!("Package {} has a negative price", package.id));
            }
        }

        Ok(())
    }
}

#[derive(Debug, FromRow, Clone)]
pub struct AdminConfigRecord {
    pub id: i32,
    pub config_json: String,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn default_true() -> bool {
    true
}
