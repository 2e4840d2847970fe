//! Date and status helpers
//!
//! Every function that depends on "now" takes a `Clock`, so screens and
//! tests can pin the current moment.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use farmlog_data::domain::{Task, TaskStatus};

/// `MMM dd, yyyy`
pub const DEFAULT_PATTERN: &str = "%b %d, %Y";
/// `MMM dd`, used once a relative label no longer applies
pub const SHORT_PATTERN: &str = "%b %d";
/// Default look-ahead for the due-soon tag
pub const DUE_SOON_DAYS: u32 = 3;

/// Source of the current local date and time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Always reports the same moment
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Noon on the given day
    pub fn at_noon(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(12, 0, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Render a date with a chrono pattern; absent input renders as ""
pub fn format_date(date: Option<NaiveDate>, pattern: &str) -> String {
    date.map(|d| d.format(pattern).to_string()).unwrap_or_default()
}

/// Parse an ISO date (`2024-05-01`) or an RFC 3339 timestamp, keeping only
/// the date part
pub fn parse_iso(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| chrono::DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.date_naive()))
}

/// `format_date` over an ISO string; unparseable input renders as ""
pub fn format_iso(input: &str, pattern: &str) -> String {
    format_date(parse_iso(input), pattern)
}

/// Calendar days from today to `date` (negative in the past)
pub fn days_from_today(date: NaiveDate, clock: &dyn Clock) -> i64 {
    (date - clock.today()).num_days()
}

/// "Today", "Tomorrow", "In 3 days", "5 days ago", ... or `MMM dd` once the
/// date is more than a week away
pub fn format_relative_date(date: NaiveDate, clock: &dyn Clock) -> String {
    match days_from_today(date, clock) {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        n @ 2..=7 => format!("In {} days", n),
        n @ -7..=-2 => format!("{} days ago", -n),
        _ => date.format(SHORT_PATTERN).to_string(),
    }
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).unwrap_or_default()
}

/// The start of `date` lies strictly before now
pub fn is_overdue(date: NaiveDate, clock: &dyn Clock) -> bool {
    start_of(date) < clock.now()
}

/// The start of `date` lies strictly after now and strictly before
/// now + `days`
pub fn is_due_soon(date: NaiveDate, days: u32, clock: &dyn Clock) -> bool {
    let start = start_of(date);
    let now = clock.now();
    start > now && start < now + Duration::days(i64::from(days))
}

/// Display tag layered over a task's workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueTag {
    Overdue,
    DueSoon,
}

pub fn due_tag(date: NaiveDate, clock: &dyn Clock) -> Option<DueTag> {
    if is_overdue(date, clock) {
        Some(DueTag::Overdue)
    } else if is_due_soon(date, DUE_SOON_DAYS, clock) {
        Some(DueTag::DueSoon)
    } else {
        None
    }
}

/// What a badge shows for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Completed,
    Overdue,
    DueSoon,
    /// No tag applies; show the workflow status itself
    Status(TaskStatus),
}

impl DisplayStatus {
    pub fn for_task(task: &Task, clock: &dyn Clock) -> Self {
        if task.is_completed() {
            return DisplayStatus::Completed;
        }
        match due_tag(task.due_date, clock) {
            Some(DueTag::Overdue) => DisplayStatus::Overdue,
            Some(DueTag::DueSoon) => DisplayStatus::DueSoon,
            None => DisplayStatus::Status(task.status),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayStatus::Completed => "completed",
            DisplayStatus::Overdue => "overdue",
            DisplayStatus::DueSoon => "due-soon",
            DisplayStatus::Status(TaskStatus::Open) => "pending",
            DisplayStatus::Status(TaskStatus::InProgress) => "in-progress",
            DisplayStatus::Status(TaskStatus::Blocked) => "blocked",
            DisplayStatus::Status(TaskStatus::Completed) => "completed",
        }
    }
}
