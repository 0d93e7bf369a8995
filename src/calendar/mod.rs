//! Calendar day-content aggregation.
//!
//! Expands recurring events into concrete occurrences and groups them by the
//! UTC days they touch, the shape the dashboard's month view renders.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Event, Recurrence};

/// Widest window a single calendar request may cover.
pub const MAX_WINDOW_DAYS: i64 = 366;

/// Upper bound on occurrences expanded per event and request.
const MAX_OCCURRENCES: usize = 2_000;

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl CalendarQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.to < self.from {
            return Err(AppError::Validation("`to` must not be before `from`".to_string()));
        }
        if (self.to - self.from).num_days() + 1 > MAX_WINDOW_DAYS {
            return Err(AppError::Validation(format!(
                "Calendar window may span at most {} days",
                MAX_WINDOW_DAYS
            )));
        }
        Ok(())
    }

    /// Half-open instant range `[from 00:00, to+1 00:00)`.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (start_of(self.from), start_of(self.to + Duration::days(1)))
    }
}

/// One concrete instance of an event.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub event_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub recurring: bool,
    pub color: Option<String>,
    pub tipo_evento_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub events: Vec<Occurrence>,
}

/// Group every occurrence of `events` by the days in `[from, to]` it touches.
/// Days without content are omitted.
pub fn day_contents(events: &[Event], from: NaiveDate, to: NaiveDate) -> Vec<CalendarDay> {
    let mut days: BTreeMap<NaiveDate, Vec<Occurrence>> = BTreeMap::new();
    let window_start = start_of(from);
    let window_end = start_of(to + Duration::days(1));

    for event in events {
        for (start, end) in occurrences(event, window_start, window_end) {
            let (first, last) = touched_days(start, end);
            let first = first.max(from);
            let last = last.min(to);
            let mut day = first;
            while day <= last {
                days.entry(day).or_default().push(Occurrence {
                    event_id: event.id.clone(),
                    title: event.title.clone(),
                    start,
                    end,
                    all_day: event.all_day,
                    recurring: event.recurrence != Recurrence::None,
                    color: event.color.clone(),
                    tipo_evento_id: event.tipo_evento_id.clone(),
                });
                day += Duration::days(1);
            }
        }
    }

    days.into_iter()
        .map(|(date, mut events)| {
            events.sort_by(|a, b| {
                b.all_day
                    .cmp(&a.all_day)
                    .then(a.start.cmp(&b.start))
                    .then_with(|| a.title.cmp(&b.title))
            });
            CalendarDay { date, events }
        })
        .collect()
}

/// Occurrences of `event` that intersect `[window_start, window_end)`.
fn occurrences(
    event: &Event,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let duration = event.end - event.start;
    let mut out = Vec::new();

    let mut n = first_candidate(event, duration, window_start);
    while out.len() < MAX_OCCURRENCES {
        let Some(start) = nth_start(event, n) else {
            break;
        };
        if start >= window_end {
            break;
        }
        if let Some(until) = event.recurrence_until {
            if start.date_naive() > until {
                break;
            }
        }

        let end = start + duration;
        if intersects(start, end, window_start, window_end) {
            out.push((start, end));
        }

        if event.recurrence == Recurrence::None {
            break;
        }
        n += 1;
    }
    out
}

/// Skip straight to the first fixed-step occurrence that could reach the window.
fn first_candidate(event: &Event, duration: Duration, window_start: DateTime<Utc>) -> u32 {
    let step = match event.recurrence {
        Recurrence::Daily => Duration::days(1),
        Recurrence::Weekly => Duration::weeks(1),
        _ => return 0,
    };
    let gap = window_start - (event.start + duration);
    if gap <= Duration::zero() {
        return 0;
    }
    u32::try_from(gap.num_seconds() / step.num_seconds()).unwrap_or(u32::MAX)
}

/// Start of the `n`-th occurrence. Month arithmetic clamps to the month's last day.
fn nth_start(event: &Event, n: u32) -> Option<DateTime<Utc>> {
    match event.recurrence {
        Recurrence::None => (n == 0).then_some(event.start),
        Recurrence::Daily => event.start.checked_add_signed(Duration::days(i64::from(n))),
        Recurrence::Weekly => event.start.checked_add_signed(Duration::weeks(i64::from(n))),
        Recurrence::Monthly => event.start.checked_add_months(Months::new(n)),
        Recurrence::Yearly => event
            .start
            .checked_add_months(Months::new(n.checked_mul(12)?)),
    }
}

fn intersects(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> bool {
    if start == end {
        return start >= window_start && start < window_end;
    }
    start < window_end && end > window_start
}

/// First and last calendar day an occurrence is visible on.
///
/// A non-empty occurrence ending exactly at midnight does not show on that day.
fn touched_days(start: DateTime<Utc>, end: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
    let first = start.date_naive();
    if end <= start {
        return (first, first);
    }
    let last = (end - Duration::nanoseconds(1)).date_naive();
    (first, last.max(first))
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}
