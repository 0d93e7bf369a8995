//! Support tickets and dashboard statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{double_option, Priority, Status};
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub tema_id: Option<String>,
    /// Free-form name/contact of whoever raised the ticket
    pub requester: Option<String>,
    pub assignee_id: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    pub resolved_at: Option<String>,
}

impl Ticket {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Ticket title is required".to_string()));
        }
        Ok(())
    }

    /// Keep `resolved_at` in step with a status change.
    pub fn transition(&mut self, status: Status, now: &str) {
        match (self.status.is_done(), status.is_done()) {
            (false, true) => self.resolved_at = Some(now.to_string()),
            (true, false) => self.resolved_at = None,
            _ => {}
        }
        self.status = status;
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tema_id: Option<String>,
    #[serde(default)]
    pub requester: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    pub tema_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub requester: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: Status, count: i64) {
        match status {
            Status::Open => self.open += count,
            Status::InProgress => self.in_progress += count,
            Status::Resolved => self.resolved += count,
            Status::Closed => self.closed += count,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCounts {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub urgent: i64,
}

impl PriorityCounts {
    pub fn add(&mut self, priority: Priority, count: i64) {
        match priority {
            Priority::Low => self.low += count,
            Priority::Medium => self.medium += count,
            Priority::High => self.high += count,
            Priority::Urgent => self.urgent += count,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Chart data for the dashboard's ticket widgets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: i64,
    /// Tickets not yet resolved or closed
    pub open: i64,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub created_per_day: Vec<DailyCount>,
    pub resolved_per_day: Vec<DailyCount>,
    pub avg_resolution_hours: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_stats_days")]
    pub days: i64,
}

fn default_stats_days() -> i64 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(status: Status) -> Ticket {
        Ticket {
            id: "t1".into(),
            title: "VPN caída".into(),
            description: None,
            status,
            priority: Priority::High,
            tema_id: None,
            requester: None,
            assignee_id: None,
            created_by: "u1".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
            resolved_at: None,
        }
    }

    #[test]
    fn test_transition_sets_and_clears_resolved_at() {
        let mut t = ticket(Status::Open);
        t.transition(Status::InProgress, "2024-01-02T00:00:00Z");
        assert!(t.resolved_at.is_none());

        t.transition(Status::Resolved, "2024-01-03T00:00:00Z");
        assert_eq!(t.resolved_at.as_deref(), Some("2024-01-03T00:00:00Z"));

        // resolved -> closed keeps the original resolution time
        t.transition(Status::Closed, "2024-01-04T00:00:00Z");
        assert_eq!(t.resolved_at.as_deref(), Some("2024-01-03T00:00:00Z"));

        t.transition(Status::Open, "2024-01-05T00:00:00Z");
        assert!(t.resolved_at.is_none());
    }

    #[test]
    fn test_counts_add() {
        let mut counts = StatusCounts::default();
        counts.add(Status::InProgress, 3);
        counts.add(Status::Closed, 1);
        assert_eq!(counts.in_progress, 3);
        assert_eq!(counts.closed, 1);

        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["inProgress"], 3);
    }
}
