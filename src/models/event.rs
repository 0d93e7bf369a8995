//! Calendar events.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{double_option, is_hex_color};
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Recurrence::None),
            "daily" => Some(Recurrence::Daily),
            "weekly" => Some(Recurrence::Weekly),
            "monthly" => Some(Recurrence::Monthly),
            "yearly" => Some(Recurrence::Yearly),
            _ => None,
        }
    }
}

/// A calendar entry, optionally recurring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub recurrence: Recurrence,
    /// Last date (inclusive) a recurring series may start on
    pub recurrence_until: Option<NaiveDate>,
    pub tipo_evento_id: Option<String>,
    pub color: Option<String>,
    pub location: Option<String>,
    /// Person who signs off on the event
    pub validator: Option<String>,
    /// Name of the notification sent for the event
    pub notification_name: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Event {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Event title is required".to_string()));
        }
        if self.end < self.start {
            return Err(AppError::Validation(
                "Event end must not be before its start".to_string(),
            ));
        }
        if let Some(until) = self.recurrence_until {
            if until < self.start.date_naive() {
                return Err(AppError::Validation(
                    "recurrenceUntil must not be before the event start".to_string(),
                ));
            }
        }
        if let Some(color) = &self.color {
            if !is_hex_color(color) {
                return Err(AppError::Validation(
                    "Color must be in #RRGGBB format".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    /// Defaults to `start`
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub recurrence_until: Option<NaiveDate>,
    #[serde(default)]
    pub tipo_evento_id: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub validator: Option<String>,
    #[serde(default)]
    pub notification_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: Option<bool>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default, deserialize_with = "double_option")]
    pub recurrence_until: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tipo_evento_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub validator: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notification_name: Option<Option<String>>,
}

/// `GET /api/events` window, both bounds optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> Event {
        Event {
            id: "e1".into(),
            title: "Guardia".into(),
            description: None,
            start: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            all_day: false,
            recurrence: Recurrence::None,
            recurrence_until: None,
            tipo_evento_id: None,
            color: None,
            location: None,
            validator: None,
            notification_name: None,
            created_by: "u1".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(event().validate().is_ok());
    }

    #[test]
    fn test_validate_end_before_start() {
        let mut e = event();
        e.end = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_validate_until_before_start() {
        let mut e = event();
        e.recurrence = Recurrence::Daily;
        e.recurrence_until = NaiveDate::from_ymd_opt(2024, 2, 28);
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateEventRequest = serde_json::from_str(
            r#"{"title": "Backup", "start": "2024-03-01T09:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(req.recurrence, Recurrence::None);
        assert!(!req.all_day);
        assert!(req.end.is_none());
    }
}
