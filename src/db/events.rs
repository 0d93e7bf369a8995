//! Event persistence.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::repository::parse_column;
use super::{now_timestamp, Repository};
use crate::errors::AppError;
use crate::models::{
    merge_nullable, CreateEventRequest, Event, EventRange, Recurrence, UpdateEventRequest,
};

const EVENT_COLUMNS: &str = "id, title, description, start_at, end_at, all_day, recurrence, recurrence_until, tipo_evento_id, color, location, validator, notification_name, created_by, created_at, updated_at";

impl Repository {
    /// List events, optionally restricted to those that can touch `range`.
    ///
    /// One-off events must overlap the window; recurring events are included
    /// whenever their series starts before the window ends.
    pub async fn list_events(&self, range: &EventRange) -> Result<Vec<Event>, AppError> {
        let from = range.from.map(format_datetime);
        let to = range.to.map(format_datetime);

        let rows = sqlx::query(&format!(
            r#"SELECT {EVENT_COLUMNS} FROM events
               WHERE (?1 IS NULL OR start_at < ?1)
                 AND (?2 IS NULL OR recurrence != 'none' OR end_at >= ?2)
               ORDER BY start_at, title"#
        ))
        .bind(&to)
        .bind(&from)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(event_from_row).collect::<Result<_, _>>()?)
    }

    /// Events that may have an occurrence in `[from, to)`.
    pub async fn events_overlapping(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>, AppError> {
        self.list_events(&EventRange {
            from: Some(from),
            to: Some(to),
        })
        .await
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(event_from_row).transpose()?)
    }

    pub async fn create_event(
        &self,
        request: &CreateEventRequest,
        created_by: &str,
    ) -> Result<Event, AppError> {
        let now = now_timestamp();
        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title.trim().to_string(),
            description: request.description.clone(),
            start: request.start,
            end: request.end.unwrap_or(request.start),
            all_day: request.all_day,
            recurrence: request.recurrence,
            recurrence_until: request.recurrence_until,
            tipo_evento_id: request.tipo_evento_id.clone(),
            color: request.color.clone(),
            location: request.location.clone(),
            validator: request.validator.clone(),
            notification_name: request.notification_name.clone(),
            created_by: created_by.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };
        event.validate()?;

        sqlx::query(&format!(
            "INSERT INTO events ({EVENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(format_datetime(event.start))
        .bind(format_datetime(event.end))
        .bind(event.all_day as i32)
        .bind(event.recurrence.as_str())
        .bind(event.recurrence_until.map(|d| d.to_string()))
        .bind(&event.tipo_evento_id)
        .bind(&event.color)
        .bind(&event.location)
        .bind(&event.validator)
        .bind(&event.notification_name)
        .bind(&event.created_by)
        .bind(&event.created_at)
        .bind(&event.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn update_event(
        &self,
        id: &str,
        request: &UpdateEventRequest,
    ) -> Result<Event, AppError> {
        let existing = self
            .get_event(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", id)))?;

        let event = Event {
            title: request
                .title
                .as_deref()
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| existing.title.clone()),
            description: merge_nullable(&request.description, &existing.description),
            start: request.start.unwrap_or(existing.start),
            end: request.end.unwrap_or(existing.end),
            all_day: request.all_day.unwrap_or(existing.all_day),
            recurrence: request.recurrence.unwrap_or(existing.recurrence),
            recurrence_until: merge_nullable(&request.recurrence_until, &existing.recurrence_until),
            tipo_evento_id: merge_nullable(&request.tipo_evento_id, &existing.tipo_evento_id),
            color: merge_nullable(&request.color, &existing.color),
            location: merge_nullable(&request.location, &existing.location),
            validator: merge_nullable(&request.validator, &existing.validator),
            notification_name: merge_nullable(
                &request.notification_name,
                &existing.notification_name,
            ),
            updated_at: now_timestamp(),
            ..existing
        };
        event.validate()?;

        sqlx::query(
            r#"UPDATE events SET title = ?, description = ?, start_at = ?, end_at = ?, all_day = ?,
                   recurrence = ?, recurrence_until = ?, tipo_evento_id = ?, color = ?, location = ?,
                   validator = ?, notification_name = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(format_datetime(event.start))
        .bind(format_datetime(event.end))
        .bind(event.all_day as i32)
        .bind(event.recurrence.as_str())
        .bind(event.recurrence_until.map(|d| d.to_string()))
        .bind(&event.tipo_evento_id)
        .bind(&event.color)
        .bind(&event.location)
        .bind(&event.validator)
        .bind(&event.notification_name)
        .bind(&event.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event {} not found", id)));
        }
        Ok(())
    }
}

/// Fixed-width UTC so that string comparison in SQL orders chronologically.
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_datetime(column: &str, raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

fn event_from_row(row: &SqliteRow) -> Result<Event, sqlx::Error> {
    let start: String = row.try_get("start_at")?;
    let end: String = row.try_get("end_at")?;
    let all_day: i32 = row.try_get("all_day")?;
    let recurrence: String = row.try_get("recurrence")?;
    let until: Option<String> = row.try_get("recurrence_until")?;

    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        start: parse_datetime("start_at", &start)?,
        end: parse_datetime("end_at", &end)?,
        all_day: all_day != 0,
        recurrence: parse_column("recurrence", &recurrence, Recurrence::parse)?,
        recurrence_until: until.and_then(|d| d.parse::<NaiveDate>().ok()),
        tipo_evento_id: row.try_get("tipo_evento_id")?,
        color: row.try_get("color")?,
        location: row.try_get("location")?,
        validator: row.try_get("validator")?,
        notification_name: row.try_get("notification_name")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
