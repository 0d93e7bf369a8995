//! Ticket persistence and dashboard statistics.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::repository::parse_column;
use super::{now_timestamp, Repository};
use crate::errors::AppError;
use crate::models::{
    merge_nullable, CreateTicketRequest, DailyCount, Priority, PriorityCounts, Status,
    StatusCounts, Ticket, TicketFilter, TicketStats, UpdateTicketRequest,
};

const TICKET_COLUMNS: &str = "id, title, description, status, priority, tema_id, requester, assignee_id, created_by, created_at, updated_at, resolved_at";

/// Longest window `ticket_stats` accepts.
pub const MAX_STATS_DAYS: i64 = 90;

impl Repository {
    pub async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {TICKET_COLUMNS} FROM tickets
               WHERE (?1 IS NULL OR status = ?1)
                 AND (?2 IS NULL OR priority = ?2)
                 AND (?3 IS NULL OR assignee_id = ?3)
               ORDER BY created_at DESC"#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.priority.map(|p| p.as_str()))
        .bind(&filter.assignee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(ticket_from_row).collect::<Result<_, _>>()?)
    }

    pub async fn get_ticket(&self, id: &str) -> Result<Option<Ticket>, AppError> {
        let row = sqlx::query(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(ticket_from_row).transpose()?)
    }

    pub async fn create_ticket(
        &self,
        request: &CreateTicketRequest,
        created_by: &str,
    ) -> Result<Ticket, AppError> {
        let now = now_timestamp();
        let ticket = Ticket {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title.trim().to_string(),
            description: request.description.clone(),
            status: request.status,
            priority: request.priority,
            tema_id: request.tema_id.clone(),
            requester: request.requester.clone(),
            assignee_id: request.assignee_id.clone(),
            created_by: created_by.to_string(),
            created_at: now.clone(),
            updated_at: now.clone(),
            resolved_at: request.status.is_done().then(|| now.clone()),
        };
        ticket.validate()?;

        sqlx::query(&format!(
            "INSERT INTO tickets ({TICKET_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&ticket.id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(&ticket.tema_id)
        .bind(&ticket.requester)
        .bind(&ticket.assignee_id)
        .bind(&ticket.created_by)
        .bind(&ticket.created_at)
        .bind(&ticket.updated_at)
        .bind(&ticket.resolved_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(ticket_id = %ticket.id, priority = ticket.priority.as_str(), "Ticket created");
        Ok(ticket)
    }

    pub async fn update_ticket(
        &self,
        id: &str,
        request: &UpdateTicketRequest,
    ) -> Result<Ticket, AppError> {
        let mut ticket = self
            .get_ticket(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", id)))?;
        let now = now_timestamp();

        if let Some(title) = &request.title {
            ticket.title = title.trim().to_string();
        }
        ticket.description = merge_nullable(&request.description, &ticket.description);
        ticket.priority = request.priority.unwrap_or(ticket.priority);
        ticket.tema_id = merge_nullable(&request.tema_id, &ticket.tema_id);
        ticket.requester = merge_nullable(&request.requester, &ticket.requester);
        ticket.assignee_id = merge_nullable(&request.assignee_id, &ticket.assignee_id);
        if let Some(status) = request.status {
            ticket.transition(status, &now);
        }
        ticket.updated_at = now;
        ticket.validate()?;

        sqlx::query(
            r#"UPDATE tickets SET title = ?, description = ?, status = ?, priority = ?, tema_id = ?,
                   requester = ?, assignee_id = ?, updated_at = ?, resolved_at = ?
               WHERE id = ?"#,
        )
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .bind(&ticket.tema_id)
        .bind(&ticket.requester)
        .bind(&ticket.assignee_id)
        .bind(&ticket.updated_at)
        .bind(&ticket.resolved_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(ticket)
    }

    pub async fn delete_ticket(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Ticket {} not found", id)));
        }
        Ok(())
    }

    /// Aggregate ticket counts for the `days` days ending on `today` (inclusive).
    pub async fn ticket_stats(&self, days: i64, today: NaiveDate) -> Result<TicketStats, AppError> {
        if !(1..=MAX_STATS_DAYS).contains(&days) {
            return Err(AppError::Validation(format!(
                "days must be between 1 and {}",
                MAX_STATS_DAYS
            )));
        }
        let first_day = today - Duration::days(days - 1);
        let since = first_day.to_string();

        let mut by_status = StatusCounts::default();
        for row in sqlx::query("SELECT status, COUNT(*) AS n FROM tickets GROUP BY status")
            .fetch_all(&self.pool)
            .await?
        {
            let status: String = row.try_get("status")?;
            by_status.add(parse_column("status", &status, Status::parse)?, row.try_get("n")?);
        }

        let mut by_priority = PriorityCounts::default();
        for row in sqlx::query("SELECT priority, COUNT(*) AS n FROM tickets GROUP BY priority")
            .fetch_all(&self.pool)
            .await?
        {
            let priority: String = row.try_get("priority")?;
            by_priority.add(
                parse_column("priority", &priority, Priority::parse)?,
                row.try_get("n")?,
            );
        }

        let created = self.count_per_day("created_at", &since).await?;
        let resolved = self.count_per_day("resolved_at", &since).await?;

        let resolution_rows =
            sqlx::query("SELECT created_at, resolved_at FROM tickets WHERE resolved_at IS NOT NULL")
                .fetch_all(&self.pool)
                .await?;
        let mut durations = Vec::with_capacity(resolution_rows.len());
        for row in &resolution_rows {
            let created_at: String = row.try_get("created_at")?;
            let resolved_at: String = row.try_get("resolved_at")?;
            durations.push((created_at, resolved_at));
        }

        let total = by_status.open + by_status.in_progress + by_status.resolved + by_status.closed;
        Ok(TicketStats {
            total,
            open: by_status.open + by_status.in_progress,
            by_status,
            by_priority,
            created_per_day: fill_days(first_day, days, &created),
            resolved_per_day: fill_days(first_day, days, &resolved),
            avg_resolution_hours: average_hours(&durations),
        })
    }

    /// `column` is one of two fixed timestamp column names, never user input.
    async fn count_per_day(
        &self,
        column: &'static str,
        since: &str,
    ) -> Result<HashMap<NaiveDate, i64>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT substr({column}, 1, 10) AS day, COUNT(*) AS n FROM tickets WHERE {column} >= ? GROUP BY day"
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = HashMap::new();
        for row in &rows {
            let day: String = row.try_get("day")?;
            if let Ok(date) = day.parse::<NaiveDate>() {
                counts.insert(date, row.try_get("n")?);
            }
        }
        Ok(counts)
    }
}

/// One entry per day starting at `first_day`, zero where nothing happened.
pub(crate) fn fill_days(
    first_day: NaiveDate,
    days: i64,
    counts: &HashMap<NaiveDate, i64>,
) -> Vec<DailyCount> {
    (0..days)
        .map(|offset| {
            let date = first_day + Duration::days(offset);
            DailyCount {
                date,
                count: counts.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Mean hours between creation and resolution; unparseable pairs are skipped.
pub(crate) fn average_hours(pairs: &[(String, String)]) -> Option<f64> {
    let hours: Vec<f64> = pairs
        .iter()
        .filter_map(|(created, resolved)| {
            let created = DateTime::parse_from_rfc3339(created).ok()?;
            let resolved = DateTime::parse_from_rfc3339(resolved).ok()?;
            Some((resolved - created).num_seconds() as f64 / 3600.0)
        })
        .collect();

    if hours.is_empty() {
        None
    } else {
        Some(hours.iter().sum::<f64>() / hours.len() as f64)
    }
}

fn ticket_from_row(row: &SqliteRow) -> Result<Ticket, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    Ok(Ticket {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: parse_column("status", &status, Status::parse)?,
        priority: parse_column("priority", &priority, Priority::parse)?,
        tema_id: row.try_get("tema_id")?,
        requester: row.try_get("requester")?,
        assignee_id: row.try_get("assignee_id")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        resolved_at: row.try_get("resolved_at")?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{NaiveDate, Utc};

    use super::{average_hours, fill_days};
    use crate::db::test_support;
    use crate::errors::AppError;
    use crate::models::{
        CatalogKind, CreateCatalogEntryRequest, CreateTicketRequest, Priority, Status,
        TicketFilter, UpdateTicketRequest,
    };

    fn request(title: &str, priority: Priority) -> CreateTicketRequest {
        CreateTicketRequest {
            title: title.to_string(),
            description: None,
            status: Status::Open,
            priority,
            tema_id: None,
            requester: Some("recepción".to_string()),
            assignee_id: None,
        }
    }

    #[test]
    fn test_fill_days_zero_fills() {
        let first = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let mut counts = HashMap::new();
        counts.insert(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(), 4);
        counts.insert(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(), 9);

        let filled = fill_days(first, 4, &counts);
        let values: Vec<(String, i64)> = filled
            .iter()
            .map(|d| (d.date.to_string(), d.count))
            .collect();
        assert_eq!(
            values,
            vec![
                ("2024-02-27".to_string(), 0),
                ("2024-02-28".to_string(), 0),
                ("2024-02-29".to_string(), 4),
                ("2024-03-01".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_average_hours() {
        assert_eq!(average_hours(&[]), None);
        let pairs = vec![
            (
                "2024-01-01T00:00:00.000Z".to_string(),
                "2024-01-01T02:00:00.000Z".to_string(),
            ),
            (
                "2024-01-01T00:00:00.000Z".to_string(),
                "2024-01-01T04:00:00.000Z".to_string(),
            ),
            ("garbage".to_string(), "2024-01-01T04:00:00.000Z".to_string()),
        ];
        assert_eq!(average_hours(&pairs), Some(3.0));
    }

    #[tokio::test]
    async fn test_ticket_lifecycle() {
        let (repo, _dir) = test_support::repo().await;
        let user = test_support::user(&repo, "a@example.com").await;

        let ticket = repo
            .create_ticket(&request("Impresora", Priority::Low), &user.id)
            .await
            .unwrap();
        assert!(ticket.resolved_at.is_none());

        let resolved = repo
            .update_ticket(
                &ticket.id,
                &UpdateTicketRequest {
                    status: Some(Status::Resolved),
                    assignee_id: Some(Some(user.id.clone())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.assignee_id.as_deref(), Some(user.id.as_str()));

        let mine = repo
            .list_tickets(&TicketFilter {
                assignee_id: Some(user.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        let reopened = repo
            .update_ticket(
                &ticket.id,
                &UpdateTicketRequest {
                    status: Some(Status::Open),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(reopened.resolved_at.is_none());

        repo.delete_ticket(&ticket.id).await.unwrap();
        assert!(matches!(
            repo.delete_ticket(&ticket.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deleting_tema_nulls_ticket_reference() {
        let (repo, _dir) = test_support::repo().await;
        let user = test_support::user(&repo, "a@example.com").await;
        let tema = repo
            .create_catalog_entry(
                CatalogKind::Temas,
                &CreateCatalogEntryRequest {
                    name: "Hardware".to_string(),
                    description: None,
                    color: None,
                },
            )
            .await
            .unwrap();

        let mut req = request("Monitor", Priority::Medium);
        req.tema_id = Some(tema.id.clone());
        let ticket = repo.create_ticket(&req, &user.id).await.unwrap();

        repo.delete_catalog_entry(CatalogKind::Temas, &tema.id)
            .await
            .unwrap();
        let ticket = repo.get_ticket(&ticket.id).await.unwrap().unwrap();
        assert!(ticket.tema_id.is_none());
    }

    #[tokio::test]
    async fn test_stats() {
        let (repo, _dir) = test_support::repo().await;
        let user = test_support::user(&repo, "a@example.com").await;

        repo.create_ticket(&request("A", Priority::High), &user.id)
            .await
            .unwrap();
        repo.create_ticket(&request("B", Priority::High), &user.id)
            .await
            .unwrap();
        let c = repo
            .create_ticket(&request("C", Priority::Urgent), &user.id)
            .await
            .unwrap();
        repo.update_ticket(
            &c.id,
            &UpdateTicketRequest {
                status: Some(Status::Closed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let today = Utc::now().date_naive();
        let stats = repo.ticket_stats(7, today).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.by_status.closed, 1);
        assert_eq!(stats.by_priority.high, 2);
        assert_eq!(stats.by_priority.urgent, 1);
        assert_eq!(stats.created_per_day.len(), 7);
        assert_eq!(stats.created_per_day.last().unwrap().date, today);
        assert_eq!(stats.created_per_day.last().unwrap().count, 3);
        assert_eq!(stats.resolved_per_day.last().unwrap().count, 1);
        assert!(stats.avg_resolution_hours.unwrap() >= 0.0);

        assert!(matches!(
            repo.ticket_stats(0, today).await,
            Err(AppError::Validation(_))
        ));
    }
}
