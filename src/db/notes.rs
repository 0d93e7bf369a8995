//! Note persistence.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::repository::parse_column;
use super::{now_timestamp, Repository};
use crate::errors::AppError;
use crate::models::{
    merge_nullable, CreateNoteRequest, Note, NoteFilter, Priority, Status, UpdateNoteRequest,
};

const NOTE_COLUMNS: &str =
    "id, title, content, tipo_nota_id, status, priority, author_id, created_at, updated_at";

impl Repository {
    pub async fn list_notes(&self, filter: &NoteFilter) -> Result<Vec<Note>, AppError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {NOTE_COLUMNS} FROM notes
               WHERE (?1 IS NULL OR status = ?1)
                 AND (?2 IS NULL OR tipo_nota_id = ?2)
               ORDER BY updated_at DESC"#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(&filter.tipo_nota_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(note_from_row).collect::<Result<_, _>>()?)
    }

    pub async fn get_note(&self, id: &str) -> Result<Option<Note>, AppError> {
        let row = sqlx::query(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(note_from_row).transpose()?)
    }

    pub async fn create_note(
        &self,
        request: &CreateNoteRequest,
        author_id: &str,
    ) -> Result<Note, AppError> {
        let now = now_timestamp();
        let note = Note {
            id: uuid::Uuid::new_v4().to_string(),
            title: request.title.trim().to_string(),
            content: request.content.clone(),
            tipo_nota_id: request.tipo_nota_id.clone(),
            status: request.status,
            priority: request.priority,
            author_id: author_id.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };
        note.validate()?;

        sqlx::query(&format!(
            "INSERT INTO notes ({NOTE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&note.id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.tipo_nota_id)
        .bind(note.status.as_str())
        .bind(note.priority.as_str())
        .bind(&note.author_id)
        .bind(&note.created_at)
        .bind(&note.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(note)
    }

    pub async fn update_note(&self, id: &str, request: &UpdateNoteRequest) -> Result<Note, AppError> {
        let existing = self
            .get_note(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note {} not found", id)))?;

        let note = Note {
            title: request
                .title
                .as_deref()
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| existing.title.clone()),
            content: request.content.clone().unwrap_or_else(|| existing.content.clone()),
            tipo_nota_id: merge_nullable(&request.tipo_nota_id, &existing.tipo_nota_id),
            status: request.status.unwrap_or(existing.status),
            priority: request.priority.unwrap_or(existing.priority),
            updated_at: now_timestamp(),
            ..existing
        };
        note.validate()?;

        sqlx::query(
            "UPDATE notes SET title = ?, content = ?, tipo_nota_id = ?, status = ?, priority = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.tipo_nota_id)
        .bind(note.status.as_str())
        .bind(note.priority.as_str())
        .bind(&note.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(note)
    }

    pub async fn delete_note(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Note {} not found", id)));
        }
        Ok(())
    }
}

fn note_from_row(row: &SqliteRow) -> Result<Note, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        tipo_nota_id: row.try_get("tipo_nota_id")?,
        status: parse_column("status", &status, Status::parse)?,
        priority: parse_column("priority", &priority, Priority::parse)?,
        author_id: row.try_get("author_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
