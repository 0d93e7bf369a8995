//! Catalog (config lookup table) persistence.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{now_timestamp, Repository};
use crate::errors::AppError;
use crate::models::{
    merge_nullable, CatalogEntry, CatalogKind, CreateCatalogEntryRequest,
    UpdateCatalogEntryRequest,
};

impl Repository {
    pub async fn list_catalog(&self, kind: CatalogKind) -> Result<Vec<CatalogEntry>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT id, name, description, color, created_at FROM {} ORDER BY name",
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(entry_from_row).collect::<Result<_, _>>()?)
    }

    pub async fn get_catalog_entry(
        &self,
        kind: CatalogKind,
        id: &str,
    ) -> Result<Option<CatalogEntry>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT id, name, description, color, created_at FROM {} WHERE id = ?",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(entry_from_row).transpose()?)
    }

    pub async fn create_catalog_entry(
        &self,
        kind: CatalogKind,
        request: &CreateCatalogEntryRequest,
    ) -> Result<CatalogEntry, AppError> {
        let entry = CatalogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            color: request.color.clone(),
            created_at: now_timestamp(),
        };
        entry.validate(kind)?;

        sqlx::query(&format!(
            "INSERT INTO {} (id, name, description, color, created_at) VALUES (?, ?, ?, ?, ?)",
            kind.table()
        ))
        .bind(&entry.id)
        .bind(&entry.name)
        .bind(&entry.description)
        .bind(&entry.color)
        .bind(&entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    pub async fn update_catalog_entry(
        &self,
        kind: CatalogKind,
        id: &str,
        request: &UpdateCatalogEntryRequest,
    ) -> Result<CatalogEntry, AppError> {
        let existing = self
            .get_catalog_entry(kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))?;

        let entry = CatalogEntry {
            id: existing.id.clone(),
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or(existing.name.clone()),
            description: merge_nullable(&request.description, &existing.description),
            color: merge_nullable(&request.color, &existing.color),
            created_at: existing.created_at,
        };
        entry.validate(kind)?;

        sqlx::query(&format!(
            "UPDATE {} SET name = ?, description = ?, color = ? WHERE id = ?",
            kind.table()
        ))
        .bind(&entry.name)
        .bind(&entry.description)
        .bind(&entry.color)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Delete an entry; rows referencing it have the reference nulled by the schema.
    pub async fn delete_catalog_entry(&self, kind: CatalogKind, id: &str) -> Result<(), AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(kind, id));
        }
        Ok(())
    }
}

fn not_found(kind: CatalogKind, id: &str) -> AppError {
    AppError::NotFound(format!("{} {} not found", kind.label(), id))
}

fn entry_from_row(row: &SqliteRow) -> Result<CatalogEntry, sqlx::Error> {
    Ok(CatalogEntry {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        color: row.try_get("color")?,
        created_at: row.try_get("created_at")?,
    })
}
