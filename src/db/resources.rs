//! Knowledge-base resource persistence.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::repository::{parse_column, parse_json_array, to_json_array};
use super::{now_timestamp, Repository};
use crate::errors::AppError;
use crate::models::{
    merge_nullable, normalize_tags, Resource, ResourceFilter, ResourceKind,
    UpdateResourceRequest,
};

const RESOURCE_COLUMNS: &str = "id, title, description, kind, tipo_recurso_id, tags, storage_key, url, mime_type, size_bytes, created_by, created_at, updated_at";

impl Repository {
    pub async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, AppError> {
        let rows = sqlx::query(&format!(
            r#"SELECT {RESOURCE_COLUMNS} FROM resources
               WHERE (?1 IS NULL OR kind = ?1)
                 AND (?2 IS NULL OR tipo_recurso_id = ?2)
               ORDER BY created_at DESC"#
        ))
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(&filter.tipo_recurso_id)
        .fetch_all(&self.pool)
        .await?;

        let resources: Vec<Resource> = rows.iter().map(resource_from_row).collect::<Result<_, _>>()?;

        // Tags live in a JSON column; filter them here
        Ok(match filter.tag.as_deref().map(|t| t.trim().to_lowercase()) {
            Some(tag) if !tag.is_empty() => resources
                .into_iter()
                .filter(|r| r.tags.contains(&tag))
                .collect(),
            _ => resources,
        })
    }

    pub async fn get_resource(&self, id: &str) -> Result<Option<Resource>, AppError> {
        let row = sqlx::query(&format!("SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(resource_from_row).transpose()?)
    }

    /// Persist a fully-built resource (id, key and URL chosen by the caller).
    pub async fn create_resource(&self, resource: &Resource) -> Result<Resource, AppError> {
        let mut resource = resource.clone();
        resource.title = resource.title.trim().to_string();
        resource.tags = normalize_tags(&resource.tags);
        resource.validate()?;

        sqlx::query(&format!(
            "INSERT INTO resources ({RESOURCE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&resource.id)
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(resource.kind.as_str())
        .bind(&resource.tipo_recurso_id)
        .bind(to_json_array(&resource.tags))
        .bind(&resource.storage_key)
        .bind(&resource.url)
        .bind(&resource.mime_type)
        .bind(resource.size_bytes)
        .bind(&resource.created_by)
        .bind(&resource.created_at)
        .bind(&resource.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(resource)
    }

    pub async fn update_resource(
        &self,
        id: &str,
        request: &UpdateResourceRequest,
    ) -> Result<Resource, AppError> {
        let existing = self
            .get_resource(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resource {} not found", id)))?;

        if request.url.is_some() && existing.kind == ResourceKind::File {
            return Err(AppError::Validation(
                "The URL of an uploaded file cannot be changed".to_string(),
            ));
        }

        let resource = Resource {
            title: request
                .title
                .as_deref()
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| existing.title.clone()),
            description: merge_nullable(&request.description, &existing.description),
            tipo_recurso_id: merge_nullable(&request.tipo_recurso_id, &existing.tipo_recurso_id),
            tags: request
                .tags
                .as_ref()
                .map(normalize_tags)
                .unwrap_or_else(|| existing.tags.clone()),
            url: request.url.clone().unwrap_or_else(|| existing.url.clone()),
            updated_at: now_timestamp(),
            ..existing
        };
        resource.validate()?;

        sqlx::query(
            "UPDATE resources SET title = ?, description = ?, tipo_recurso_id = ?, tags = ?, url = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.tipo_recurso_id)
        .bind(to_json_array(&resource.tags))
        .bind(&resource.url)
        .bind(&resource.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(resource)
    }

    /// Delete the row and hand back what was removed so the caller can clean up storage.
    pub async fn delete_resource(&self, id: &str) -> Result<Resource, AppError> {
        let existing = self
            .get_resource(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resource {} not found", id)))?;

        sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(existing)
    }
}

fn resource_from_row(row: &SqliteRow) -> Result<Resource, sqlx::Error> {
    let kind: String = row.try_get("kind")?;
    let tags: String = row.try_get("tags")?;
    Ok(Resource {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        kind: parse_column("kind", &kind, ResourceKind::parse)?,
        tipo_recurso_id: row.try_get("tipo_recurso_id")?,
        tags: parse_json_array(&tags),
        storage_key: row.try_get("storage_key")?,
        url: row.try_get("url")?,
        mime_type: row.try_get("mime_type")?,
        size_bytes: row.try_get("size_bytes")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
