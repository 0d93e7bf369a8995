//! Knowledge-base resource API endpoints.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{success, ApiResult, AppJson, AppQuery};
use crate::auth::AuthUser;
use crate::db::now_timestamp;
use crate::errors::AppError;
use crate::models::{
    normalize_tags, CatalogKind, CreateLinkRequest, NewUpload, Resource, ResourceFilter,
    ResourceKind, UpdateResourceRequest,
};
use crate::storage::resource_key;
use crate::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Search result with resources and metadata.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Single search result item.
#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub resource: Resource,
    pub score: f32,
}

/// Push a resource into the search index. Index failures are logged only.
async fn reindex(state: &AppState, resource: &Resource) {
    let types = state
        .repo
        .list_catalog(CatalogKind::TiposRecurso)
        .await
        .unwrap_or_default();
    if let Err(e) = state.search.index_resource(resource, &types).await {
        tracing::warn!("Failed to index resource {}: {}", resource.id, e);
    }
}

/// GET /api/resources - List resources.
pub async fn list_resources(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ResourceFilter>,
) -> ApiResult<Vec<Resource>> {
    success(state.repo.list_resources(&filter).await?)
}

/// GET /api/resources/{id} - Get a single resource.
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Resource> {
    match state.repo.get_resource(&id).await? {
        Some(resource) => success(resource),
        None => Err(AppError::NotFound(format!("Resource {} not found", id))),
    }
}

/// POST /api/resources - Register an external link.
pub async fn create_link_resource(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreateLinkRequest>,
) -> ApiResult<Resource> {
    let now = now_timestamp();
    let resource = Resource {
        id: uuid::Uuid::new_v4().to_string(),
        title: request.title,
        description: request.description,
        kind: ResourceKind::Link,
        tipo_recurso_id: request.tipo_recurso_id,
        tags: request.tags,
        storage_key: None,
        url: request.url.trim().to_string(),
        mime_type: None,
        size_bytes: None,
        created_by: user.id,
        created_at: now.clone(),
        updated_at: now,
    };

    let created = state.repo.create_resource(&resource).await?;
    reindex(&state, &created).await;
    success(created)
}

/// Split a multipart body into metadata and file contents.
async fn read_upload(multipart: &mut Multipart) -> Result<(NewUpload, Bytes), AppError> {
    let mut file: Option<(String, Option<String>, Bytes)> = None;
    let mut title = None;
    let mut description = None;
    let mut tipo_recurso_id = None;
    let mut tags = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("file").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                file = Some((file_name, content_type, data));
            }
            "title" => title = Some(field.text().await?),
            "description" => description = Some(field.text().await?),
            "tipoRecursoId" => tipo_recurso_id = Some(field.text().await?),
            "tags" => tags = normalize_tags(field.text().await?.split(',')),
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }

    let (file_name, mime_type, data) =
        file.ok_or_else(|| AppError::Validation("A `file` part is required".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let upload = NewUpload {
        title: non_empty(title).unwrap_or_else(|| file_name.clone()),
        description: non_empty(description),
        tipo_recurso_id: non_empty(tipo_recurso_id),
        tags,
        file_name,
        mime_type,
    };
    Ok((upload, data))
}

/// POST /api/resources/upload - Upload a file into storage and register it.
pub async fn upload_resource(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Resource> {
    let (upload, data) = read_upload(&mut multipart?).await?;

    let id = uuid::Uuid::new_v4().to_string();
    let key = resource_key(&id, &upload.file_name);
    let content_type = upload
        .mime_type
        .clone()
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    let size = data.len();

    let url = state.storage.put(&key, data, &content_type).await?;
    tracing::info!(
        resource_id = %id,
        key = %key,
        size,
        backend = state.storage.backend_name(),
        "Stored upload"
    );

    let now = now_timestamp();
    let resource = Resource {
        id,
        title: upload.title,
        description: upload.description,
        kind: ResourceKind::File,
        tipo_recurso_id: upload.tipo_recurso_id,
        tags: upload.tags,
        storage_key: Some(key.clone()),
        url,
        mime_type: Some(content_type),
        size_bytes: Some(size as i64),
        created_by: user.id,
        created_at: now.clone(),
        updated_at: now,
    };

    let created = match state.repo.create_resource(&resource).await {
        Ok(created) => created,
        Err(e) => {
            // Don't leave an orphaned object behind
            if let Err(cleanup) = state.storage.delete(&key).await {
                tracing::warn!("Failed to remove orphaned object {}: {}", key, cleanup);
            }
            return Err(e);
        }
    };

    reindex(&state, &created).await;
    success(created)
}

/// PUT /api/resources/{id} - Update resource metadata.
pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateResourceRequest>,
) -> ApiResult<Resource> {
    let updated = state.repo.update_resource(&id, &request).await?;
    reindex(&state, &updated).await;
    success(updated)
}

/// DELETE /api/resources/{id} - Delete a resource and its stored file.
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let removed = state.repo.delete_resource(&id).await?;

    if let Some(key) = removed.storage_key.as_deref() {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!("Failed to delete stored object {}: {}", key, e);
        }
    }

    // Remove from search index
    if let Err(e) = state.search.remove_resource(&id).await {
        tracing::warn!("Failed to remove resource from index: {}", e);
    }

    success(())
}

/// GET /api/resources/search - Full-text search over the knowledge base.
pub async fn search_resources(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchQuery>,
) -> ApiResult<SearchResponse> {
    // Limit the maximum number of results
    let limit = params.limit.min(MAX_SEARCH_LIMIT);

    let hits = state.search.search(&params.q, limit, params.offset)?;

    // Fetch full resource data for each result
    let mut results = Vec::new();
    for hit in hits {
        if let Ok(Some(resource)) = state.repo.get_resource(&hit.resource_id).await {
            results.push(SearchResultItem {
                resource,
                score: hit.score,
            });
        }
    }

    let total = results.len();

    success(SearchResponse {
        results,
        total,
        limit,
        offset: params.offset,
    })
}
