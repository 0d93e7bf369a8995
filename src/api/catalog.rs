//! Config lookup-table endpoints (`/api/config/{kind}`).

use axum::extract::{Path, State};

use super::{success, ApiResult, AppJson};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{
    CatalogEntry, CatalogKind, CreateCatalogEntryRequest, UpdateCatalogEntryRequest,
};
use crate::AppState;

fn parse_kind(slug: &str) -> Result<CatalogKind, AppError> {
    CatalogKind::parse(slug)
        .ok_or_else(|| AppError::NotFound(format!("Unknown configuration table {}", slug)))
}

/// Resource type names are indexed, so renaming or deleting a type needs a rebuild.
async fn refresh_search(state: &AppState, kind: CatalogKind) {
    if kind != CatalogKind::TiposRecurso {
        return;
    }
    if let Err(e) = state.search.rebuild_from(&state.repo).await {
        tracing::warn!("Failed to rebuild search index: {}", e);
    }
}

/// GET /api/config/{kind} - List entries of a lookup table.
pub async fn list_catalog_entries(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Vec<CatalogEntry>> {
    let kind = parse_kind(&kind)?;
    success(state.repo.list_catalog(kind).await?)
}

/// POST /api/config/{kind} - Add an entry (admin).
pub async fn create_catalog_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(kind): Path<String>,
    AppJson(request): AppJson<CreateCatalogEntryRequest>,
) -> ApiResult<CatalogEntry> {
    let kind = parse_kind(&kind)?;
    user.require_admin()?;

    let entry = state.repo.create_catalog_entry(kind, &request).await?;
    refresh_search(&state, kind).await;
    success(entry)
}

/// PUT /api/config/{kind}/{id} - Update an entry (admin).
pub async fn update_catalog_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, id)): Path<(String, String)>,
    AppJson(request): AppJson<UpdateCatalogEntryRequest>,
) -> ApiResult<CatalogEntry> {
    let kind = parse_kind(&kind)?;
    user.require_admin()?;

    let entry = state.repo.update_catalog_entry(kind, &id, &request).await?;
    refresh_search(&state, kind).await;
    success(entry)
}

/// DELETE /api/config/{kind}/{id} - Remove an entry (admin).
///
/// Rows referencing it keep existing with the reference cleared.
pub async fn delete_catalog_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let kind = parse_kind(&kind)?;
    user.require_admin()?;

    state.repo.delete_catalog_entry(kind, &id).await?;
    tracing::info!(kind = kind.slug(), id = %id, by = %user.id, "Catalog entry deleted");
    refresh_search(&state, kind).await;
    success(())
}
