//! Note API endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult, AppJson, AppQuery};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{CreateNoteRequest, Note, NoteFilter, UpdateNoteRequest};
use crate::AppState;

/// Only the author or an administrator may change a note.
async fn load_for_write(state: &AppState, user: &AuthUser, id: &str) -> Result<Note, AppError> {
    let note = state
        .repo
        .get_note(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Note {} not found", id)))?;

    if note.author_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only the author or an administrator can modify this note".to_string(),
        ));
    }
    Ok(note)
}

/// GET /api/notes - List notes.
pub async fn list_notes(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<NoteFilter>,
) -> ApiResult<Vec<Note>> {
    success(state.repo.list_notes(&filter).await?)
}

/// GET /api/notes/{id} - Get a single note.
pub async fn get_note(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Note> {
    match state.repo.get_note(&id).await? {
        Some(note) => success(note),
        None => Err(AppError::NotFound(format!("Note {} not found", id))),
    }
}

/// POST /api/notes - Create a note authored by the caller.
pub async fn create_note(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreateNoteRequest>,
) -> ApiResult<Note> {
    success(state.repo.create_note(&request, &user.id).await?)
}

/// PUT /api/notes/{id} - Update a note.
pub async fn update_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateNoteRequest>,
) -> ApiResult<Note> {
    load_for_write(&state, &user, &id).await?;
    success(state.repo.update_note(&id, &request).await?)
}

/// DELETE /api/notes/{id} - Delete a note.
pub async fn delete_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    load_for_write(&state, &user, &id).await?;
    state.repo.delete_note(&id).await?;
    success(())
}
