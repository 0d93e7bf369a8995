//! Event API endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult, AppJson, AppQuery};
use crate::auth::AuthUser;
use crate::calendar::{self, CalendarDay, CalendarQuery};
use crate::errors::AppError;
use crate::models::{CreateEventRequest, Event, EventRange, UpdateEventRequest};
use crate::AppState;

/// GET /api/events - List events, optionally within `from`/`to`.
pub async fn list_events(
    State(state): State<AppState>,
    AppQuery(range): AppQuery<EventRange>,
) -> ApiResult<Vec<Event>> {
    success(state.repo.list_events(&range).await?)
}

/// GET /api/events/{id} - Get a single event.
pub async fn get_event(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Event> {
    match state.repo.get_event(&id).await? {
        Some(event) => success(event),
        None => Err(AppError::NotFound(format!("Event {} not found", id))),
    }
}

/// POST /api/events - Create an event.
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreateEventRequest>,
) -> ApiResult<Event> {
    success(state.repo.create_event(&request, &user.id).await?)
}

/// PUT /api/events/{id} - Update an event.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateEventRequest>,
) -> ApiResult<Event> {
    success(state.repo.update_event(&id, &request).await?)
}

/// DELETE /api/events/{id} - Delete an event.
pub async fn delete_event(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.delete_event(&id).await?;
    success(())
}

/// GET /api/events/calendar - Occurrences grouped by day for `from..=to`.
pub async fn event_calendar(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CalendarQuery>,
) -> ApiResult<Vec<CalendarDay>> {
    query.validate()?;
    let (from, to) = query.bounds();
    let events = state.repo.events_overlapping(from, to).await?;
    success(calendar::day_contents(&events, query.from, query.to))
}
