//! Ticket API endpoints.

use axum::extract::{Path, State};
use chrono::Utc;

use super::{success, ApiResult, AppJson, AppQuery};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{
    CreateTicketRequest, StatsQuery, Ticket, TicketFilter, TicketStats, UpdateTicketRequest,
};
use crate::AppState;

/// GET /api/tickets - List tickets.
pub async fn list_tickets(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<TicketFilter>,
) -> ApiResult<Vec<Ticket>> {
    success(state.repo.list_tickets(&filter).await?)
}

/// GET /api/tickets/{id} - Get a single ticket.
pub async fn get_ticket(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Ticket> {
    match state.repo.get_ticket(&id).await? {
        Some(ticket) => success(ticket),
        None => Err(AppError::NotFound(format!("Ticket {} not found", id))),
    }
}

/// POST /api/tickets - Open a ticket.
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(request): AppJson<CreateTicketRequest>,
) -> ApiResult<Ticket> {
    let ticket = state.repo.create_ticket(&request, &user.id).await?;
    tracing::info!(ticket_id = %ticket.id, priority = ticket.priority.as_str(), "Ticket created");
    success(ticket)
}

/// PUT /api/tickets/{id} - Update a ticket.
pub async fn update_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateTicketRequest>,
) -> ApiResult<Ticket> {
    success(state.repo.update_ticket(&id, &request).await?)
}

/// DELETE /api/tickets/{id} - Delete a ticket.
pub async fn delete_ticket(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.delete_ticket(&id).await?;
    success(())
}

/// GET /api/tickets/stats - Chart data for the last `days` days.
pub async fn ticket_stats(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<StatsQuery>,
) -> ApiResult<TicketStats> {
    let today = Utc::now().date_naive();
    success(state.repo.ticket_stats(query.days, today).await?)
}
