//! REST API module.
//!
//! Contains all API routes and handlers following the dashboard's contract.

mod assistant;
mod auth;
mod catalog;
mod events;
mod extract;
mod notes;
mod resources;
mod tickets;
mod users;

pub use assistant::*;
pub use auth::*;
pub use catalog::*;
pub use events::*;
pub use extract::{AppJson, AppQuery};
pub use notes::*;
pub use resources::*;
pub use tickets::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}
