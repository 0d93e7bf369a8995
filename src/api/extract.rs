//! Request extractors that report rejections through the error envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::errors::AppError;

/// JSON body extractor; malformed bodies become `VALIDATION_ERROR`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string extractor; malformed parameters become `VALIDATION_ERROR`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
