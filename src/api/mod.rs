//! REST API module.
//!
//! Contains all API routes and handlers following the dashboard contract.

mod analytics;
mod collections;
mod messages;
mod users;
mod weather;

pub use analytics::*;
pub use collections::*;
pub use messages::*;
pub use users::*;
pub use weather::*;

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Handler result: a JSON success body or an [`AppError`].
pub type ApiResult<T> = Result<T, AppError>;

/// Response for writes that do not return the affected record.
#[derive(Debug, Serialize, Deserialize)]
pub struct Confirmation {
    pub message: String,
}

/// Create a `{ "message": ... }` confirmation response.
pub fn confirmation(message: impl Into<String>) -> Json<Confirmation> {
    Json(Confirmation {
        message: message.into(),
    })
}

/// Wrap a freshly created record in a 201 response.
pub fn created<T: Serialize>(body: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(body))
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub message: String,
}

/// GET /api/health - Liveness check.
pub async fn health_check() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}
