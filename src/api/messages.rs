//! Message API endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use super::{create_document, ApiResult};
use crate::models::{Collection, Document};
use crate::AppState;

/// GET /api/messages - List all messages, newest first.
pub async fn list_messages(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let messages = state
        .repo
        .list_newest_first(Collection::Messages, "timestamp")
        .await?;
    Ok(Json(messages))
}

/// POST /api/messages - Send a message, stamped with the server time.
pub async fn create_message(
    state: State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    create_document(state, Collection::Messages, body).await
}
