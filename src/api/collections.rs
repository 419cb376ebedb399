//! Collection CRUD endpoints shared by alerts, resources, incidents, teams
//! and evacuation plans.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use super::{confirmation, created, ApiResult, Confirmation};
use crate::errors::AppError;
use crate::models::{stamp, utc_timestamp, Collection, Document, ID_FIELD};
use crate::AppState;

/// Build the list/get/create/update/delete routes for one collection.
pub fn collection_routes(collection: Collection) -> Router<AppState> {
    let base = format!("/{}", collection.segment());
    let item = format!("/{}/{{id}}", collection.segment());

    Router::new()
        .route(
            &base,
            get(move |state: State<AppState>| list_documents(state, collection)).post(
                move |state: State<AppState>, body: Result<Json<Document>, JsonRejection>| {
                    create_document(state, collection, body)
                },
            ),
        )
        .route(
            &item,
            get(move |state: State<AppState>, id: Path<String>| {
                get_document(state, id, collection)
            })
            .put(
                move |state: State<AppState>,
                      id: Path<String>,
                      body: Result<Json<Document>, JsonRejection>| {
                    update_document(state, id, collection, body)
                },
            )
            .delete(move |state: State<AppState>, id: Path<String>| {
                delete_document(state, id, collection)
            }),
        )
}

/// GET /api/{collection} - List all documents.
pub async fn list_documents(
    State(state): State<AppState>,
    collection: Collection,
) -> ApiResult<Json<Vec<Document>>> {
    let documents = state.repo.list(collection).await?;
    Ok(Json(documents))
}

/// GET /api/{collection}/{id} - Get a single document.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    collection: Collection,
) -> ApiResult<Json<Document>> {
    state
        .repo
        .get(collection, &id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(collection))
}

/// POST /api/{collection} - Create a document.
///
/// Responds with the submitted fields plus the server-stamped ones and the new
/// `id`; the stored record is not re-read.
pub async fn create_document(
    State(state): State<AppState>,
    collection: Collection,
    body: Result<Json<Document>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let Json(mut doc) = body?;
    doc.remove(ID_FIELD);

    let unknown = collection.unknown_fields(&doc);
    if !unknown.is_empty() {
        tracing::debug!(collection = collection.name(), ?unknown, "Storing undocumented fields");
    }

    stamp(&mut doc, collection.create_stamps(), &utc_timestamp());

    let id = state.repo.insert(collection, &doc).await?;
    tracing::info!(collection = collection.name(), %id, "Created document");

    doc.insert(ID_FIELD.to_string(), id.into());
    Ok(created(doc))
}

/// PUT /api/{collection}/{id} - Merge fields into a document.
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    collection: Collection,
    body: Result<Json<Document>, JsonRejection>,
) -> ApiResult<Json<Confirmation>> {
    let Json(mut doc) = body?;
    stamp(&mut doc, collection.update_stamps(), &utc_timestamp());

    if !state.repo.update(collection, &id, &doc).await? {
        return Err(not_found(collection));
    }

    Ok(confirmation(format!("{} updated successfully", collection.label())))
}

/// DELETE /api/{collection}/{id} - Delete a document.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    collection: Collection,
) -> ApiResult<Json<Confirmation>> {
    if !state.repo.delete(collection, &id).await? {
        return Err(not_found(collection));
    }

    tracing::info!(collection = collection.name(), %id, "Deleted document");
    Ok(confirmation(format!("{} deleted successfully", collection.label())))
}

pub(crate) fn not_found(collection: Collection) -> AppError {
    AppError::NotFound(format!("{} not found", collection.label()))
}
