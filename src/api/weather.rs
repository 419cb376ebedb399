//! Weather API endpoints.
//!
//! Reads come from the external provider; writes go to the local store. The
//! two paths never touch each other's data.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::{confirmation, ApiResult, Confirmation};
use crate::errors::AppError;
use crate::models::{Collection, Document, WeatherReport};
use crate::AppState;

/// GET /api/weather/{location} - Live conditions and 3-day outlook.
pub async fn get_weather(
    State(state): State<AppState>,
    Path(location): Path<String>,
) -> ApiResult<Json<WeatherReport>> {
    let report = state.weather.report(&location).await?;
    Ok(Json(report))
}

/// POST /api/weather - Upsert a weather record keyed by `location`.
///
/// A body without a string `location` is rejected with 400 rather than
/// stored under a null key.
pub async fn update_weather(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> ApiResult<Json<Confirmation>> {
    let Json(doc) = body?;

    let location = doc
        .get("location")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("location is required".to_string()))?;

    let inserted = state
        .repo
        .upsert_by(Collection::Weather, "location", &location, &doc)
        .await?;
    tracing::info!(%location, inserted, "Stored weather record");

    Ok(confirmation("Weather data updated successfully"))
}
