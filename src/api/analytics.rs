//! Analytics API endpoint.

use axum::{extract::State, Json};

use super::ApiResult;
use crate::models::{AnalyticsSummary, Collection};
use crate::AppState;

/// GET /api/analytics - Incident counts plus fixed dashboard figures.
pub async fn get_analytics(State(state): State<AppState>) -> ApiResult<Json<AnalyticsSummary>> {
    let total = state.repo.count(Collection::Incidents).await?;
    let resolved = state
        .repo
        .count_where(Collection::Incidents, "status", "resolved")
        .await?;

    Ok(Json(AnalyticsSummary::from_counts(total, resolved)))
}
