//! Analysis cache endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use tracing::debug;

use super::state::AppState;
use super::types::{
    ApiError, CacheKeyRequest, CacheKeyResponse, InsertAnalysisRequest, InsertAnalysisResponse,
    Json,
};
use crate::domain::{AnalysisCacheKey, AnalysisKind};

pub fn create_analysis_router() -> Router<AppState> {
    Router::new()
        .route("/cache-key", post(build_cache_key))
        .route("/{kind}", post(insert_analysis))
        .route("/{kind}/{cache_key}", get(get_analysis))
}

/// GET /api/analysis/{kind}/{cache_key}
pub async fn get_analysis(
    State(state): State<AppState>,
    Path((kind, cache_key)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let kind: AnalysisKind = kind.parse()?;

    state
        .analysis_service
        .get_json(kind, &cache_key)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(format!("No {} analysis for cache key '{}'", kind, cache_key))
        })
}

/// POST /api/analysis/{kind}
///
/// Accepted whether or not a row with the same cache key already existed.
pub async fn insert_analysis(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<InsertAnalysisRequest>,
) -> Result<(StatusCode, Json<InsertAnalysisResponse>), ApiError> {
    let kind: AnalysisKind = kind.parse()?;
    let analysis = request.into_new_analysis()?;
    let cache_key = analysis.cache_key.clone();

    state.analysis_service.insert_json(kind, analysis).await?;
    debug!(kind = %kind, cache_key = %cache_key, "Analysis insert accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(InsertAnalysisResponse::accepted(kind, cache_key)),
    ))
}

/// POST /api/analysis/cache-key
pub async fn build_cache_key(
    Json(request): Json<CacheKeyRequest>,
) -> Result<Json<CacheKeyResponse>, ApiError> {
    let key = AnalysisCacheKey::new(request.kind, &request.ticker, &request.fiscal_years)?;
    Ok(Json(key.into()))
}
