//! Axum handlers.
//!
//! Each handler receives [`AppState`] via [`axum::extract::State`] and maps
//! engine/adapter results to JSON.  Bodies are taken as raw JSON values and
//! checked by [`super::validate`].

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::classifier::Condition;

use super::AppState;
use super::error::ApiError;
use super::validate;

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(super) struct PredictResponse {
    condition: Condition,
    #[serde(skip_serializing_if = "Option::is_none")]
    probabilities: Option<BTreeMap<Condition, f64>>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecommendResponse {
    recommendations: Vec<String>,
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /predict
pub(super) async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let record = json_body(body)
        .and_then(|v| validate::feature_record(&v))
        .inspect_err(|e| warn!("predict request rejected: {e}"))?;

    let classifier = state.classifier.clone();
    let task = tokio::task::spawn_blocking(move || classifier.predict(&record));

    let prediction = match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(Ok(p))) => p,
        Ok(Ok(Err(e))) => {
            warn!(backend = %state.classifier.backend_type(), "classifier failed: {e}");
            return Err(ApiError::Adapter(e));
        }
        Ok(Err(join_err)) => {
            warn!("classifier task aborted: {join_err}");
            return Err(ApiError::Internal(format!("classifier task aborted: {join_err}")));
        }
        Err(_) => {
            warn!("classifier timed out");
            return Err(ApiError::Timeout);
        }
    };

    debug!(condition = %prediction.condition, "prediction produced");

    let probabilities = if state.include_probabilities {
        prediction.probabilities
    } else {
        None
    };
    Ok(Json(PredictResponse { condition: prediction.condition, probabilities }))
}

/// POST /recommend
pub(super) async fn recommend(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let req = json_body(body)
        .and_then(|v| validate::recommend_request(&v, &state.recommend))
        .inspect_err(|e| warn!("recommend request rejected: {e}"))?;

    let result = state.recommender.recommend(req.tokens.as_slice(), req.top_k);

    Ok(Json(RecommendResponse { recommendations: result.into_labels() }))
}

/// GET /ping — liveness probe.
pub(super) async fn ping(State(state): State<AppState>) -> Json<Value> {
    debug!("ping received");
    let info = &state.info;
    Json(json!({
        "status": "connected",
        "message": { "message": "service is active" },
        "service": info.service_name,
        "graph": {
            "nodes": info.graph_nodes,
            "edges": info.graph_edges,
            "fingerprint": info.graph_fingerprint,
        },
        "model": {
            "backend": state.classifier.backend_type(),
            "fingerprint": info.model_fingerprint,
        },
    }))
}
