// =============================================================================
// REST API Endpoints
// =============================================================================
//
// Transport shell for the four engine operations:
//
//   POST /predict          one snapshot in, one decision report out
//   GET  /health           liveness + engine counters + weight table
//   POST /update_accuracy  outcome feedback for a past prediction
//   GET  /get_stats        accuracy counters, recent history, weight table
//
// There is no authentication or rate limiting; CORS is permissive. A
// malformed /predict body yields the engine's fault report (HOLD at zero
// confidence with the error message) on a 200, never a transport error.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::app_state::AppState;
use crate::engine::{DecisionReport, EngineHealth};
use crate::types::{decode_predict_payload, Outcome};

// =============================================================================
// Router construction
// =============================================================================

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/update_accuracy", post(update_accuracy))
        .route("/get_stats", get(get_stats))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Predict
// =============================================================================

async fn predict(
    State(state): State<Arc<AppState>>,
    body: Option<Json<Value>>,
) -> Json<DecisionReport> {
    let Some(Json(payload)) = body else {
        return Json(DecisionReport::fault("no data provided"));
    };

    match decode_predict_payload(&payload) {
        Ok((snapshot, writers)) => Json(state.engine.decide(&snapshot, writers.as_ref())),
        Err(e) => {
            warn!(error = %e, "rejecting malformed predict payload");
            Json(DecisionReport::fault(e.to_string()))
        }
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    #[serde(flatten)]
    engine: EngineHealth,
    uptime_secs: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        engine: state.engine.health_snapshot(),
        uptime_secs: state.uptime_secs(),
    })
}

// =============================================================================
// Feedback
// =============================================================================

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    #[serde(default)]
    predicted_signal: Option<String>,
    /// Anything other than "correct" counts against accuracy, including a
    /// missing field.
    #[serde(default)]
    actual_outcome: Outcome,
}

async fn update_accuracy(
    State(state): State<Arc<AppState>>,
    body: Option<Json<FeedbackRequest>>,
) -> Json<Value> {
    let Some(Json(request)) = body else {
        return Json(json!({"error": "invalid feedback payload"}));
    };

    state
        .engine
        .feedback(request.predicted_signal.as_deref(), request.actual_outcome);

    Json(json!({"message": "Accuracy updated successfully"}))
}

// =============================================================================
// Stats
// =============================================================================

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<crate::engine::EngineStats> {
    Json(state.engine.stats())
}
