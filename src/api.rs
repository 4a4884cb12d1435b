use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::pipeline::Evaluator;
use crate::result::{EvaluationRequest, EvaluationResult};

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<Evaluator>,
}

impl AppState {
    pub fn new(evaluator: Arc<Evaluator>) -> Self {
        Self { evaluator }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/evaluate", get(evaluate_query).post(evaluate))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluationRequest>,
) -> Json<EvaluationResult> {
    Json(state.evaluator.evaluate(&req).await)
}

// GET /evaluate?url=...&query=...
async fn evaluate_query(
    State(state): State<AppState>,
    Query(req): Query<EvaluationRequest>,
) -> Json<EvaluationResult> {
    Json(state.evaluator.evaluate(&req).await)
}
