//! `seoscan` crate (library surface).
//!
//! The primary entrypoint for end users is the `seoscan` binary. The HTTP
//! router lives here so tests and embedders can mount it with their own
//! fetcher and model.

pub use seoscan_core as core;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use seoscan_core::analyze::{validate, MSG_MISSING_FIELDS};
use seoscan_core::{AnalysisRequest, Analyzer};
use std::sync::Arc;

pub const ANALYZE_PATH: &str = "/api/seoanalysis/analyze";

#[derive(Clone, Debug)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(ANALYZE_PATH, post(analyze_handler))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Blank `url`/`keyword` is a 400 with a plain-text body; everything after
/// validation is a 200, even when the analysis itself degraded.
async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Response {
    if validate(&request.url, &request.keyword).is_err() {
        return (StatusCode::BAD_REQUEST, MSG_MISSING_FIELDS).into_response();
    }
    let result = state
        .analyzer
        .analyze(&request.url, &request.keyword)
        .await;
    Json(result).into_response()
}
