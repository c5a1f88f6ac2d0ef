// HTTP surface (feature "server")
//
//   GET  /matchup            new matchup                      200 / 404 / 500
//   POST /matchup            vote {verificationCode, winner}  201 / 400 / 403 / 404 / 406 / 422 / 500
//   GET  /rankings           leaderboard                      200 / 404 / 500
//   GET  /rankings/:company  one company with its rank        200 / 404 / 500
//   GET  /health
//
// Every response goes through a permissive CORS layer. Error bodies carry the
// canonical status text only; store failures are logged here and never echoed.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::entities::{Company, Matchup};
use crate::error::PrestigeError;
use crate::generator::MatchupGenerator;
use crate::store::Store;
use crate::{ranking, vote};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
    generator: Arc<Mutex<MatchupGenerator>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, generator: MatchupGenerator) -> Self {
        Self {
            store,
            generator: Arc::new(Mutex::new(generator)),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode) -> Self {
        Self { status }
    }

    fn internal(detail: &str) -> Self {
        tracing::error!(error = %detail, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<PrestigeError> for ApiError {
    fn from(err: PrestigeError) -> Self {
        match err {
            PrestigeError::Validation(reason) => {
                tracing::debug!(%reason, "rejected request");
                Self::new(StatusCode::BAD_REQUEST)
            }
            PrestigeError::NotFound(what) => {
                tracing::debug!(%what, "not found");
                Self::new(StatusCode::NOT_FOUND)
            }
            PrestigeError::Unauthorized => Self::new(StatusCode::FORBIDDEN),
            PrestigeError::Store(e) => Self::internal(&e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.status.canonical_reason().unwrap_or("Error"),
        };
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
struct VoteRequest {
    #[serde(rename = "verificationCode")]
    verification_code: String,
    /// Absent or null decodes as no selection, which is rejected as invalid
    #[serde(default)]
    winner: Option<i64>,
}

/// `application/json`, parameters such as charset allowed
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// GET /matchup
async fn create_matchup(State(state): State<AppState>) -> Result<Json<Matchup>, ApiError> {
    let mut generator = state
        .generator
        .lock()
        .map_err(|_| ApiError::internal("matchup generator lock poisoned"))?;
    let matchup = generator.create(state.store.as_ref())?;
    Ok(Json(matchup))
}

/// POST /matchup
async fn cast_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    if !is_json(&headers) {
        return Err(ApiError::new(StatusCode::NOT_ACCEPTABLE));
    }

    let request: VoteRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "undecodable vote body");
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY)
    })?;

    vote::record_vote(
        state.store.as_ref(),
        &request.verification_code,
        request.winner.unwrap_or(0),
    )?;
    Ok(StatusCode::CREATED)
}

/// GET /rankings
async fn list_rankings(State(state): State<AppState>) -> Result<Json<Vec<Company>>, ApiError> {
    let ranked = ranking::list_ranked(state.store.as_ref())?;
    Ok(Json(ranked))
}

/// GET /rankings/:company
async fn company_standing(
    State(state): State<AppState>,
    Path(company): Path<String>,
) -> Result<Json<Company>, ApiError> {
    let company = ranking::company_standing(state.store.as_ref(), &company)?;
    Ok(Json(company))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/matchup", get(create_matchup).post(cast_vote))
        .route("/rankings", get(list_rankings))
        .route("/rankings/:company", get(company_standing))
        .with_state(state);

    api_routes.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}
