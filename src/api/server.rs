use crate::commute::{CommuteService, TransitFeed, WalkingMatrix};
use crate::preferences::{Pace, Preferences};
use crate::ranker::{self, RankerConfig};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct AppState<T, W> {
    pub service: CommuteService<T, W>,
    pub ranker: RankerConfig,
}

#[derive(Debug, Deserialize)]
pub struct CommuteRequest {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct DashboardRequest {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub pinned: BTreeSet<String>,
    #[serde(default)]
    pub pace: Pace,
}

pub fn router<T, W>(state: Arc<AppState<T, W>>) -> Router
where
    T: TransitFeed + 'static,
    W: WalkingMatrix + 'static,
{
    Router::new()
        .route("/api/commute", post(handle_commute::<T, W>))
        .route("/api/dashboard", post(handle_dashboard::<T, W>))
        .route("/health", get(health_check))
        .with_state(state)
}

pub async fn run_server<T, W>(state: Arc<AppState<T, W>>, port: u16) -> std::io::Result<()>
where
    T: TransitFeed + 'static,
    W: WalkingMatrix + 'static,
{
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}

fn invalid_request(rejection: JsonRejection) -> Response {
    warn!("Rejected request body: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid request" })),
    )
        .into_response()
}

async fn handle_commute<T, W>(
    State(state): State<Arc<AppState<T, W>>>,
    request: Result<Json<CommuteRequest>, JsonRejection>,
) -> Response
where
    T: TransitFeed,
    W: WalkingMatrix,
{
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return invalid_request(rejection),
    };
    info!(
        "Received commute request: lat={:.6}, lon={:.6}",
        request.lat, request.lon
    );

    match state.service.commute_options(request.lat, request.lon).await {
        Ok(options) => (StatusCode::OK, Json(json!({ "options": options }))).into_response(),
        Err(e) => {
            error!("{}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Same lookup as `/api/commute`, ranked with the preferences in the body.
async fn handle_dashboard<T, W>(
    State(state): State<Arc<AppState<T, W>>>,
    request: Result<Json<DashboardRequest>, JsonRejection>,
) -> Response
where
    T: TransitFeed,
    W: WalkingMatrix,
{
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return invalid_request(rejection),
    };

    match state.service.commute_options(request.lat, request.lon).await {
        Ok(options) => {
            let prefs = Preferences {
                pinned_routes: request.pinned,
                pace: request.pace,
            };
            let outcome = ranker::rank(&options, &prefs, Utc::now(), &state.ranker);
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => {
            error!("{}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "message": "OK" })))
}
