//! HTTP route definitions

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::room::{RoomCode, RoomSummary};
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/rooms/:code", get(room_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.client_origins))
        .with_state(state)
}

/// Restrict to the configured origins, or allow any when none are set
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(allowed)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_rooms: usize,
    connections: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_rooms: state.rooms.registry().len(),
        connections: state.rooms.connection_count(),
    })
}

async fn room_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSummary>, AppError> {
    let code = RoomCode::parse(&code).map_err(AppError::BadRequest)?;
    let room = state
        .rooms
        .registry()
        .find_room(&code)
        .map_err(|_| AppError::NotFound(format!("room {code}")))?;

    let summary = room.lock().summary();
    Ok(Json(summary))
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::util::ids::ConnectionId;

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let state = AppState::new(Config::default());
        state.rooms.registry().create_room();

        let (status, body) = get_json(build_router(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_rooms"], 1);
        assert_eq!(body["connections"], 0);
    }

    #[tokio::test]
    async fn room_lookup_is_case_insensitive() {
        let state = AppState::new(Config::default());
        let (code, _) = state
            .rooms
            .registry()
            .create_hosted_room(ConnectionId::new())
            .unwrap();

        let uri = format!("/rooms/{}", code.as_str().to_ascii_lowercase());
        let (status, body) = get_json(build_router(state), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], code.as_str());
        assert_eq!(body["state"], "waiting");
        assert_eq!(body["players"], 1);
    }

    #[tokio::test]
    async fn missing_room_is_json_404() {
        let state = AppState::new(Config::default());
        let (status, body) = get_json(build_router(state), "/rooms/AAAAAA").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("AAAAAA"));
    }

    #[tokio::test]
    async fn malformed_code_is_bad_request() {
        let state = AppState::new(Config::default());
        let (status, body) = get_json(build_router(state), "/rooms/nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
