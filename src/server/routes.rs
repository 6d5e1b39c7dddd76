//! HTTP routes
//!
//! JSON API over [`CameraService`] plus static serving of HLS output.

use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path as UrlPath, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::camera::CameraSummary;
use crate::error::{Error, Result};
use crate::onvif::Velocity;
use crate::service::{CameraService, PlaybackQuery, PlaybackRequest, StreamView};
use crate::supervisor::SessionInfo;

/// PTZ move request body
#[derive(Debug, Clone, Deserialize)]
pub struct PtzRequest {
    #[serde(flatten)]
    pub velocity: Velocity,
    /// Move duration in seconds, fractions allowed
    pub timeout: Option<f64>,
}

/// PTZ move result
#[derive(Debug, Clone, Serialize)]
pub struct PtzResponse {
    pub success: bool,
    pub message: String,
}

/// Build the gateway router
///
/// `public_prefix` is where `stream_root` is served; an empty prefix serves
/// it as the fallback.
pub fn router(service: Arc<CameraService>, stream_root: &Path, public_prefix: &str) -> Router {
    let api = Router::new()
        .route("/api/cameras", get(list_cameras))
        .route("/api/cameras/:address", get(live_view))
        .route("/api/cameras/:address/ptz", post(ptz_move))
        .route("/api/cameras/:address/playback", get(playback))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:key", delete(stop_session))
        .route("/healthz", get(health))
        .with_state(service);

    let static_files = ServeDir::new(stream_root);
    let app = if public_prefix.is_empty() {
        api.fallback_service(static_files)
    } else {
        api.nest_service(public_prefix, static_files)
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(cors).layer(TraceLayer::new_for_http())
}

async fn list_cameras(State(service): State<Arc<CameraService>>) -> Json<Vec<CameraSummary>> {
    Json(service.cameras())
}

async fn live_view(
    State(service): State<Arc<CameraService>>,
    UrlPath(address): UrlPath<String>,
) -> Result<Json<StreamView>> {
    let view = service.live_view(&address).await?;
    Ok(Json(view))
}

async fn ptz_move(
    State(service): State<Arc<CameraService>>,
    UrlPath(address): UrlPath<String>,
    payload: std::result::Result<Json<PtzRequest>, JsonRejection>,
) -> Result<Json<PtzResponse>> {
    let Json(request) = payload.map_err(|e| Error::InvalidRequest(e.body_text()))?;

    service
        .move_camera(&address, request.velocity, request.timeout)
        .await?;

    Ok(Json(PtzResponse {
        success: true,
        message: "PTZ command sent".into(),
    }))
}

async fn playback(
    State(service): State<Arc<CameraService>>,
    UrlPath(address): UrlPath<String>,
    Query(query): Query<PlaybackQuery>,
) -> Result<Json<StreamView>> {
    // Parameters are checked before the camera is looked up
    let request = PlaybackRequest::parse(&query)?;
    let view = service.playback(&address, &request).await?;
    Ok(Json(view))
}

async fn list_sessions(State(service): State<Arc<CameraService>>) -> Json<Vec<SessionInfo>> {
    Json(service.sessions().await)
}

async fn stop_session(
    State(service): State<Arc<CameraService>>,
    UrlPath(key): UrlPath<String>,
) -> Result<Json<Value>> {
    service.stop_session(&key).await?;
    Ok(Json(json!({ "success": true, "key": key })))
}

async fn health(State(service): State<Arc<CameraService>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cameras": service.cameras().len(),
        "sessions": service.supervisor().session_count().await,
    }))
}
