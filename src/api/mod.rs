//! HTTP API handlers
//!
//! Action routes mirror the Home Assistant service-call layout
//! (`/services/<domain>/<service>`) and answer `{"success": bool}`.
//! Schema violations are rejected with 400 before any action runs.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

#[cfg(feature = "mqtt")]
use crate::adapters::mqtt::MqttAdapter;
use crate::adapters::traits::MediaItem;
use crate::bus::SharedBus;
use crate::frontend;
use crate::integration::{Integration, SpeakerInfo};
use crate::services::{ControlSpeakerRequest, PlaySpotifyRequest};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub integration: Arc<Integration>,
    pub bus: SharedBus,
    #[cfg(feature = "mqtt")]
    pub mqtt: Option<Arc<MqttAdapter>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(integration: Arc<Integration>, bus: SharedBus) -> Self {
        Self {
            integration,
            bus,
            #[cfg(feature = "mqtt")]
            mqtt: None,
            started_at: Instant::now(),
        }
    }

    #[cfg(feature = "mqtt")]
    pub fn with_mqtt(mut self, mqtt: Arc<MqttAdapter>) -> Self {
        self.mqtt = Some(mqtt);
        self
    }
}

/// Build the full route table
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/status", get(status_handler))
        // Actions
        .route(
            "/services/ma_spotify_lovelace/play_spotify",
            post(play_spotify_handler),
        )
        .route(
            "/services/ma_spotify_lovelace/control_speaker",
            post(control_speaker_handler),
        )
        // Card data
        .route("/ma_spotify_lovelace/speakers", get(speakers_handler))
        .route("/ma_spotify_lovelace/search", post(search_handler))
        // Dashboard
        .route("/panel", get(panel_handler))
        .route(
            "/static/community/ma_spotify_lovelace/{*path}",
            get(static_asset_handler),
        )
        // Event stream (SSE)
        .route("/events", get(events_handler))
        .with_state(state)
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

/// Action response
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
}

/// General status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub git_sha: &'static str,
    pub uptime_secs: u64,
    pub integration_ready: bool,
    pub provider: String,
    pub mqtt_connected: bool,
    pub bus_subscribers: usize,
}

/// GET /status - Service health check
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    #[cfg(feature = "mqtt")]
    let mqtt_connected = match state.mqtt {
        Some(ref mqtt) => mqtt.get_status().await.connected,
        None => false,
    };
    #[cfg(not(feature = "mqtt"))]
    let mqtt_connected = false;

    Json(StatusResponse {
        service: "ma-spotify-lovelace",
        version: env!("MASL_VERSION"),
        git_sha: env!("MASL_GIT_SHA"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        integration_ready: state.integration.is_ready().await,
        provider: state.integration.provider().to_string(),
        mqtt_connected,
        bus_subscribers: state.bus.subscriber_count(),
    })
}

// =============================================================================
// Action handlers
// =============================================================================

/// POST /services/ma_spotify_lovelace/play_spotify
pub async fn play_spotify_handler(
    State(state): State<AppState>,
    body: Result<Json<PlaySpotifyRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let success = state.integration.search_and_play(&req).await;
    Json(ActionResponse { success }).into_response()
}

/// POST /services/ma_spotify_lovelace/control_speaker
pub async fn control_speaker_handler(
    State(state): State<AppState>,
    body: Result<Json<ControlSpeakerRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    if let Err(e) = req.validate() {
        return bad_request(e);
    }

    let success = state.integration.control_speaker(&req).await;
    Json(ActionResponse { success }).into_response()
}

// =============================================================================
// Card data handlers
// =============================================================================

#[derive(Serialize)]
pub struct SpeakersResponse {
    pub speakers: Vec<SpeakerInfo>,
}

/// GET /ma_spotify_lovelace/speakers - Speakers for the card's selector
pub async fn speakers_handler(State(state): State<AppState>) -> Json<SpeakersResponse> {
    Json(SpeakersResponse {
        speakers: state.integration.get_speakers().await,
    })
}

/// Search request body
#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_search_type")]
    pub content_type: String,
}

fn default_search_type() -> String {
    "track".to_string()
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<MediaItem>,
}

/// POST /ma_spotify_lovelace/search - Result list for the card
pub async fn search_handler(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let results = state
        .integration
        .search(&req.query, &req.content_type)
        .await;
    Json(SearchResponse { results }).into_response()
}

// =============================================================================
// Dashboard handlers
// =============================================================================

/// GET /panel - Sidebar panel registration
pub async fn panel_handler() -> Json<frontend::PanelRegistration> {
    Json(frontend::panel_registration())
}

/// GET /static/community/ma_spotify_lovelace/{*path} - Embedded card assets
pub async fn static_asset_handler(Path(path): Path<String>) -> Response {
    match frontend::get_asset(&path) {
        Some(asset) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, asset.mime),
                (header::CACHE_CONTROL, "no-cache".to_string()),
            ],
            asset.body,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Asset not found: {}", path),
            }),
        )
            .into_response(),
    }
}

/// GET /events - Server-Sent Events stream of bus events
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.bus.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().data(json))),
                Err(_) => None,
            },
            Err(_) => None, // Skip lagged messages
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
