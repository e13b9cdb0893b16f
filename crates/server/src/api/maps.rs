//! Map generation API handlers.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use reliefmap_core::{
    Country, MapArtifacts, MapRequest, PipelineError, PipelineStatus, PublishedArtifacts, StageId,
    StageReport,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Response of a successful map run
#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub run_id: String,
    pub window: String,
    /// Boundary topology in the run workspace
    pub topo: PathBuf,
    /// River topology in the run workspace
    pub rivers: PathBuf,
    /// Relief image in the run workspace
    pub image: PathBuf,
    pub published: PublishedArtifacts,
    pub stages: Vec<StageReport>,
}

impl From<MapArtifacts> for MapResponse {
    fn from(artifacts: MapArtifacts) -> Self {
        Self {
            run_id: artifacts.run_id,
            window: artifacts.window,
            topo: artifacts.topo,
            rivers: artifacts.rivers,
            image: artifacts.image,
            published: artifacts.published,
            stages: artifacts.stages,
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct MapErrorResponse {
    pub error: String,
    /// Failing stage, when the run got that far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageId>,
}

impl MapErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            stage: None,
        }
    }
}

/// Query parameters for listing countries
#[derive(Debug, Default, Deserialize)]
pub struct CountryListParams {
    /// `continent` groups entries by continent display order, then name.
    /// Anything else keeps the catalog file order.
    #[serde(default)]
    pub order: Option<String>,
}

type ApiError = (StatusCode, Json<MapErrorResponse>);

fn pipeline_error(e: PipelineError) -> ApiError {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if matches!(e, PipelineError::Closed) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(MapErrorResponse {
            error: e.to_string(),
            stage: e.stage(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Run the pipeline for the selected countries and window
pub async fn generate_map(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MapRequest>, JsonRejection>,
) -> Result<Json<MapResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected map request body");
        (
            StatusCode::BAD_REQUEST,
            Json(MapErrorResponse::new(rejection.body_text())),
        )
    })?;

    info!(
        countries = request.countries.len(),
        continents = request.continents.len(),
        window = %request.window.slug(),
        "Map requested"
    );

    state
        .pipeline()
        .generate(&request)
        .await
        .map(|artifacts| Json(MapResponse::from(artifacts)))
        .map_err(pipeline_error)
}

/// List the country catalog
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountryListParams>,
) -> Json<Vec<Country>> {
    match params.order.as_deref() {
        Some("continent") => Json(state.catalog().sorted()),
        _ => Json(state.catalog().all().to_vec()),
    }
}

/// List the distinct continents, in display order
pub async fn list_continents(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.catalog().continents())
}

/// Serve the boundary topology of the last successful run
pub async fn latest_topology(State(state): State<Arc<AppState>>) -> Response {
    let Some(latest) = state.pipeline().latest().await else {
        return (
            StatusCode::NOT_FOUND,
            Json(MapErrorResponse::new("No map has been generated yet")),
        )
            .into_response();
    };

    match tokio::fs::read(&latest.published.topo).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => (
            StatusCode::NOT_FOUND,
            Json(MapErrorResponse::new(format!(
                "Topology not found: {}",
                latest.published.topo.display()
            ))),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MapErrorResponse::new(e.to_string())),
        )
            .into_response(),
    }
}

/// Pipeline activity
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<PipelineStatus> {
    Json(state.pipeline().status().await)
}
