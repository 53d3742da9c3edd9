// Axum API Server Module
//
// Purpose: REST surface over the recommendation orchestrator (crop advice, symptom
// diagnosis, photo diagnosis) plus read-only catalog endpoints.

#[cfg(feature = "api")]
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

#[cfg(feature = "api")]
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};

#[cfg(feature = "api")]
use std::sync::Arc;

#[cfg(feature = "api")]
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};

#[cfg(feature = "api")]
use serde::Deserialize;

#[cfg(feature = "api")]
use tokio_util::sync::CancellationToken;

#[cfg(feature = "api")]
use crate::adapters::ImageInput;

#[cfg(feature = "api")]
use crate::orchestrator::{DiagnosisError, RecommendationError, RecommendationOrchestrator};

#[cfg(feature = "api")]
use crate::query::{EnvironmentalContext, FarmerQuery, QueryError, SymptomQuery};

#[cfg(feature = "api")]
use crate::tiers::{Season, Symptom, Weather};

/// Retry hint when the vision service gives no estimate
#[cfg(feature = "api")]
const DEFAULT_RETRY_AFTER_SECS: u64 = 20;

/// Non-standard status for a request the client abandoned
#[cfg(feature = "api")]
const CLIENT_CLOSED_REQUEST: u16 = 499;

// ============================================================================
// Application State
// ============================================================================

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RecommendationOrchestrator>,
}

#[cfg(feature = "api")]
impl AppState {
    pub fn new(orchestrator: RecommendationOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

#[cfg(feature = "api")]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Catalog endpoints
        .route("/api/crops", get(list_crops))
        .route("/api/symptoms", get(list_symptoms))
        .route("/api/diseases", get(list_diseases))
        .route("/api/diseases/:id", get(get_disease))

        // Advisory endpoints
        .route("/api/recommendations", post(recommend_crops))
        .route("/api/diseases/diagnose", post(diagnose_symptoms))
        .route("/api/analyze-image", post(analyze_image))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new()) // gzip + brotli compression
        .layer(CorsLayer::permissive()) // Allow all origins (adjust for production)
        .layer(TraceLayer::new_for_http()) // Request logging
        .with_state(state)
}

// ============================================================================
// Request Types
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationRequest {
    #[serde(flatten)]
    query: FarmerQuery,
    /// Recent 30-day rainfall (mm); the climate term uses a default when absent
    #[serde(default, alias = "rainfall")]
    rainfall_30d_mm: Option<f64>,
}

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
struct DiseaseFilter {
    crop: Option<String>,
}

/// Photo diagnosis body: base64 image (raw or data URL) plus optional symptom report
#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeImageRequest {
    image: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    crop: Option<String>,
    #[serde(default)]
    symptoms: Vec<Symptom>,
    #[serde(default)]
    season: Option<Season>,
    #[serde(default)]
    weather: Option<Weather>,
}

#[cfg(feature = "api")]
impl AnalyzeImageRequest {
    /// Decode the image, taking the mime type from a data URL prefix when not given
    fn image_input(&self) -> Result<ImageInput, AppError> {
        let (prefix_mime, payload) = split_data_url(&self.image);
        let mime_type = self
            .mime_type
            .clone()
            .or(prefix_mime)
            .ok_or_else(|| AppError::BadRequest("mimeType is required".to_string()))?;

        let bytes = BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|e| AppError::BadRequest(format!("image is not valid base64: {}", e)))?;

        Ok(ImageInput::new(bytes, mime_type))
    }

    /// Symptom fallback query, when the caller described any symptoms
    fn symptom_query(&self) -> Result<Option<SymptomQuery>, AppError> {
        if self.symptoms.is_empty() {
            return Ok(None);
        }
        let crop = self
            .crop
            .clone()
            .ok_or_else(|| AppError::BadRequest(QueryError::MissingCrop.to_string()))?;
        let season = self
            .season
            .ok_or_else(|| AppError::BadRequest("season is required with symptoms".to_string()))?;

        Ok(Some(SymptomQuery::new(
            crop,
            self.symptoms.clone(),
            season,
            self.weather.unwrap_or(Weather::Humid),
        )))
    }
}

#[cfg(feature = "api")]
fn split_data_url(image: &str) -> (Option<String>, &str) {
    match image.strip_prefix("data:").and_then(|rest| rest.split_once(";base64,")) {
        Some((mime, payload)) => (Some(mime.to_string()), payload),
        None => (None, image),
    }
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

#[cfg(feature = "api")]
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "aiEnabled": state.orchestrator.ai_enabled(),
        "visionEnabled": state.orchestrator.vision_enabled(),
    }))
}

#[cfg(feature = "api")]
async fn list_crops(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let crops = state.orchestrator.knowledge_base().crops();
    Ok(Json(serde_json::json!({
        "rows": crops.len(),
        "data": crops,
    })))
}

#[cfg(feature = "api")]
async fn list_symptoms() -> impl IntoResponse {
    let symptoms: Vec<&str> = Symptom::ALL.iter().map(|s| s.as_str()).collect();
    Json(serde_json::json!({
        "rows": symptoms.len(),
        "data": symptoms,
    }))
}

#[cfg(feature = "api")]
async fn list_diseases(
    State(state): State<AppState>,
    Query(filter): Query<DiseaseFilter>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kb = state.orchestrator.knowledge_base();
    let data = match filter.crop.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(crop) => serde_json::to_value(kb.diseases_for_crop(crop)),
        None => serde_json::to_value(kb.diseases()),
    }
    .map_err(|e| AppError::Internal(format!("JSON serialization error: {}", e)))?;

    let rows = data.as_array().map(|a| a.len()).unwrap_or(0);
    Ok(Json(serde_json::json!({
        "rows": rows,
        "data": data,
    })))
}

/// Disease by numeric id, or by name
#[cfg(feature = "api")]
async fn get_disease(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kb = state.orchestrator.knowledge_base();
    let disease = match key.parse::<u32>() {
        Ok(id) => kb.disease_by_id(id),
        Err(_) => kb.disease(&key),
    }
    .ok_or_else(|| AppError::NotFound(format!("Disease not found: {}", key)))?;

    serde_json::to_value(disease)
        .map(Json)
        .map_err(|e| AppError::Internal(format!("JSON serialization error: {}", e)))
}

#[cfg(feature = "api")]
async fn recommend_crops(
    State(state): State<AppState>,
    Json(payload): Json<RecommendationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(
        "Crop recommendation: season={}, water={}, goal={}",
        payload.query.season,
        payload.query.water,
        payload.query.goal
    );

    // Cancelled when the client disconnects and this future is dropped
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let context = payload
        .rainfall_30d_mm
        .map(|rainfall_30d_mm| EnvironmentalContext { rainfall_30d_mm });

    let result = state
        .orchestrator
        .recommend_crops(&payload.query, context.as_ref(), &cancel)
        .await?;

    to_json(&result)
}

#[cfg(feature = "api")]
async fn diagnose_symptoms(
    State(state): State<AppState>,
    Json(payload): Json<SymptomQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!(
        "Symptom diagnosis for {} ({} symptoms)",
        payload.crop,
        payload.symptoms.len()
    );

    let result = state.orchestrator.diagnose_symptoms(&payload)?;
    to_json(&result)
}

#[cfg(feature = "api")]
async fn analyze_image(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeImageRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let image = payload.image_input()?;
    let symptoms = payload.symptom_query()?;

    tracing::info!(
        "Image diagnosis: {} bytes ({}), symptom fallback: {}",
        image.bytes.len(),
        image.mime_type,
        symptoms.is_some()
    );

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let result = state
        .orchestrator
        .diagnose_image(&image, symptoms.as_ref(), &cancel)
        .await?;

    to_json(&result)
}

// ============================================================================
// Helper Functions
// ============================================================================

#[cfg(feature = "api")]
fn to_json<T: serde::Serialize>(value: &T) -> Result<Json<serde_json::Value>, AppError> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| AppError::Internal(format!("JSON serialization error: {}", e)))
}

// ============================================================================
// Error Handling
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    WarmingUp { message: String, retry_after_secs: u64 },
    BadGateway(String),
    ClientClosed(String),
    Internal(String),
}

#[cfg(feature = "api")]
impl From<RecommendationError> for AppError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::InvalidQuery(e) => AppError::BadRequest(e.to_string()),
            RecommendationError::Cancelled => AppError::ClientClosed(err.to_string()),
        }
    }
}

#[cfg(feature = "api")]
impl From<DiagnosisError> for AppError {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::InvalidQuery(_) | DiagnosisError::InvalidImage(_) => {
                AppError::BadRequest(err.to_string())
            }
            DiagnosisError::ModelWarmingUp { retry_after } => AppError::WarmingUp {
                message: err.to_string(),
                retry_after_secs: retry_after
                    .map(|d| d.as_secs_f64().ceil() as u64)
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            },
            DiagnosisError::VisionUnavailable(_) => AppError::BadGateway(err.to_string()),
            DiagnosisError::Cancelled => AppError::ClientClosed(err.to_string()),
        }
    }
}

#[cfg(feature = "api")]
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message, retry_after) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::WarmingUp { message, retry_after_secs } => {
                (StatusCode::SERVICE_UNAVAILABLE, message, Some(retry_after_secs))
            }
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg, None),
            AppError::ClientClosed(msg) => {
                tracing::debug!("Request cancelled: {}", msg);
                let status = StatusCode::from_u16(CLIENT_CLOSED_REQUEST).unwrap_or(StatusCode::BAD_REQUEST);
                (status, msg, None)
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        match retry_after {
            Some(secs) => (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response(),
            None => (status, body).into_response(),
        }
    }
}
