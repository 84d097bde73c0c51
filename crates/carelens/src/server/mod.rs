//! HTTP API.
//!
//! Thin axum handlers over [`Services`]; every failure leaves as an
//! [`ApiError`] with a `{"detail": ...}` body.

mod error;

pub use error::ApiError;

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use carelens_core::config::ServerConfig;
use carelens_core::{
    ChartData, ChatRequest, ChatResponse, ScanAnalysis, ScanRequest, Services, SummarizeRequest,
    SummarizeResponse, SymptomRequest, SymptomResponse,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

type AppState = Arc<Services>;
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the application router.
pub fn router(services: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict/", post(predict))
        .route("/predict/trends", get(trends))
        .route("/analyze/", post(analyze))
        .route("/assistant/chat", post(chat))
        .route("/assistant/summarize", post(summarize))
        .route("/assistant/query_topics", get(query_topics))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(services)
}

/// Bind and serve until Ctrl-C.
pub async fn run(config: &ServerConfig, services: AppState) -> anyhow::Result<()> {
    let app = router(services, &config.allowed_origins);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("CareLens API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Welcome to the Healthcare AI API!",
    }))
}

async fn predict(
    State(services): State<AppState>,
    Json(request): Json<SymptomRequest>,
) -> ApiResult<SymptomResponse> {
    let predicted_diagnosis = services.symptoms()?.predict(&request)?;
    Ok(Json(SymptomResponse {
        predicted_diagnosis,
    }))
}

async fn trends(State(services): State<AppState>) -> ApiResult<ChartData> {
    tracing::info!("Trends endpoint called.");
    Ok(Json(services.symptoms()?.trends()?))
}

async fn analyze(
    State(services): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> ApiResult<ScanAnalysis> {
    let analysis = services.scan()?.analyze_base64(&request.image_base64).await?;
    Ok(Json(analysis))
}

async fn chat(
    State(services): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    let answer = services
        .assistant()?
        .chat(&request.question, &request.chat_history)
        .await?;
    Ok(Json(ChatResponse { answer }))
}

async fn summarize(
    State(services): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> ApiResult<SummarizeResponse> {
    let summary = services.assistant()?.summarize(&request).await?;
    Ok(Json(SummarizeResponse { summary }))
}

async fn query_topics(State(services): State<AppState>) -> ApiResult<ChartData> {
    tracing::info!("Query topics endpoint called.");
    Ok(Json(services.assistant()?.query_topics()?))
}
