use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use quizsift_core::{AbortOutcome, BatchCoordinator, SessionSnapshot, UrlSubmission};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::outbox::{Event, Outbox};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<BatchCoordinator>,
    pub outbox: Arc<Outbox>,
}

impl AppState {
    pub fn new(coordinator: BatchCoordinator) -> Self {
        Self { coordinator: Arc::new(coordinator), outbox: Arc::new(Outbox::new()) }
    }
}

#[derive(Debug, Deserialize)]
pub struct UrlsRequest {
    /// One URL per line.
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self { message: message.into() })
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    #[serde(flatten)]
    pub submission: UrlSubmission,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AbortResponse {
    pub outcome: AbortOutcome,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions/{user}", get(snapshot).delete(abort))
        .route("/sessions/{user}/start", post(start))
        .route("/sessions/{user}/urls", post(submit_urls))
        .route("/sessions/{user}/confirm", post(confirm))
        .route("/sessions/{user}/reject", post(reject))
        .route("/sessions/{user}/cancel", post(cancel))
        .route("/sessions/{user}/events", get(events))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn start(State(state): State<AppState>, Path(user): Path<String>) -> Result<Json<MessageResponse>, ApiError> {
    let welcome = state.coordinator.start(&user).await?;
    state.outbox.clear(&user).await;
    Ok(MessageResponse::new(welcome))
}

async fn submit_urls(
    State(state): State<AppState>, Path(user): Path<String>, Json(body): Json<UrlsRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = state.coordinator.submit_urls(&user, &body.text).await?;
    let message = submission.message();
    Ok(Json(SubmissionResponse { submission, message }))
}

/// Starts the batch on its own task and returns immediately.
async fn confirm(
    State(state): State<AppState>, Path(user): Path<String>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let job = state.coordinator.confirm(&user).await?;
    let message = format!("Processing {} URL(s)...", job.urls().len());

    let coordinator = state.coordinator.clone();
    let outbox = state.outbox.clone();
    tokio::spawn(async move {
        coordinator.run(job, outbox.as_ref()).await;
    });

    Ok((StatusCode::ACCEPTED, MessageResponse::new(message)))
}

async fn reject(State(state): State<AppState>, Path(user): Path<String>) -> Result<Json<MessageResponse>, ApiError> {
    state.coordinator.reject(&user).await?;
    Ok(MessageResponse::new("Discarded the pending URLs."))
}

async fn cancel(State(state): State<AppState>, Path(user): Path<String>) -> Result<Json<MessageResponse>, ApiError> {
    state.coordinator.cancel(&user).await?;
    Ok(MessageResponse::new("Cancelling after the current URL."))
}

async fn abort(State(state): State<AppState>, Path(user): Path<String>) -> Result<Json<AbortResponse>, ApiError> {
    let outcome = state.coordinator.abort(&user).await?;
    Ok(Json(AbortResponse { outcome }))
}

async fn snapshot(State(state): State<AppState>, Path(user): Path<String>) -> Json<SessionSnapshot> {
    Json(state.coordinator.snapshot(&user).await)
}

async fn events(State(state): State<AppState>, Path(user): Path<String>) -> Json<Vec<Event>> {
    Json(state.outbox.drain(&user).await)
}
