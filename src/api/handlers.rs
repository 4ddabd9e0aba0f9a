//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    BackResponse, CreateSessionRequest, ErrorResponse, MessageRequest, SessionResponse,
    SuccessResponse, TemplatesResponse, TurnResponse,
};
use super::AppState;
use crate::assistant::AssistantError;
use crate::controller::SendOutcome;
use crate::runtime::{RuntimeError, SessionHandle};
use crate::session::QuickOption;
use crate::transport::{ConverseRequest, ConverseResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(close_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Conversation actions
        .route("/api/sessions/:id/start", post(start_conversation))
        .route("/api/sessions/:id/messages", post(send_message))
        .route("/api/sessions/:id/options", post(select_option))
        .route("/api/sessions/:id/back", post(go_back))
        .route("/api/sessions/:id/reset", post(reset_session))
        // Assistant operation and catalog
        .route("/api/assistant", post(run_assistant))
        .route("/api/templates", get(list_templates))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

fn session_response(handle: &SessionHandle) -> SessionResponse {
    SessionResponse {
        id: handle.id.clone(),
        deal_id: handle.controller.context().deal_id.clone(),
        created_at: handle.created_at,
        session: handle.controller.view(),
    }
}

async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let handle = state.runtime.open(&req.deal_id, req.user_id).await?;
    Ok((StatusCode::CREATED, Json(session_response(&handle))))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = state.runtime.get(&id).await?;
    Ok(Json(session_response(&handle)))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.runtime.close(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.runtime.get(&id).await?;
    // Subscribe before reading the view so no update falls in between
    let rx = handle.notifier.subscribe();
    Ok(sse_stream(handle.controller.view(), rx))
}

// ============================================================
// Conversation Actions
// ============================================================

fn turn_response(handle: &SessionHandle, outcome: &SendOutcome) -> Result<Json<TurnResponse>, AppError> {
    if *outcome == SendOutcome::Busy {
        return Err(AppError::Conflict(
            "A message is already being processed".to_string(),
        ));
    }
    Ok(Json(TurnResponse::new(outcome, handle.controller.view())))
}

async fn start_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TurnResponse>, AppError> {
    let handle = state.runtime.get(&id).await?;
    let outcome = handle.controller.start_conversation().await;
    turn_response(&handle, &outcome)
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let handle = state.runtime.get(&id).await?;
    let outcome = handle.controller.send_message(&req.content).await;
    turn_response(&handle, &outcome)
}

async fn select_option(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(option): Json<QuickOption>,
) -> Result<Json<TurnResponse>, AppError> {
    let handle = state.runtime.get(&id).await?;
    let outcome = handle.controller.select_option(&option).await;
    turn_response(&handle, &outcome)
}

async fn go_back(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BackResponse>, AppError> {
    let handle = state.runtime.get(&id).await?;
    let went_back = handle.controller.go_back();
    Ok(Json(BackResponse {
        went_back,
        session: handle.controller.view(),
    }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = state.runtime.get(&id).await?;
    handle.controller.reset();
    Ok(Json(session_response(&handle)))
}

// ============================================================
// Assistant Operation
// ============================================================

async fn run_assistant(
    State(state): State<AppState>,
    Json(req): Json<ConverseRequest>,
) -> Result<Json<ConverseResponse>, AppError> {
    let response = state.assistant.respond(&req).await?;
    Ok(Json(response))
}

async fn list_templates(State(state): State<AppState>) -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        templates: state.assistant.catalog().templates().to_vec(),
    })
}

async fn get_version() -> &'static str {
    concat!("trustroom-docgen ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::MissingDeal => AppError::BadRequest(e.to_string()),
            RuntimeError::NotFound(_) => AppError::NotFound(e.to_string()),
        }
    }
}

impl From<AssistantError> for AppError {
    fn from(e: AssistantError) -> Self {
        match e {
            AssistantError::UnsupportedOperation(_) | AssistantError::UnknownTemplate(_) => {
                AppError::BadRequest(e.to_string())
            }
            AssistantError::Drafting(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
