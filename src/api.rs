//! Gateway API Endpoints
//!
//! Provides all REST endpoints for:
//! - Direct translation (public)
//! - Task preparation (public)
//! - Task claim / input / result / status (internal, shared-secret gated)
//! - Public task lookup
//!
//! Core errors map to distinct response codes with machine-readable code
//! strings: NotFound → 404 NOT_FOUND, Conflict → 409 CONFLICT, HashMismatch
//! → 400 HASH_MISMATCH. Credential failures are boundary-level: a missing
//! configuration is 500 INTERNAL_KEY_NOT_CONFIGURED, a wrong key is 401
//! UNAUTHORIZED.

use crate::auth::{require_internal_key, AuthError, INTERNAL_API_KEY_HEADER};
use crate::error::TaskError;
use crate::task_service::{
    ClaimedTask, CompletedTask, PreparedInput, PreparedTask, PublicTask, TaskService, UpdatedTask,
};
use crate::translator::TranslatorService;
use crate::types::{FinalStatus, ResultPayload, TaskClaim, TaskInput, Translation};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

// ============================================================================
// SHARED STATE
// ============================================================================

/// API state shared across all handlers
pub struct ApiState {
    pub tasks: TaskService,
    pub translator: TranslatorService,
    pub internal_api_key: Option<String>,
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn error_response(status: StatusCode, code: &'static str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            code,
            message: message.into(),
        }),
    )
}

fn task_error(err: TaskError) -> ApiError {
    let (status, code) = match &err {
        TaskError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        TaskError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        TaskError::HashMismatch { .. } => (StatusCode::BAD_REQUEST, "HASH_MISMATCH"),
        TaskError::InvalidTimestamp(_) => (StatusCode::BAD_REQUEST, "INVALID_TIMESTAMP"),
        TaskError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE"),
        TaskError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    };
    error_response(status, code, err.to_string())
}

fn check_internal_key(state: &ApiState, headers: &HeaderMap) -> Result<(), ApiError> {
    let provided = headers
        .get(INTERNAL_API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    require_internal_key(state.internal_api_key.as_deref(), provided).map_err(|err| match err {
        AuthError::Unconfigured => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_KEY_NOT_CONFIGURED",
            "internal api key not configured",
        ),
        AuthError::Unauthorized => {
            warn!("Rejected internal call with bad api key");
            error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "invalid api key")
        }
    })
}

// ============================================================================
// TRANSLATION ENDPOINTS (Public)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
    #[serde(default)]
    pub include_grammar: bool,
}

/// POST /translate/chinese - Translate Chinese text
pub async fn translate_chinese(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TextRequest>,
) -> ApiResult<Translation> {
    require_text(&req.text)?;

    let result = state
        .translator
        .translate_chinese(&req.text, req.include_grammar)
        .await
        .map_err(llm_error)?;

    Ok(Json(result))
}

/// POST /correct/english - Correct English grammar
pub async fn correct_english(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TextRequest>,
) -> ApiResult<Translation> {
    require_text(&req.text)?;

    let result = state
        .translator
        .correct_english(&req.text, req.include_grammar)
        .await
        .map_err(llm_error)?;

    Ok(Json(result))
}

fn require_text(text: &str) -> Result<(), ApiError> {
    if text.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "INVALID_INPUT",
            "text must not be empty",
        ));
    }
    Ok(())
}

fn llm_error(err: anyhow::Error) -> ApiError {
    warn!("Translation failed: {:#}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "LLM_ERROR", err.to_string())
}

// ============================================================================
// TASK ENDPOINTS
// ============================================================================

/// POST /tasks/prepare - Register an input payload (public, idempotent)
pub async fn prepare_task(
    State(state): State<Arc<ApiState>>,
    Json(input): Json<TaskInput>,
) -> ApiResult<PreparedTask> {
    require_text(&input.text)?;
    state.tasks.prepare(&input).map(Json).map_err(task_error)
}

/// POST /tasks/claim - Bind an on-chain task id to a prepared input (internal)
pub async fn claim_task(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(claim): Json<TaskClaim>,
) -> ApiResult<ClaimedTask> {
    check_internal_key(&state, &headers)?;
    state.tasks.claim(&claim).map(Json).map_err(task_error)
}

/// GET /tasks/input/:input_hash - Fetch a prepared input payload (internal)
pub async fn get_task_input(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(input_hash): Path<String>,
) -> ApiResult<PreparedInput> {
    check_internal_key(&state, &headers)?;
    state
        .tasks
        .get_input(&input_hash)
        .map(Json)
        .map_err(task_error)
}

#[derive(Debug, Deserialize)]
pub struct TaskResultRequest {
    pub result_payload: ResultPayload,
    pub result_hash: Option<String>,
}

/// POST /tasks/:task_id/result - Store a task result (internal)
pub async fn submit_task_result(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(task_id): Path<i64>,
    Json(req): Json<TaskResultRequest>,
) -> ApiResult<CompletedTask> {
    check_internal_key(&state, &headers)?;
    state
        .tasks
        .submit_result(task_id, &req.result_payload, req.result_hash.as_deref())
        .map(Json)
        .map_err(task_error)
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusUpdateRequest {
    pub status: FinalStatus,
    pub tx_hash: Option<String>,
    pub block_number: Option<i64>,
}

/// POST /tasks/:task_id/status - Force a terminal status (internal)
pub async fn update_task_status(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(task_id): Path<i64>,
    Json(req): Json<TaskStatusUpdateRequest>,
) -> ApiResult<UpdatedTask> {
    check_internal_key(&state, &headers)?;
    state
        .tasks
        .update_status(task_id, req.status, req.tx_hash.as_deref(), req.block_number)
        .map(Json)
        .map_err(task_error)
}

#[derive(Debug, Deserialize)]
pub struct GetTaskQuery {
    #[serde(default)]
    pub include_result: bool,
}

/// GET /tasks/:task_id - Public task view
pub async fn get_task(
    State(state): State<Arc<ApiState>>,
    Path(task_id): Path<i64>,
    Query(query): Query<GetTaskQuery>,
) -> ApiResult<PublicTask> {
    state
        .tasks
        .get_public(task_id, query.include_result)
        .map(Json)
        .map_err(task_error)
}

// ============================================================================
// STATUS ENDPOINTS
// ============================================================================

/// GET /health - Liveness check
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/translate/chinese", post(translate_chinese))
        .route("/correct/english", post(correct_english))
        .route("/tasks/prepare", post(prepare_task))
        .route("/tasks/claim", post(claim_task))
        .route("/tasks/input/:input_hash", get(get_task_input))
        .route("/tasks/:task_id/result", post(submit_task_result))
        .route("/tasks/:task_id/status", post(update_task_status))
        .route("/tasks/:task_id", get(get_task))
        .with_state(state)
}
