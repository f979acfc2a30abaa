//! HTTP API for the exercises service.
//!
//! # Endpoints
//!
//! - `POST /` - Create an exercise owned by the caller (auth)
//! - `GET /list/:lang` - List a language's exercises (`?closedOrder=1` sorts)
//! - `POST /list/:lang` - List a language's mixed exercises, body `{ "category" }`
//! - `GET /guided/:lang` - Full guided sequence of a language
//! - `GET /guided/:lang/:index` - Guided entry at a position
//! - `GET /next/:index?lang=` - Guided entry after a position, or `null`
//! - `GET /teacher` - The caller's exercises (auth)
//! - `GET /:exerciseId` - One owned exercise (auth)
//! - `PUT /:exerciseId` - Patch one owned exercise (auth)
//! - `DELETE /:exerciseId` - Delete one owned exercise (auth)
//!
//! Failures use the envelope `{ "error": { "type", "message" } }`, except
//! authentication failures, which relay the identity service's status and
//! `error` payload.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pictolearn_exercises::{
//!     create_router, AppState, Config, ExerciseService, HttpAuthenticator, InMemoryExerciseStore,
//! };
//!
//! # async fn example() {
//! let config = Config::default();
//! let service = ExerciseService::new(
//!     Arc::new(InMemoryExerciseStore::new()),
//!     Arc::new(HttpAuthenticator::from_config(&config).unwrap()),
//! );
//!
//! let router = create_router(AppState::new(config, service));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//! axum::serve(listener, router).await.unwrap();
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

use crate::{
    Config, Exercise, ExerciseError, ExerciseId, ExercisePatch, ExerciseService, GuidedEntry,
    GuidedSequence, NewExercise,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query string of `GET /list/:lang`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Any non-empty value sorts the listing by `closedOrder`.
    pub closed_order: Option<String>,
}

impl ListQuery {
    fn sorts(&self) -> bool {
        self.closed_order
            .as_deref()
            .is_some_and(|flag| !flag.is_empty())
    }
}

/// Request body of `POST /list/:lang`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRequest {
    /// Category to restrict the listing to.
    #[serde(default)]
    pub category: Option<String>,
}

/// Query string of `GET /next/:index`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    /// Language of the guided sequence; the configured default if absent.
    pub lang: Option<String>,
}

/// Error details inside the failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description.
    pub message: String,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: ErrorBody,
}

impl ErrorResponse {
    fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                kind: kind.to_string(),
                message: message.into(),
            },
        }
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configuration of the service.
    pub config: Config,
    /// Exercise operations.
    pub service: ExerciseService,
}

impl AppState {
    /// Creates a new `AppState`.
    #[must_use]
    pub const fn new(config: Config, service: ExerciseService) -> Self {
        Self { config, service }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Error type for API handlers, translating [`ExerciseError`] into the
/// failure envelope.
#[derive(Debug)]
pub struct ApiError(ExerciseError);

impl From<ExerciseError> for ApiError {
    fn from(err: ExerciseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ExerciseError::Auth { status, error } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::UNAUTHORIZED);
                let body = if error.is_null() {
                    serde_json::json!({})
                } else {
                    serde_json::json!({ "error": error })
                };
                (status, Json(body)).into_response()
            }
            err @ ExerciseError::Validation { .. } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("validationError", err.to_string())),
            )
                .into_response(),
            ExerciseError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("notFound", "Exercise not found")),
            )
                .into_response(),
            ExerciseError::Forbidden { .. } => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("forbidden", "This exercise is not yours")),
            )
                .into_response(),
            err => {
                error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(
                        "internalServerError",
                        "Internal server error",
                    )),
                )
                    .into_response()
            }
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all exercise endpoints.
///
/// The router is configured with:
/// - CORS middleware allowing any origin
/// - Tracing middleware for request logging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", post(handle_create))
        .route("/list/:lang", get(handle_list).post(handle_list_by_category))
        .route("/guided/:lang", get(handle_guided))
        .route("/guided/:lang/:index", get(handle_guided_at))
        .route("/next/:index", get(handle_next))
        .route("/teacher", get(handle_list_owned))
        .route(
            "/:exercise_id",
            get(handle_get_owned)
                .put(handle_update)
                .delete(handle_delete),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `POST /`.
async fn handle_create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<NewExercise>,
) -> ApiResult<Exercise> {
    Ok(Json(state.service.create(&headers, payload).await?))
}

/// Handler for `GET /list/:lang`.
async fn handle_list(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Exercise>> {
    Ok(Json(
        state
            .service
            .list_by_language(&lang, query.sorts())
            .await?,
    ))
}

/// Handler for `POST /list/:lang`.
///
/// A missing or unreadable body lists every category.
async fn handle_list_by_category(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
    body: Option<Json<CategoryRequest>>,
) -> ApiResult<Vec<Exercise>> {
    let category = body.and_then(|Json(request)| request.category);
    Ok(Json(
        state
            .service
            .list_by_language_and_category(&lang, category.as_deref())
            .await?,
    ))
}

/// Handler for `GET /guided/:lang`.
async fn handle_guided(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
) -> ApiResult<GuidedSequence> {
    Ok(Json(state.service.guided(&lang).await?))
}

/// Handler for `GET /guided/:lang/:index`.
async fn handle_guided_at(
    State(state): State<Arc<AppState>>,
    Path((lang, index)): Path<(String, String)>,
) -> ApiResult<GuidedEntry> {
    let not_found = || ExerciseError::not_found(format!("{lang}/{index}"));
    let position = index.trim().parse::<i64>().map_err(|_| not_found())?;

    let entry = state
        .service
        .guided_at(&lang, position)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(entry))
}

/// Handler for `GET /next/:index`.
///
/// Answers `null` when there is no next entry.
async fn handle_next(
    State(state): State<Arc<AppState>>,
    Path(index): Path<String>,
    Query(query): Query<NextQuery>,
) -> ApiResult<Option<GuidedEntry>> {
    let lang = query
        .lang
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| state.config.default_language.clone());

    Ok(Json(state.service.guided_after(&lang, &index).await?))
}

/// Handler for `GET /teacher`.
async fn handle_list_owned(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Vec<Exercise>> {
    Ok(Json(state.service.list_owned_by_caller(&headers).await?))
}

/// Handler for `GET /:exerciseId`.
async fn handle_get_owned(
    State(state): State<Arc<AppState>>,
    Path(exercise_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Exercise> {
    let id = ExerciseId::from(exercise_id);
    Ok(Json(state.service.get_owned(&headers, &id).await?))
}

/// Handler for `PUT /:exerciseId`.
async fn handle_update(
    State(state): State<Arc<AppState>>,
    Path(exercise_id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<ExercisePatch>,
) -> ApiResult<Exercise> {
    let id = ExerciseId::from(exercise_id);
    Ok(Json(state.service.update(&headers, &id, &patch).await?))
}

/// Handler for `DELETE /:exerciseId`.
async fn handle_delete(
    State(state): State<Arc<AppState>>,
    Path(exercise_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Exercise> {
    let id = ExerciseId::from(exercise_id);
    Ok(Json(state.service.delete(&headers, &id).await?))
}

// ============================================================================
// Tests
// ============================================================================
