use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use ironplan_core::EngineError;
use ironplan_core::identity::{TokenConfig, TokenError, validate_user_token};
use ironplan_core::planner::{self, CompletedSetInput};
use ironplan_core::program::{self, parse_program_json};
use ironplan_core::{plates, tracker};
use ironplan_db::models::{ProgramState, UserProgram};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenConfig,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Storage(e) => {
                let detail = format!("{e:#}");
                tracing::error!(error = %detail, "storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: format!("{err:#}"),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        Self::unauthorized(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// The user identified by the request's `Authorization: Bearer` token.
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("expected a Bearer token"))?;
        let user_id = validate_user_token(&state.tokens, token.trim())?;
        Ok(Self(user_id))
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PlatesQuery {
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct UserProgramResponse {
    #[serde(flatten)]
    pub user_program: UserProgram,
    pub state: ProgramState,
}

impl From<UserProgram> for UserProgramResponse {
    fn from(user_program: UserProgram) -> Self {
        Self {
            state: user_program.state(),
            user_program,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/plates", get(get_plates))
        .route("/api/programs", get(list_programs).post(create_program))
        .route("/api/programs/{id}", get(get_program))
        .route("/api/programs/{id}/start", post(start_program))
        .route("/api/progress", get(list_progress))
        .route("/api/progress/{id}", get(get_progress))
        .route("/api/progress/{id}/today", get(get_today))
        .route("/api/progress/{id}/complete", post(complete_workout))
        .route("/api/progress/{id}/stop", post(stop_program))
        .route("/api/progress/{id}/sessions", get(get_sessions))
        .route(
            "/api/exercise-progress/{id}/history",
            get(get_exercise_history),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("ironplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("ironplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C; shutting down");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_plates(Query(query): Query<PlatesQuery>) -> Json<plates::PlateResult> {
    Json(plates::resolve(query.weight))
}

async fn list_programs(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, AppError> {
    let programs = program::list_programs(&state.pool, user_id).await?;
    Ok(Json(programs).into_response())
}

/// The body is a program file in JSON form.
async fn create_program(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: String,
) -> Result<Response, AppError> {
    let file = parse_program_json(&body).map_err(EngineError::from)?;
    let program = program::create_program(&state.pool, user_id, &file).await?;
    Ok((StatusCode::CREATED, Json(program)).into_response())
}

async fn get_program(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = program::get_program_with_workouts(&state.pool, user_id, id).await?;
    Ok(Json(detail).into_response())
}

async fn start_program(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let user_program = tracker::start_program(&state.pool, user_id, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserProgramResponse::from(user_program)),
    )
        .into_response())
}

async fn list_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Response, AppError> {
    let runs: Vec<UserProgramResponse> = tracker::list_active_programs(&state.pool, user_id)
        .await?
        .into_iter()
        .map(UserProgramResponse::from)
        .collect();
    Ok(Json(runs).into_response())
}

async fn get_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = tracker::progress_detail(&state.pool, user_id, id).await?;
    Ok(Json(detail).into_response())
}

async fn get_today(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let plan = planner::plan_today(&state.pool, user_id, id).await?;
    Ok(Json(plan).into_response())
}

async fn complete_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(sets): Json<Vec<CompletedSetInput>>,
) -> Result<Response, AppError> {
    let updated = planner::complete_workout(&state.pool, user_id, id, &sets).await?;
    Ok(Json(UserProgramResponse::from(updated)).into_response())
}

async fn stop_program(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let stopped = tracker::stop_program(&state.pool, user_id, id).await?;
    Ok(Json(UserProgramResponse::from(stopped)).into_response())
}

async fn get_sessions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let sessions = tracker::session_history(&state.pool, user_id, id).await?;
    Ok(Json(sessions).into_response())
}

async fn get_exercise_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let sets = tracker::exercise_history(&state.pool, user_id, id).await?;
    Ok(Json(sets).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
