//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling HTTP requests for interview management.
//! It uses `utoipa` doc comments to generate OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use interviewer_core::{
    agent::{AgentError, InterviewAgent},
    question::parse_markdown,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    models::{
        CreateInterviewPayload, ErrorResponse, Interview, InterviewStatus, Message,
        SessionStatsResponse, SubmitResponsePayload, TurnResult, UpdateInterviewStatusPayload,
    },
    state::AppState,
    turn::{TurnError, run_turn},
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    InternalServerError(anyhow::Error),
}

impl ApiError {
    fn from_turn(err: TurnError) -> Self {
        match err {
            TurnError::Agent(AgentError::EmptyResponse) => {
                ApiError::BadRequest(AgentError::EmptyResponse.to_string())
            }
            TurnError::Agent(e) => ApiError::Conflict(e.to_string()),
            TurnError::NotFound(id) => {
                ApiError::NotFound(format!("Interview with id '{}' not found", id))
            }
            TurnError::Internal(e) => ApiError::InternalServerError(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

fn user_id(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))
}

async fn owned_interview(
    state: &AppState,
    id: Uuid,
    user_id: &str,
) -> Result<Interview, ApiError> {
    state
        .db
        .get_interview(id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Interview with id '{}' not found", id)))
}

async fn latest_agent(state: &AppState, id: Uuid) -> Result<InterviewAgent, ApiError> {
    state
        .db
        .get_latest_agent_state(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No state stored for interview '{}'", id)))
}

fn check_transition(
    id: Uuid,
    current: InterviewStatus,
    next: InterviewStatus,
) -> Result<(), ApiError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(ApiError::Conflict(format!(
            "Interview '{}' has ended and cannot be reactivated",
            id
        )))
    }
}

/// Create a new interview and ask the opening question.
#[utoipa::path(
    post,
    path = "/interviews",
    request_body = CreateInterviewPayload,
    responses(
        (status = 201, description = "Interview created successfully", body = Interview),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user creating the interview")
    )
)]
pub async fn create_interview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateInterviewPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    if payload.candidate_name.trim().is_empty() || payload.topic.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "candidate_name and topic must not be empty".to_string(),
        ));
    }

    let questions = match &payload.questions_markdown {
        Some(markdown) => {
            let questions = parse_markdown(markdown);
            if questions.is_empty() {
                return Err(ApiError::BadRequest(
                    "questions_markdown contains no questions".to_string(),
                ));
            }
            questions
        }
        None => {
            state
                .question_generator
                .generate_questions(&payload.topic)
                .await?
        }
    };

    let now = Utc::now();
    let mut agent = InterviewAgent::new(
        payload.candidate_name.clone(),
        payload.topic.clone(),
        questions,
        now,
    );
    let greeting = agent.start(now);

    let interview = state
        .db
        .create_interview(user_id, &agent, &greeting)
        .await?;
    info!(interview_id = %interview.id, topic = %interview.topic, "Interview created.");

    Ok((StatusCode::CREATED, Json(interview)))
}

/// List all interviews for a user.
#[utoipa::path(
    get,
    path = "/interviews",
    responses(
        (status = 200, description = "List of interviews", body = [Interview]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn list_interviews(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Interview>>, ApiError> {
    let user_id = user_id(&headers)?;
    let interviews = state.db.list_interviews(user_id).await?;
    Ok(Json(interviews))
}

/// Get a specific interview by its ID.
#[utoipa::path(
    get,
    path = "/interviews/{id}",
    responses(
        (status = 200, description = "Interview details", body = Interview),
        (status = 404, description = "Interview not found"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Interview ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_interview(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    let interview = owned_interview(&state, id, user_id).await?;
    Ok((StatusCode::OK, Json(interview)))
}

/// Update the status of an interview. Ending it stops further turns, and an
/// ended interview cannot be reactivated.
#[utoipa::path(
    patch,
    path = "/interviews/{id}/status",
    request_body = UpdateInterviewStatusPayload,
    responses(
        (status = 200, description = "Interview status updated successfully", body = Interview),
        (status = 404, description = "Interview not found"),
        (status = 409, description = "Interview has already ended", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Interview ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn update_interview_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInterviewStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers)?;
    let _ = owned_interview(&state, id, user_id).await?;

    let locked = state
        .db
        .lock_interview(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Interview with id '{}' not found", id)))?;
    check_transition(id, locked.status, payload.status)?;

    let updated = locked.set_status(payload.status).await?;
    info!(interview_id = %id, status = ?updated.status, "Interview status updated.");
    Ok((StatusCode::OK, Json(updated)))
}

/// Get the transcript of an interview.
#[utoipa::path(
    get,
    path = "/interviews/{id}/messages",
    responses(
        (status = 200, description = "Interview transcript, oldest first", body = [Message]),
        (status = 404, description = "Interview not found"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Interview ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_interview_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let user_id = user_id(&headers)?;
    let _ = owned_interview(&state, id, user_id).await?;
    let messages = state.db.get_interview_messages(id).await?;
    Ok(Json(messages))
}

/// Get progress statistics for an interview.
#[utoipa::path(
    get,
    path = "/interviews/{id}/stats",
    responses(
        (status = 200, description = "Interview statistics", body = SessionStatsResponse),
        (status = 404, description = "Interview not found"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Interview ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn get_interview_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionStatsResponse>, ApiError> {
    let user_id = user_id(&headers)?;
    let _ = owned_interview(&state, id, user_id).await?;
    let agent = latest_agent(&state, id).await?;
    Ok(Json(SessionStatsResponse::new(
        agent.stats(Utc::now()),
        agent.finished,
    )))
}

/// Submit the candidate's answer to the current question.
#[utoipa::path(
    post,
    path = "/interviews/{id}/responses",
    request_body = SubmitResponsePayload,
    responses(
        (status = 200, description = "The interviewer's reaction", body = TurnResult),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Interview not found"),
        (status = 409, description = "Interview has already ended", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("id" = Uuid, Path, description = "Interview ID"),
        ("x-user-id" = String, Header, description = "The ID of the user")
    )
)]
pub async fn submit_response(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitResponsePayload>,
) -> Result<Json<TurnResult>, ApiError> {
    let user_id = user_id(&headers)?;
    let _ = owned_interview(&state, id, user_id).await?;

    let turn = run_turn(&state, id, &payload.text)
        .await
        .map_err(ApiError::from_turn)?;
    Ok(Json(turn.result))
}
