//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API, WebSocket endpoint, and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        CreateInterviewPayload, ErrorResponse, Interview, InterviewStatus, Message, MessageRole,
        SessionStatsResponse, SubmitResponsePayload, TurnResult, UpdateInterviewStatusPayload,
    },
    state::AppState,
    ws::ws_handler,
};

use axum::{
    Router,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_interview,
        handlers::list_interviews,
        handlers::get_interview,
        handlers::update_interview_status,
        handlers::get_interview_messages,
        handlers::get_interview_stats,
        handlers::submit_response,
    ),
    components(
        schemas(
            Interview, Message, CreateInterviewPayload, UpdateInterviewStatusPayload,
            SubmitResponsePayload, TurnResult, SessionStatsResponse, ErrorResponse,
            InterviewStatus, MessageRole
        )
    ),
    tags(
        (name = "Interviewer API", description = "Adaptive technical interview sessions")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route(
            "/interviews",
            get(handlers::list_interviews).post(handlers::create_interview),
        )
        .route("/interviews/{id}", get(handlers::get_interview))
        .route(
            "/interviews/{id}/status",
            patch(handlers::update_interview_status),
        )
        .route(
            "/interviews/{id}/messages",
            get(handlers::get_interview_messages),
        )
        .route("/interviews/{id}/stats", get(handlers::get_interview_stats))
        .route(
            "/interviews/{id}/responses",
            post(handlers::submit_response),
        )
        .route("/ws", get(ws_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .layer(TraceLayer::new_for_http())
}
