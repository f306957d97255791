//! Contains the logic for a single interview turn, shared by the REST and
//! WebSocket entry points.

use crate::{
    models::{InterviewStatus, TurnResult},
    state::AppState,
};
use chrono::Utc;
use interviewer_core::agent::{AgentError, InterviewAgent};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("Interview '{0}' not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// The reaction to one answer and the agent state stored with it.
#[derive(Debug)]
pub struct CompletedTurn {
    pub result: TurnResult,
    pub agent: InterviewAgent,
}

/// Whether a locked interview still takes answers. Either an `ended` row or
/// a finished agent closes it.
pub fn ensure_accepting(status: InterviewStatus, agent: &InterviewAgent) -> Result<(), AgentError> {
    if status == InterviewStatus::Ended || agent.finished {
        return Err(AgentError::Finished);
    }
    Ok(())
}

/// Runs one candidate answer through the interview and persists the outcome.
///
/// This involves:
/// 1.  Locking the interview row and reading its status and latest agent state.
/// 2.  Analyzing the answer and choosing the next action via the agent.
/// 3.  Writing both transcript messages, the new agent state and, once the
///     agent has finished, the `ended` status in one transaction.
///
/// The row lock is held for the whole turn, so concurrent answers to the same
/// interview run one after another. Nothing is written when the agent rejects
/// the answer.
#[instrument(skip(state, text), fields(chars = text.len()))]
pub async fn run_turn(
    state: &AppState,
    interview_id: Uuid,
    text: &str,
) -> Result<CompletedTurn, TurnError> {
    let mut locked = state
        .db
        .lock_interview(interview_id)
        .await?
        .ok_or(TurnError::NotFound(interview_id))?;
    ensure_accepting(locked.status, &locked.agent)?;

    let outcome = locked
        .agent
        .respond(&state.flow, text, Utc::now())
        .await?;
    let agent = locked.record_turn(text.trim(), &outcome.response).await?;

    if agent.finished {
        info!("Interview finished.");
    }
    info!(action = %outcome.action, "Turn completed.");
    Ok(CompletedTurn {
        result: outcome.into(),
        agent,
    })
}
