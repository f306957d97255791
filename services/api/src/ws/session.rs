//! Manages the WebSocket connection lifecycle for a live interview.

use super::protocol::{ClientMessage, ServerMessage};
use crate::{
    models,
    state::AppState,
    turn::{CompletedTurn, TurnError, run_turn},
};
use anyhow::{Context, Result, anyhow};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use interviewer_core::{
    agent::{AgentError, InterviewAgent},
    flow::CLOSING_MESSAGE,
};
use std::sync::Arc;
use tracing::{Instrument, error, info, instrument, warn};
use uuid::Uuid;

type Sink = SplitSink<WebSocket, Message>;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// Performs the `init` handshake, then runs the interview loop in its own
/// instrumented task.
#[instrument(name = "ws_session", skip_all, fields(connection_id, interview_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id: u32 = rand::random();
    tracing::Span::current().record("connection_id", connection_id);
    info!("New WebSocket connection. Awaiting initialization...");

    let (mut socket_tx, mut socket_rx) = socket.split();

    let init = match socket_rx.next().await {
        Some(Ok(Message::Text(text))) => initialize_interview(&text, &state).await,
        Some(Ok(_)) => Err(anyhow!("First message was not a text `init` message.")),
        Some(Err(e)) => Err(anyhow!(e)),
        None => {
            info!("Client disconnected before sending init message.");
            return;
        }
    };

    let (interview_id, agent, history) = match init {
        Ok(init) => init,
        Err(e) => {
            error!("Interview initialization failed: {:?}", e);
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };

    if send_msg(
        &mut socket_tx,
        ServerMessage::Initialized {
            interview_id,
            agent_state: agent.clone(),
            history,
        },
    )
    .await
    .is_err()
    {
        error!("Failed to send Initialized message to client.");
        return;
    }

    let session_span =
        tracing::info_span!("interview_runtime", %interview_id, topic = %agent.topic);
    let finished = agent.finished;
    tokio::spawn(
        async move {
            if let Err(e) =
                run_interview_session(state, socket_tx, socket_rx, interview_id, finished).await
            {
                error!(error = ?e, "Interview session terminated with error.");
            }
            info!("Interview session finished.");
        }
        .instrument(session_span),
    );
}

/// Parses the `init` message and loads the interview state from the database.
async fn initialize_interview(
    init_text: &str,
    state: &AppState,
) -> Result<(Uuid, InterviewAgent, Vec<models::Message>)> {
    let interview_id = match serde_json::from_str::<ClientMessage>(init_text)? {
        ClientMessage::Init { interview_id } => interview_id,
        _ => return Err(anyhow!("First message must be `init`")),
    };

    tracing::Span::current().record("interview_id", tracing::field::display(interview_id));
    info!("Attaching to interview");

    let agent = state
        .db
        .get_latest_agent_state(interview_id)
        .await?
        .context("Interview state not found")?;
    let history = state.db.get_interview_messages(interview_id).await?;
    Ok((interview_id, agent, history))
}

/// The main event loop for an attached interview.
///
/// Each candidate message runs one turn against the stored state, so a status
/// change made over REST is seen on the next answer. The connection closes
/// once the interview has ended.
async fn run_interview_session(
    state: Arc<AppState>,
    mut socket_tx: Sink,
    mut socket_rx: SplitStream<WebSocket>,
    interview_id: Uuid,
    finished: bool,
) -> Result<()> {
    if finished {
        send_msg(
            &mut socket_tx,
            ServerMessage::InterviewEnded {
                message: CLOSING_MESSAGE.to_string(),
            },
        )
        .await?;
        return Ok(());
    }

    while let Some(msg_result) = socket_rx.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::CandidateMessage { text }) => {
                    let keep_going =
                        handle_candidate_message(&state, &mut socket_tx, interview_id, &text)
                            .await?;
                    if !keep_going {
                        break;
                    }
                }
                Ok(ClientMessage::Init { .. }) => {
                    warn!("Ignoring repeated `init` message.");
                }
                Err(e) => {
                    warn!("Ignoring malformed client message: {}", e);
                    send_msg(
                        &mut socket_tx,
                        ServerMessage::Error {
                            message: format!("Malformed message: {}", e),
                        },
                    )
                    .await?;
                }
            },
            Ok(Message::Binary(_)) => warn!("Ignoring unexpected binary message."),
            Ok(Message::Close(_)) => {
                info!("Client sent close frame. Shutting down session.");
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Err(e) => {
                error!("Error receiving from client WebSocket: {:?}", e);
                break;
            }
        }
    }

    let _ = socket_tx.close().await;
    info!("WebSocket connection closed.");
    Ok(())
}

/// Runs one turn and reports it to the client. Returns `false` once the
/// interview is over.
async fn handle_candidate_message(
    state: &AppState,
    socket_tx: &mut Sink,
    interview_id: Uuid,
    text: &str,
) -> Result<bool> {
    match run_turn(state, interview_id, text).await {
        Ok(CompletedTurn { result, agent }) => {
            let should_continue = result.should_continue;
            let closing = result.response.clone();
            send_msg(socket_tx, ServerMessage::TurnResult { turn: result }).await?;
            send_msg(socket_tx, ServerMessage::StateUpdate { state: agent }).await?;
            if !should_continue {
                send_msg(socket_tx, ServerMessage::InterviewEnded { message: closing }).await?;
            }
            Ok(should_continue)
        }
        Err(TurnError::Agent(e)) => {
            let (msg, keep_going) = rejection(e);
            send_msg(socket_tx, msg).await?;
            Ok(keep_going)
        }
        Err(e @ TurnError::NotFound(_)) => {
            send_msg(
                socket_tx,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await?;
            Ok(false)
        }
        Err(TurnError::Internal(e)) => Err(e),
    }
}

/// Maps a rejected answer onto the message sent back. The candidate can retry
/// unless the interview has ended, in which case the session closes.
fn rejection(err: AgentError) -> (ServerMessage, bool) {
    match err {
        AgentError::Finished => (
            ServerMessage::InterviewEnded {
                message: CLOSING_MESSAGE.to_string(),
            },
            false,
        ),
        other => (
            ServerMessage::Error {
                message: other.to_string(),
            },
            true,
        ),
    }
}

/// Serializes and sends a `ServerMessage` to the client.
pub(crate) async fn send_msg(socket_tx: &mut Sink, msg: ServerMessage) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ended_interview_closes_session() {
        let (msg, keep_going) = rejection(AgentError::Finished);
        assert!(!keep_going);
        assert!(matches!(
            msg,
            ServerMessage::InterviewEnded { message } if message == CLOSING_MESSAGE
        ));
    }

    #[test]
    fn test_rejected_answer_keeps_session_open() {
        for err in [AgentError::EmptyResponse, AgentError::NoCurrentQuestion] {
            let expected = err.to_string();
            let (msg, keep_going) = rejection(err);
            assert!(keep_going);
            assert!(matches!(msg, ServerMessage::Error { message } if message == expected));
        }
    }
}
