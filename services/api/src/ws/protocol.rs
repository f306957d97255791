//! Defines the WebSocket message protocol between the browser client and the API server.

use crate::models::{self, TurnResult};
use interviewer_core::agent::InterviewAgent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Attaches the connection to an existing interview. This must be the first message.
    Init { interview_id: Uuid },
    /// The candidate's answer to the current question.
    CandidateMessage { text: String },
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms successful initialization and provides the current state.
    Initialized {
        interview_id: Uuid,
        agent_state: InterviewAgent,
        history: Vec<models::Message>,
    },
    /// The interviewer's reaction to the last answer.
    TurnResult { turn: TurnResult },
    /// Pushes the complete, updated agent state to the client.
    StateUpdate { state: InterviewAgent },
    /// Sent once the interview is over; the connection closes afterwards.
    InterviewEnded { message: String },
    /// Reports an error to the client.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_decode_init() {
        let id = Uuid::new_v4();
        let msg: ClientMessage =
            serde_json::from_str(&format!(r#"{{"type":"init","interview_id":"{id}"}}"#)).unwrap();
        assert_eq!(msg, ClientMessage::Init { interview_id: id });
    }

    #[test]
    fn test_decode_candidate_message() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"candidate_message","text":"A mutex."}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CandidateMessage {
                text: "A mutex.".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_or_incomplete() {
        let unknown = r#"{"type":"user_message","text":"x"}"#;
        assert!(serde_json::from_str::<ClientMessage>(unknown).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"init"}"#).is_err());
    }

    #[test]
    fn test_encode_server_messages() {
        let ended = serde_json::to_value(ServerMessage::InterviewEnded {
            message: "Bye".to_string(),
        })
        .unwrap();
        assert_eq!(ended["type"], "interview_ended");
        assert_eq!(ended["message"], "Bye");

        let agent = InterviewAgent::new("Ada".into(), "Rust".into(), vec![], Utc::now());
        let update = serde_json::to_value(ServerMessage::StateUpdate { state: agent }).unwrap();
        assert_eq!(update["type"], "state_update");
        assert_eq!(update["state"]["candidate_name"], "Ada");
    }
}
