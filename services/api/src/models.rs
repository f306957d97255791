//! API and Database Models
//!
//! This module defines the data structures used for both database mapping
//! with `sqlx` and for generating OpenAPI documentation with `utoipa`.

use chrono::{DateTime, Utc};
use interviewer_core::{
    analysis::ResponseAnalysis, flow::TurnOutcome, policy::InterviewAction, session::SessionStats,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(sqlx::Type, Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
#[sqlx(type_name = "interview_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Active,
    Ended,
}

impl InterviewStatus {
    /// An ended interview stays ended; its agent cannot be resumed.
    pub fn can_transition_to(self, next: InterviewStatus) -> bool {
        !(self == InterviewStatus::Ended && next == InterviewStatus::Active)
    }
}

#[derive(sqlx::Type, Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
#[sqlx(type_name = "message_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Candidate,
    Interviewer,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::Candidate => write!(f, "candidate"),
            MessageRole::Interviewer => write!(f, "interviewer"),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, FromRow, Debug, Clone)]
pub struct Interview {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub user_id: String,
    pub candidate_name: String,
    pub topic: String,
    #[schema(value_type = String, example = "active")]
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, ToSchema, FromRow, Debug, Clone)]
pub struct Message {
    pub id: i64,
    #[schema(value_type = String, format = Uuid)]
    pub interview_id: Uuid,
    #[schema(value_type = String, example = "candidate")]
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateInterviewPayload {
    #[schema(example = "Ada Lovelace")]
    pub candidate_name: String,
    #[schema(example = "Distributed Systems")]
    pub topic: String,
    /// Optional question set in the interview markdown format. When absent,
    /// questions are generated for the topic.
    #[serde(default)]
    pub questions_markdown: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateInterviewStatusPayload {
    #[schema(example = "ended")]
    pub status: InterviewStatus,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitResponsePayload {
    #[schema(example = "I would shard the data by customer id and add read replicas.")]
    pub text: String,
}

/// The interviewer's reaction to one candidate answer.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct TurnResult {
    #[schema(value_type = String, example = "ask_followup")]
    pub action: InterviewAction,
    /// Text the interviewer says next, cleaned for speech.
    pub response: String,
    pub should_continue: bool,
    pub explanation: String,
    #[schema(value_type = Object)]
    pub analysis: ResponseAnalysis,
    /// Id of the question now being asked, when the turn moved on.
    pub next_question_id: Option<String>,
}

impl From<TurnOutcome> for TurnResult {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            action: outcome.action,
            response: outcome.response,
            should_continue: outcome.should_continue,
            explanation: outcome.explanation,
            analysis: outcome.analysis,
            next_question_id: outcome.next_question.map(|q| q.id),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct SessionStatsResponse {
    pub total_questions: u32,
    pub elapsed_time_minutes: f64,
    pub questions_remaining: usize,
    pub current_followups: u32,
    pub finished: bool,
}

impl SessionStatsResponse {
    pub fn new(stats: SessionStats, finished: bool) -> Self {
        Self {
            total_questions: stats.total_questions,
            elapsed_time_minutes: stats.elapsed_time_minutes,
            questions_remaining: stats.questions_remaining,
            current_followups: stats.current_followups,
            finished,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use interviewer_core::{analysis::ResponseQuality, question::Question};

    fn interview(status: InterviewStatus) -> Interview {
        let now = Utc::now();
        Interview {
            id: Uuid::new_v4(),
            user_id: "user_123".to_string(),
            candidate_name: "Ada".to_string(),
            topic: "Databases".to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_interview_status_serialization() {
        assert_eq!(
            serde_json::to_string(&InterviewStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&InterviewStatus::Ended).unwrap(),
            "\"ended\""
        );
        let ended: InterviewStatus = serde_json::from_str("\"ended\"").unwrap();
        assert_eq!(ended, InterviewStatus::Ended);
    }

    #[test]
    fn test_ended_interview_cannot_be_reactivated() {
        use InterviewStatus::{Active, Ended};
        assert!(Active.can_transition_to(Active));
        assert!(Active.can_transition_to(Ended));
        assert!(Ended.can_transition_to(Ended));
        assert!(!Ended.can_transition_to(Active));
    }

    #[test]
    fn test_message_role_display_and_serde() {
        assert_eq!(format!("{}", MessageRole::Candidate), "candidate");
        assert_eq!(format!("{}", MessageRole::Interviewer), "interviewer");
        let role: MessageRole = serde_json::from_str("\"interviewer\"").unwrap();
        assert_eq!(role, MessageRole::Interviewer);
    }

    #[test]
    fn test_invalid_enum_deserialization() {
        assert!(serde_json::from_str::<InterviewStatus>("\"paused\"").is_err());
        assert!(serde_json::from_str::<MessageRole>("\"ai\"").is_err());
    }

    #[test]
    fn test_interview_serialization() {
        let interview = interview(InterviewStatus::Active);
        let json = serde_json::to_string(&interview).unwrap();
        assert!(json.contains("\"candidate_name\":\"Ada\""));
        assert!(json.contains("\"status\":\"active\""));

        let back: Interview = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, interview.id);
        assert_eq!(back.status, InterviewStatus::Active);
    }

    #[test]
    fn test_message_datetime_handling() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let message = Message {
            id: 7,
            interview_id: Uuid::new_v4(),
            role: MessageRole::Candidate,
            content: "I'd use a B-tree index.".to_string(),
            created_at: at,
        };
        let back: Message =
            serde_json::from_str(&serde_json::to_string(&message).unwrap()).unwrap();
        assert_eq!(back.created_at, at);
        assert_eq!(back.role, MessageRole::Candidate);
    }

    #[test]
    fn test_create_payload_questions_optional() {
        let payload: CreateInterviewPayload =
            serde_json::from_str(r#"{"candidate_name": "Ada", "topic": "Rust"}"#).unwrap();
        assert!(payload.questions_markdown.is_none());

        let missing: Result<CreateInterviewPayload, _> =
            serde_json::from_str(r#"{"candidate_name": "Ada"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_turn_result_from_outcome() {
        let outcome = TurnOutcome {
            action: InterviewAction::MoveToNext,
            response: "Next question.".to_string(),
            should_continue: true,
            explanation: "Excellent response, moving to next question".to_string(),
            analysis: ResponseAnalysis::heuristic(""),
            next_question: Some(Question::new("q_2", "Next question.")),
        };
        let result = TurnResult::from(outcome);
        assert_eq!(result.next_question_id.as_deref(), Some("q_2"));
        assert_eq!(result.analysis.quality, ResponseQuality::Incomplete);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["action"], "move_to_next");
        assert_eq!(json["analysis"]["quality"], "incomplete");
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Interview not found".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"message":"Interview not found"}"#
        );
    }
}
