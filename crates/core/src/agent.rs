//! Interview Agent Service
//!
//! This module holds the state of one running interview and exposes it over
//! the Model Context Protocol (MCP), so an external agent can drive the
//! interview turn by turn through tool calls.

use crate::{
    flow::{CLOSING_MESSAGE, InterviewFlow, TurnOutcome},
    question::Question,
    session::{SessionContext, SessionStats},
    speech::clean_for_speech,
};
use chrono::{DateTime, Utc};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

// --- Agent State ---

/// Complete state of a single interview.
///
/// Serialized after every turn so an interview can be resumed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InterviewAgent {
    pub candidate_name: String,
    pub topic: String,
    pub context: SessionContext,
    /// The question the candidate is currently answering.
    pub current_question: Option<Question>,
    pub finished: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("The interview has already ended.")]
    Finished,
    #[error("No question has been asked yet.")]
    NoCurrentQuestion,
    #[error("Response text must not be empty.")]
    EmptyResponse,
}

impl InterviewAgent {
    /// Creates an interview that has not asked anything yet.
    pub fn new(
        candidate_name: String,
        topic: String,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            candidate_name,
            topic,
            context: SessionContext::new(questions, now),
            current_question: None,
            finished: false,
        }
    }

    /// Asks the opening question and returns the interviewer's greeting.
    ///
    /// An empty question pool ends the interview immediately.
    pub fn start(&mut self, now: DateTime<Utc>) -> String {
        match InterviewFlow::open(&mut self.context, now) {
            Some(question) => {
                let greeting = format!(
                    "Hello {}! Welcome to your {} interview. Let's begin. {}",
                    self.candidate_name,
                    self.topic,
                    clean_for_speech(&question.text)
                );
                self.current_question = Some(question);
                greeting
            }
            None => {
                self.finished = true;
                CLOSING_MESSAGE.to_string()
            }
        }
    }

    /// Runs one candidate turn through the flow.
    ///
    /// The returned utterance is already cleaned for speaking aloud.
    pub async fn respond(
        &mut self,
        flow: &InterviewFlow,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<TurnOutcome, AgentError> {
        if self.finished {
            return Err(AgentError::Finished);
        }
        if text.trim().is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        let current = self
            .current_question
            .clone()
            .ok_or(AgentError::NoCurrentQuestion)?;

        let mut outcome = flow.process_turn(&mut self.context, &current, text, now).await;
        outcome.response = clean_for_speech(&outcome.response);

        if let Some(next) = &outcome.next_question {
            self.current_question = Some(next.clone());
        }
        if !outcome.should_continue {
            self.finish();
        }
        Ok(outcome)
    }

    pub fn finish(&mut self) {
        self.finished = true;
        self.current_question = None;
    }

    pub fn stats(&self, now: DateTime<Utc>) -> SessionStats {
        self.context.stats(now)
    }
}

// --- Data Structures for Tools ---

/// Arguments for submitting the candidate's answer to the current question.
#[derive(Deserialize, JsonSchema, Debug)]
pub struct SubmitResponseArgs {
    /// The candidate's answer, verbatim.
    #[schemars(description = "The candidate's answer to the current interview question")]
    pub text: String,
}

#[derive(Serialize, Debug)]
struct SessionStatus<'a> {
    agent: &'a InterviewAgent,
    stats: SessionStats,
}

// --- Service and Handler Implementation ---

/// MCP service exposing one interview as tools.
pub struct InterviewService {
    /// Shared interview state protected by an async mutex.
    pub agent_state: Arc<tokio::sync::Mutex<InterviewAgent>>,
    flow: Arc<InterviewFlow>,
    /// Optional channel for broadcasting state changes to subscribers.
    pub state_tx: Option<mpsc::Sender<InterviewAgent>>,
    tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for InterviewService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Adaptive technical interviewer. Relay each candidate answer with \
                 'submit_response' and speak the returned 'response' text."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

#[tool_router]
impl InterviewService {
    pub fn new(
        agent_state: Arc<tokio::sync::Mutex<InterviewAgent>>,
        flow: Arc<InterviewFlow>,
        state_tx: Option<mpsc::Sender<InterviewAgent>>,
    ) -> Self {
        Self {
            agent_state,
            flow,
            state_tx,
            tool_router: Self::tool_router(),
        }
    }

    async fn broadcast(&self, agent: &InterviewAgent) {
        if let Some(tx) = &self.state_tx {
            if tx.send(agent.clone()).await.is_err() {
                warn!("Failed to broadcast state update: receiver dropped.");
            }
        }
    }

    #[tool(
        description = "Get the current status of the interview: the question being asked, \
                       counters, and progress statistics."
    )]
    pub async fn get_session_status(&self) -> Result<String, String> {
        info!("Executing tool 'get_session_status'");
        let agent = self.agent_state.lock().await;
        let status = SessionStatus {
            agent: &*agent,
            stats: agent.stats(Utc::now()),
        };
        serde_json::to_string(&status).map_err(|e| format!("Failed to serialize session: {}", e))
    }

    /// Analyzes the answer, applies the adaptive policy and returns what the
    /// interviewer should say next.
    #[tool(
        description = "Submit the candidate's answer to the current question. Returns the \
                       chosen action and the interviewer's next utterance."
    )]
    pub async fn submit_response(
        &self,
        args: Parameters<SubmitResponseArgs>,
    ) -> Result<String, String> {
        info!(chars = args.0.text.len(), "Executing tool 'submit_response'");
        let mut agent = self.agent_state.lock().await;
        let outcome = agent
            .respond(&self.flow, &args.0.text, Utc::now())
            .await
            .map_err(|e| e.to_string())?;

        self.broadcast(&agent).await;

        serde_json::to_string(&outcome).map_err(|e| format!("Failed to serialize outcome: {}", e))
    }

    #[tool(description = "End the interview immediately and return the closing remark.")]
    pub async fn end_interview(&self) -> Result<String, String> {
        info!("Executing tool 'end_interview'");
        let mut agent = self.agent_state.lock().await;
        if agent.finished {
            return Ok("OK. The interview had already ended.".to_string());
        }
        agent.finish();
        self.broadcast(&agent).await;
        Ok(CLOSING_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classifier::HeuristicClassifier, policy::InterviewAction, policy::PolicyConfig};

    fn flow() -> Arc<InterviewFlow> {
        Arc::new(InterviewFlow::new(
            Arc::new(HeuristicClassifier),
            PolicyConfig::default(),
        ))
    }

    fn agent() -> InterviewAgent {
        InterviewAgent::new(
            "Ada".to_string(),
            "Rust".to_string(),
            vec![
                Question::new("q_1", "What is ownership?"),
                Question::new("q_2", "What is a lifetime?"),
            ],
            Utc::now(),
        )
    }

    const LONG_ANSWER: &str = "Ownership is Rust's system for managing memory without a \
        garbage collector. Every value has a single owner, the value is dropped when its owner \
        goes out of scope, and ownership can be moved to another binding or borrowed, either \
        immutably many times or mutably exactly once. The borrow checker verifies all of these \
        rules at compile time.";

    #[test]
    fn test_start_greets_with_first_question() {
        let mut agent = agent();
        let greeting = agent.start(Utc::now());
        assert!(greeting.starts_with("Hello Ada!"));
        assert!(greeting.ends_with("What is ownership?"));
        assert_eq!(agent.current_question.as_ref().unwrap().id, "q_1");
    }

    #[test]
    fn test_start_cleans_markdown_question() {
        let mut agent = InterviewAgent::new(
            "Ada".into(),
            "Rust".into(),
            vec![Question::new("q_1", "**Explain** `Arc<T>` (atomic refcount).")],
            Utc::now(),
        );
        assert_eq!(
            agent.start(Utc::now()),
            "Hello Ada! Welcome to your Rust interview. Let's begin. Explain Arc<T>."
        );
    }

    #[test]
    fn test_start_with_no_questions_finishes() {
        let mut agent = InterviewAgent::new("Ada".into(), "Rust".into(), vec![], Utc::now());
        assert_eq!(agent.start(Utc::now()), CLOSING_MESSAGE);
        assert!(agent.finished);
    }

    #[tokio::test]
    async fn test_respond_before_start_fails() {
        let mut agent = agent();
        let err = agent.respond(&flow(), "answer", Utc::now()).await.unwrap_err();
        assert_eq!(err, AgentError::NoCurrentQuestion);
    }

    #[tokio::test]
    async fn test_interview_runs_to_completion() {
        let flow = flow();
        let mut agent = agent();
        agent.start(Utc::now());

        let first = agent.respond(&flow, LONG_ANSWER, Utc::now()).await.unwrap();
        assert_eq!(first.action, InterviewAction::MoveToNext);
        assert_eq!(agent.current_question.as_ref().unwrap().id, "q_2");

        let last = agent.respond(&flow, LONG_ANSWER, Utc::now()).await.unwrap();
        assert_eq!(last.action, InterviewAction::EndInterview);
        assert!(agent.finished);
        assert!(agent.current_question.is_none());

        let err = agent.respond(&flow, LONG_ANSWER, Utc::now()).await.unwrap_err();
        assert_eq!(err, AgentError::Finished);
    }

    #[tokio::test]
    async fn test_empty_response_rejected() {
        let mut agent = agent();
        agent.start(Utc::now());
        let err = agent.respond(&flow(), "   ", Utc::now()).await.unwrap_err();
        assert_eq!(err, AgentError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_service_tools_broadcast_state() {
        let mut agent = agent();
        agent.start(Utc::now());
        let (tx, mut rx) = mpsc::channel(4);
        let service = InterviewService::new(
            Arc::new(tokio::sync::Mutex::new(agent)),
            flow(),
            Some(tx),
        );

        let reply = service
            .submit_response(Parameters(SubmitResponseArgs {
                text: "Not sure.".to_string(),
            }))
            .await
            .unwrap();
        let outcome: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(outcome["action"], "clarify_question");

        let broadcast = rx.recv().await.unwrap();
        assert_eq!(broadcast.context.followup_count_current_question, 1);

        assert_eq!(service.end_interview().await.unwrap(), CLOSING_MESSAGE);
        assert!(rx.recv().await.unwrap().finished);

        let status = service.get_session_status().await.unwrap();
        assert!(status.contains("\"finished\":true"));
    }
}
