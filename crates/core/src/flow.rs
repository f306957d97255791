//! Interview Flow
//!
//! Drives one candidate turn through the adaptive policy:
//!
//! 1. Analyze the response (LLM classifier, heuristic fallback).
//! 2. Evaluate the decision table against the session counters.
//! 3. Route to a follow-up, the next question, or the end of the interview.
//! 4. Produce the interviewer's next utterance and update the counters.

use crate::{
    analysis::ResponseAnalysis,
    classifier::{AnalysisRequest, ResponseClassifier, analyze_or_fallback},
    policy::{self, Decision, InterviewAction, PolicyConfig, Route},
    question::{Question, QuestionCategory},
    session::SessionContext,
};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Said when the interview ends, whatever the reason.
pub const CLOSING_MESSAGE: &str = "Thank you for your time today. That concludes our technical \
     interview. We'll be in touch soon!";
/// Hint given after a poor answer while follow-ups remain.
pub const GUIDANCE_MESSAGE: &str = "Let me give you a hint: think about the core problem step by \
     step. What would be your first step in solving this?";
const GENERIC_FOLLOWUP: &str =
    "Can you walk me through your reasoning for that approach in more detail?";
const POOL_EXHAUSTED: &str = "No more questions available. Ending interview.";

/// Result of processing one candidate turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TurnOutcome {
    /// The action the decision table chose.
    pub action: InterviewAction,
    /// What the interviewer says next.
    pub response: String,
    /// False once the interview has ended.
    pub should_continue: bool,
    /// Why the action was chosen, for logs and reviewers.
    pub explanation: String,
    /// The classifier's judgement of the answer.
    pub analysis: ResponseAnalysis,
    /// The question now being asked, when the turn advanced to a new one.
    pub next_question: Option<Question>,
}

/// A response classifier paired with the policy limits it is judged against.
///
/// Holds no per-interview state; one flow serves every interview, and the
/// counters live in the [`SessionContext`] passed to each call.
pub struct InterviewFlow {
    classifier: Arc<dyn ResponseClassifier>,
    config: PolicyConfig,
}

impl InterviewFlow {
    pub fn new(classifier: Arc<dyn ResponseClassifier>, config: PolicyConfig) -> Self {
        Self { classifier, config }
    }

    /// Picks the opening question and marks it as asked.
    ///
    /// Introduction and technical questions are preferred; otherwise the
    /// first question of the pool is used.
    pub fn open(ctx: &mut SessionContext, now: DateTime<Utc>) -> Option<Question> {
        let question = ctx
            .unused_questions()
            .find(|q| {
                matches!(
                    q.category,
                    QuestionCategory::Introduction | QuestionCategory::Technical
                )
            })
            .or_else(|| ctx.unused_questions().next())
            .cloned()?;
        ctx.begin_question(&question, now);
        Some(question)
    }

    /// Processes the candidate's answer to `current`.
    pub async fn process_turn(
        &self,
        ctx: &mut SessionContext,
        current: &Question,
        response: &str,
        now: DateTime<Utc>,
    ) -> TurnOutcome {
        let request = AnalysisRequest::new(current, response);
        let analysis = analyze_or_fallback(self.classifier.as_ref(), &request).await;
        info!(
            question_id = %current.id,
            quality = %analysis.quality,
            confidence = analysis.confidence_score,
            "Response analyzed"
        );
        apply_analysis(ctx, current, analysis, &self.config, now)
    }
}

/// Applies an analysis to the session: decides, routes, and updates counters.
pub fn apply_analysis(
    ctx: &mut SessionContext,
    current: &Question,
    analysis: ResponseAnalysis,
    config: &PolicyConfig,
    now: DateTime<Utc>,
) -> TurnOutcome {
    let inputs = ctx.policy_inputs(analysis.quality, config, now);
    let Decision {
        mut action,
        mut explanation,
    } = policy::decide(&inputs, config);
    info!(%action, %explanation, "Policy decision");

    let mut next_question = None;
    let response = match action.route() {
        Route::FollowUp => {
            ctx.record_followup();
            followup_utterance(action, current, &analysis)
        }
        Route::NextQuestion => match select_next_question(ctx, current) {
            Some(question) => {
                ctx.begin_question(&question, now);
                let text = question.text.clone();
                next_question = Some(question);
                text
            }
            None => {
                action = InterviewAction::EndInterview;
                explanation = POOL_EXHAUSTED.to_string();
                CLOSING_MESSAGE.to_string()
            }
        },
        Route::End => CLOSING_MESSAGE.to_string(),
    };

    TurnOutcome {
        should_continue: action != InterviewAction::EndInterview,
        action,
        response,
        explanation,
        analysis,
        next_question,
    }
}

/// The first unused question in pool order, never the current one.
fn select_next_question(ctx: &SessionContext, current: &Question) -> Option<Question> {
    ctx.unused_questions()
        .find(|q| q.text != current.text)
        .cloned()
}

fn followup_utterance(
    action: InterviewAction,
    current: &Question,
    analysis: &ResponseAnalysis,
) -> String {
    match action {
        InterviewAction::AskFollowup => match analysis.missing_concepts.first() {
            Some(concept) => format!(
                "You mentioned some good points. How would you handle {concept} in this scenario?"
            ),
            None => current
                .follow_up_template
                .clone()
                .unwrap_or_else(|| GENERIC_FOLLOWUP.to_string()),
        },
        InterviewAction::ProvideGuidance => GUIDANCE_MESSAGE.to_string(),
        InterviewAction::ClarifyQuestion => {
            format!("Could you elaborate more on your approach to: {}", current.text)
        }
        InterviewAction::MoveToNext | InterviewAction::EndInterview => {
            "Could you explain your thinking process a bit more?".to_string()
        }
    }
}
