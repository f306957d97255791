//! Interview Session Context
//!
//! The per-interview counters the decision table reads and the flow mutates
//! after every candidate turn. Time is always passed in explicitly so the
//! counters stay deterministic under test.

use crate::policy::{PolicyConfig, PolicyInputs};
use crate::{analysis::ResponseQuality, question::Question};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters and question pool for one interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Main questions asked so far, the opening question included.
    /// Follow-ups do not count.
    pub total_questions_asked: u32,
    /// Follow-ups asked on the current question. Reset when a new question
    /// is asked.
    pub followup_count_current_question: u32,
    pub session_start_time: DateTime<Utc>,
    /// When the current question was first asked.
    pub question_start_time: DateTime<Utc>,
    /// Texts of questions already put to the candidate, in the order asked.
    pub questions_used: Vec<String>,
    /// The whole pool, asked or not. Never shrinks.
    pub available_questions: Vec<Question>,
}

/// Snapshot of interview progress for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionStats {
    pub total_questions: u32,
    pub elapsed_time_minutes: f64,
    pub questions_remaining: usize,
    pub current_followups: u32,
}

impl SessionContext {
    pub fn new(available_questions: Vec<Question>, now: DateTime<Utc>) -> Self {
        Self {
            total_questions_asked: 0,
            followup_count_current_question: 0,
            session_start_time: now,
            question_start_time: now,
            questions_used: Vec::new(),
            available_questions,
        }
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.session_start_time).to_std().unwrap_or_default()
    }

    pub fn is_used(&self, question: &Question) -> bool {
        self.questions_used.iter().any(|used| *used == question.text)
    }

    /// Questions from the pool that have not been asked yet, in pool order.
    pub fn unused_questions(&self) -> impl Iterator<Item = &Question> {
        self.available_questions.iter().filter(|q| !self.is_used(q))
    }

    /// Builds the decision-table inputs for a response of the given quality.
    pub fn policy_inputs(
        &self,
        quality: ResponseQuality,
        config: &PolicyConfig,
        now: DateTime<Utc>,
    ) -> PolicyInputs {
        PolicyInputs {
            quality,
            time_pressure: config.is_time_pressure(self.elapsed(now)),
            at_followup_limit: config.is_at_followup_limit(self.followup_count_current_question),
            total_questions_asked: self.total_questions_asked,
        }
    }

    pub fn record_followup(&mut self) {
        self.followup_count_current_question += 1;
    }

    /// Marks `question` as asked and resets the per-question counters.
    pub fn begin_question(&mut self, question: &Question, now: DateTime<Utc>) {
        if !self.is_used(question) {
            self.questions_used.push(question.text.clone());
        }
        self.total_questions_asked += 1;
        self.followup_count_current_question = 0;
        self.question_start_time = now;
    }

    pub fn stats(&self, now: DateTime<Utc>) -> SessionStats {
        SessionStats {
            total_questions: self.total_questions_asked,
            elapsed_time_minutes: self.elapsed(now).as_secs_f64() / 60.0,
            questions_remaining: self.unused_questions().count(),
            current_followups: self.followup_count_current_question,
        }
    }
}
