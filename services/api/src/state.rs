//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like database pools and service clients.

use interviewer_core::{flow::InterviewFlow, generator::QuestionGenerator};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<crate::db::Db>,
    /// Classifier plus adaptive policy, shared by every interview.
    pub flow: Arc<InterviewFlow>,
    pub question_generator: Arc<dyn QuestionGenerator>,
}
