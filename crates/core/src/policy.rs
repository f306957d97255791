//! Adaptive Interview Policy
//!
//! The decision table that maps a response's quality and the session's
//! pacing counters to the interviewer's next move. The table is a pure
//! function: identical inputs always yield the identical action.

use crate::analysis::ResponseQuality;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The interviewer's next move after a candidate turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InterviewAction {
    AskFollowup,
    MoveToNext,
    ProvideGuidance,
    ClarifyQuestion,
    EndInterview,
}

impl InterviewAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewAction::AskFollowup => "ask_followup",
            InterviewAction::MoveToNext => "move_to_next",
            InterviewAction::ProvideGuidance => "provide_guidance",
            InterviewAction::ClarifyQuestion => "clarify_question",
            InterviewAction::EndInterview => "end_interview",
        }
    }

    /// Which branch of the turn pipeline handles this action.
    pub fn route(&self) -> Route {
        match self {
            InterviewAction::AskFollowup
            | InterviewAction::ProvideGuidance
            | InterviewAction::ClarifyQuestion => Route::FollowUp,
            InterviewAction::MoveToNext => Route::NextQuestion,
            InterviewAction::EndInterview => Route::End,
        }
    }
}

impl fmt::Display for InterviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline branch selected by an [`InterviewAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Stay on the current question and issue a follow-up utterance.
    FollowUp,
    /// Advance to an unused question from the pool.
    NextQuestion,
    /// Close the interview.
    End,
}

/// Tunable limits of the policy.
///
/// Values from the environment or the command line should pass
/// [`PolicyConfig::validate`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Follow-ups allowed on one question before moving on is forced.
    pub max_followups_per_question: u32,
    /// Intended length of a whole interview.
    pub target_session_duration: Duration,
    /// Fraction of `target_session_duration` after which time pressure applies.
    pub time_pressure_fraction: f64,
    /// Questions that must have been asked before time pressure may end the interview.
    pub min_questions_before_end: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_followups_per_question: 2,
            target_session_duration: Duration::from_secs(1800),
            time_pressure_fraction: 0.7,
            min_questions_before_end: 8,
        }
    }
}

/// A [`PolicyConfig`] value that would make the decision table misbehave.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyConfigError {
    #[error("time pressure fraction {0} is outside 0.0..=1.0")]
    TimePressureFraction(f64),
    #[error("target session duration must be greater than zero")]
    ZeroTargetDuration,
}

impl PolicyConfig {
    /// Rejects settings under which every turn would be under time pressure.
    pub fn validate(&self) -> Result<(), PolicyConfigError> {
        if !(0.0..=1.0).contains(&self.time_pressure_fraction) {
            return Err(PolicyConfigError::TimePressureFraction(
                self.time_pressure_fraction,
            ));
        }
        if self.target_session_duration.is_zero() {
            return Err(PolicyConfigError::ZeroTargetDuration);
        }
        Ok(())
    }

    /// True once `elapsed` has passed the time-pressure threshold.
    pub fn is_time_pressure(&self, elapsed: Duration) -> bool {
        let threshold =
            self.target_session_duration.as_secs_f64() * self.time_pressure_fraction;
        elapsed.as_secs_f64() > threshold
    }

    /// True once the current question has used up its follow-ups.
    pub fn is_at_followup_limit(&self, followup_count: u32) -> bool {
        followup_count >= self.max_followups_per_question
    }
}

/// Inputs to a single evaluation of the decision table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyInputs {
    pub quality: ResponseQuality,
    pub time_pressure: bool,
    pub at_followup_limit: bool,
    pub total_questions_asked: u32,
}

/// The chosen action together with a short human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Decision {
    pub action: InterviewAction,
    pub explanation: String,
}

impl Decision {
    fn new(action: InterviewAction, explanation: &str) -> Self {
        Self {
            action,
            explanation: explanation.to_string(),
        }
    }
}

/// Evaluates the decision table.
///
/// Precedence is fixed: time pressure past the question floor ends the
/// interview; otherwise the quality bucket chooses between probing further
/// and moving on, with the follow-up limit always forcing a move.
pub fn decide(inputs: &PolicyInputs, config: &PolicyConfig) -> Decision {
    use InterviewAction::*;

    if inputs.time_pressure && inputs.total_questions_asked >= config.min_questions_before_end {
        return Decision::new(
            EndInterview,
            "Interview time limit reached. Concluding session.",
        );
    }

    let may_probe = !inputs.at_followup_limit && !inputs.time_pressure;

    match inputs.quality {
        ResponseQuality::Excellent => Decision::new(
            MoveToNext,
            "Excellent response demonstrates strong understanding. Moving to next topic.",
        ),
        ResponseQuality::Good if may_probe => Decision::new(
            AskFollowup,
            "Good response. Exploring deeper understanding with follow-up.",
        ),
        ResponseQuality::Good => Decision::new(
            MoveToNext,
            "Good response. Moving forward due to time/limit constraints.",
        ),
        ResponseQuality::Partial if may_probe => Decision::new(
            AskFollowup,
            "Partial understanding detected. Asking clarifying question.",
        ),
        ResponseQuality::Partial => Decision::new(
            MoveToNext,
            "Partial response but moving forward due to constraints.",
        ),
        ResponseQuality::Poor if !inputs.at_followup_limit => Decision::new(
            ProvideGuidance,
            "Poor understanding. Providing guidance and simpler approach.",
        ),
        ResponseQuality::Poor => Decision::new(
            MoveToNext,
            "Moving to next question after guidance attempts.",
        ),
        ResponseQuality::Incomplete if !inputs.at_followup_limit => Decision::new(
            ClarifyQuestion,
            "Response too brief. Asking for elaboration.",
        ),
        ResponseQuality::Incomplete => Decision::new(
            MoveToNext,
            "Moving forward after multiple clarification attempts.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InterviewAction::*;
    use ResponseQuality::*;

    fn inputs(quality: ResponseQuality, time_pressure: bool, at_limit: bool) -> PolicyInputs {
        PolicyInputs {
            quality,
            time_pressure,
            at_followup_limit: at_limit,
            total_questions_asked: 3,
        }
    }

    /// (quality, time_pressure, at_limit) -> expected action, below the question floor.
    const TABLE: [(ResponseQuality, bool, bool, InterviewAction); 20] = [
        (Excellent, false, false, MoveToNext),
        (Excellent, false, true, MoveToNext),
        (Excellent, true, false, MoveToNext),
        (Excellent, true, true, MoveToNext),
        (Good, false, false, AskFollowup),
        (Good, false, true, MoveToNext),
        (Good, true, false, MoveToNext),
        (Good, true, true, MoveToNext),
        (Partial, false, false, AskFollowup),
        (Partial, false, true, MoveToNext),
        (Partial, true, false, MoveToNext),
        (Partial, true, true, MoveToNext),
        (Poor, false, false, ProvideGuidance),
        (Poor, false, true, MoveToNext),
        (Poor, true, false, ProvideGuidance),
        (Poor, true, true, MoveToNext),
        (Incomplete, false, false, ClarifyQuestion),
        (Incomplete, false, true, MoveToNext),
        (Incomplete, true, false, ClarifyQuestion),
        (Incomplete, true, true, MoveToNext),
    ];

    #[test]
    fn test_full_decision_table() {
        let config = PolicyConfig::default();
        for (quality, time_pressure, at_limit, expected) in TABLE {
            let decision = decide(&inputs(quality, time_pressure, at_limit), &config);
            assert_eq!(
                decision.action, expected,
                "quality={quality} time_pressure={time_pressure} at_limit={at_limit}"
            );
        }
    }

    #[test]
    fn test_time_pressure_past_floor_ends_interview() {
        let config = PolicyConfig::default();
        for quality in ResponseQuality::ALL {
            for at_limit in [false, true] {
                let mut input = inputs(quality, true, at_limit);
                input.total_questions_asked = config.min_questions_before_end;
                assert_eq!(decide(&input, &config).action, EndInterview);
            }
        }
    }

    #[test]
    fn test_floor_without_time_pressure_does_not_end() {
        let config = PolicyConfig::default();
        let mut input = inputs(Good, false, false);
        input.total_questions_asked = 50;
        assert_eq!(decide(&input, &config).action, AskFollowup);
    }

    #[test]
    fn test_decision_is_idempotent() {
        let config = PolicyConfig::default();
        for (quality, time_pressure, at_limit, _) in TABLE {
            let input = inputs(quality, time_pressure, at_limit);
            assert_eq!(decide(&input, &config), decide(&input, &config));
        }
    }

    #[test]
    fn test_poor_at_limit_moves_on() {
        let decision = decide(&inputs(Poor, false, true), &PolicyConfig::default());
        assert_eq!(decision.action, MoveToNext);
        assert!(decision.explanation.contains("guidance attempts"));
    }

    #[test]
    fn test_routes() {
        assert_eq!(AskFollowup.route(), Route::FollowUp);
        assert_eq!(ProvideGuidance.route(), Route::FollowUp);
        assert_eq!(ClarifyQuestion.route(), Route::FollowUp);
        assert_eq!(MoveToNext.route(), Route::NextQuestion);
        assert_eq!(EndInterview.route(), Route::End);
    }

    #[test]
    fn test_time_pressure_threshold() {
        let config = PolicyConfig::default();
        assert!(!config.is_time_pressure(Duration::from_secs(1200)));
        assert!(config.is_time_pressure(Duration::from_secs(1300)));
        assert!(!config.is_at_followup_limit(1));
        assert!(config.is_at_followup_limit(2));
    }

    #[test]
    fn test_time_pressure_starts_strictly_after_threshold() {
        let config = PolicyConfig::default();
        // 0.7 * 1800 s = 1260 s
        assert!(!config.is_time_pressure(Duration::from_secs(1260)));
        assert!(config.is_time_pressure(Duration::from_secs(1261)));
    }

    #[test]
    fn test_one_below_floor_under_time_pressure_keeps_going() {
        let config = PolicyConfig::default();
        for (quality, time_pressure, at_limit, expected) in TABLE {
            let mut input = inputs(quality, time_pressure, at_limit);
            input.total_questions_asked = config.min_questions_before_end - 1;
            assert_eq!(
                decide(&input, &config).action,
                expected,
                "quality={quality} time_pressure={time_pressure} at_limit={at_limit}"
            );
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(PolicyConfig::default().validate(), Ok(()));

        let negative = PolicyConfig {
            time_pressure_fraction: -1.0,
            ..PolicyConfig::default()
        };
        assert_eq!(
            negative.validate(),
            Err(PolicyConfigError::TimePressureFraction(-1.0))
        );
        assert!(negative.is_time_pressure(Duration::ZERO));

        let too_large = PolicyConfig {
            time_pressure_fraction: 1.5,
            ..PolicyConfig::default()
        };
        assert!(too_large.validate().is_err());

        let not_a_number = PolicyConfig {
            time_pressure_fraction: f64::NAN,
            ..PolicyConfig::default()
        };
        assert!(not_a_number.validate().is_err());

        let zero_length = PolicyConfig {
            target_session_duration: Duration::ZERO,
            ..PolicyConfig::default()
        };
        assert_eq!(
            zero_length.validate(),
            Err(PolicyConfigError::ZeroTargetDuration)
        );
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(serde_json::to_string(&AskFollowup).unwrap(), "\"ask_followup\"");
        assert_eq!(AskFollowup.to_string(), "ask_followup");
        let parsed: InterviewAction = serde_json::from_str("\"end_interview\"").unwrap();
        assert_eq!(parsed, EndInterview);
    }
}
