//! Response Analysis
//!
//! Types describing how well a candidate's answer addressed the current
//! question, plus the deterministic length heuristic used whenever the
//! LLM-backed classifier cannot produce a usable result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality bucket assigned to a single candidate response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseQuality {
    /// Complete, accurate, deep understanding, mentions edge cases.
    Excellent,
    /// Mostly correct, covers the main concepts.
    Good,
    /// Basic understanding with key concepts missing.
    Partial,
    /// Incorrect or a fundamental misunderstanding.
    Poor,
    /// Too brief or vague to address the question.
    Incomplete,
}

impl ResponseQuality {
    pub const ALL: [ResponseQuality; 5] = [
        ResponseQuality::Excellent,
        ResponseQuality::Good,
        ResponseQuality::Partial,
        ResponseQuality::Poor,
        ResponseQuality::Incomplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseQuality::Excellent => "excellent",
            ResponseQuality::Good => "good",
            ResponseQuality::Partial => "partial",
            ResponseQuality::Poor => "poor",
            ResponseQuality::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for ResponseQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a quality label is not one of the five known buckets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown response quality label: '{0}'")]
pub struct ParseQualityError(pub String);

impl FromStr for ResponseQuality {
    type Err = ParseQualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "excellent" => Ok(ResponseQuality::Excellent),
            "good" => Ok(ResponseQuality::Good),
            "partial" => Ok(ResponseQuality::Partial),
            "poor" => Ok(ResponseQuality::Poor),
            "incomplete" => Ok(ResponseQuality::Incomplete),
            other => Err(ParseQualityError(other.to_string())),
        }
    }
}

/// Per-turn assessment of a candidate response.
///
/// Produced by a [`ResponseClassifier`](crate::classifier::ResponseClassifier)
/// and consumed immediately by the decision table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseAnalysis {
    pub quality: ResponseQuality,
    pub confidence_score: f32,
    pub completeness: f32,
    pub technical_accuracy: f32,
    pub key_concepts_covered: Vec<String>,
    pub missing_concepts: Vec<String>,
}

impl ResponseAnalysis {
    /// Classifies a response purely by its trimmed length in characters.
    ///
    /// Used when the hosted model is unreachable or returns something that
    /// cannot be parsed.
    pub fn heuristic(response: &str) -> Self {
        let length = response.trim().chars().count();
        let (quality, completeness) = match length {
            0..20 => (ResponseQuality::Incomplete, 0.2),
            20..100 => (ResponseQuality::Partial, 0.5),
            100..300 => (ResponseQuality::Good, 0.7),
            _ => (ResponseQuality::Excellent, 0.9),
        };
        Self {
            quality,
            confidence_score: 0.6,
            completeness,
            technical_accuracy: 0.6,
            key_concepts_covered: Vec::new(),
            missing_concepts: Vec::new(),
        }
    }

    /// Extracts an analysis from free-form model output.
    ///
    /// The JSON payload is the span between the first `{` and the last `}`.
    /// Absent fields take neutral defaults; an unrecognised quality label is
    /// rejected.
    pub fn from_llm_reply(reply: &str) -> anyhow::Result<Self> {
        let start = reply
            .find('{')
            .ok_or_else(|| anyhow::anyhow!("no JSON object in model reply"))?;
        let end = reply
            .rfind('}')
            .filter(|end| *end > start)
            .ok_or_else(|| anyhow::anyhow!("unterminated JSON object in model reply"))?;

        let raw: RawAnalysis = serde_json::from_str(&reply[start..=end])?;
        let quality = match raw.quality {
            Some(label) => label.parse::<ResponseQuality>()?,
            None => ResponseQuality::Partial,
        };

        Ok(Self {
            quality,
            confidence_score: raw.confidence_score.unwrap_or(0.5),
            completeness: raw.completeness.unwrap_or(0.5),
            technical_accuracy: raw.technical_accuracy.unwrap_or(0.5),
            key_concepts_covered: raw.key_concepts_covered.unwrap_or_default(),
            missing_concepts: raw.missing_concepts.unwrap_or_default(),
        })
    }
}

/// Lenient mirror of the JSON shape requested from the model.
#[derive(Deserialize)]
struct RawAnalysis {
    quality: Option<String>,
    confidence_score: Option<f32>,
    completeness: Option<f32>,
    technical_accuracy: Option<f32>,
    key_concepts_covered: Option<Vec<String>>,
    missing_concepts: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_thresholds() {
        assert_eq!(ResponseAnalysis::heuristic("").quality, ResponseQuality::Incomplete);
        assert_eq!(
            ResponseAnalysis::heuristic(&"a".repeat(19)).quality,
            ResponseQuality::Incomplete
        );
        assert_eq!(
            ResponseAnalysis::heuristic(&"a".repeat(20)).quality,
            ResponseQuality::Partial
        );
        assert_eq!(
            ResponseAnalysis::heuristic(&"a".repeat(99)).quality,
            ResponseQuality::Partial
        );
        assert_eq!(
            ResponseAnalysis::heuristic(&"a".repeat(100)).quality,
            ResponseQuality::Good
        );
        assert_eq!(
            ResponseAnalysis::heuristic(&"a".repeat(299)).quality,
            ResponseQuality::Good
        );
        assert_eq!(
            ResponseAnalysis::heuristic(&"a".repeat(300)).quality,
            ResponseQuality::Excellent
        );
    }

    #[test]
    fn test_heuristic_ignores_surrounding_whitespace() {
        let padded = format!("   {}   \n", "a".repeat(19));
        let analysis = ResponseAnalysis::heuristic(&padded);
        assert_eq!(analysis.quality, ResponseQuality::Incomplete);
        assert_eq!(analysis.completeness, 0.2);
        assert_eq!(analysis.confidence_score, 0.6);
        assert!(analysis.missing_concepts.is_empty());
    }

    #[test]
    fn test_from_llm_reply_with_surrounding_prose() {
        let reply = r#"Here is my assessment:
        {
            "quality": "good",
            "confidence_score": 0.8,
            "completeness": 0.7,
            "technical_accuracy": 0.9,
            "key_concepts_covered": ["LIFO", "FIFO"],
            "missing_concepts": ["complexity"]
        }
        Hope this helps."#;

        let analysis = ResponseAnalysis::from_llm_reply(reply).unwrap();
        assert_eq!(analysis.quality, ResponseQuality::Good);
        assert_eq!(analysis.confidence_score, 0.8);
        assert_eq!(analysis.key_concepts_covered, vec!["LIFO", "FIFO"]);
        assert_eq!(analysis.missing_concepts, vec!["complexity"]);
    }

    #[test]
    fn test_from_llm_reply_defaults_missing_fields() {
        let analysis = ResponseAnalysis::from_llm_reply("{}").unwrap();
        assert_eq!(analysis.quality, ResponseQuality::Partial);
        assert_eq!(analysis.completeness, 0.5);
        assert!(analysis.key_concepts_covered.is_empty());
    }

    #[test]
    fn test_from_llm_reply_rejects_bad_input() {
        assert!(ResponseAnalysis::from_llm_reply("no json here").is_err());
        assert!(ResponseAnalysis::from_llm_reply("} backwards {").is_err());
        assert!(ResponseAnalysis::from_llm_reply(r#"{"quality": "stellar"}"#).is_err());
    }

    #[test]
    fn test_quality_parse_and_display() {
        for quality in ResponseQuality::ALL {
            assert_eq!(quality.to_string().parse::<ResponseQuality>(), Ok(quality));
        }
        assert_eq!(" EXCELLENT ".parse::<ResponseQuality>(), Ok(ResponseQuality::Excellent));
        assert_eq!(
            serde_json::to_string(&ResponseQuality::Incomplete).unwrap(),
            "\"incomplete\""
        );
    }
}
