//! Interview Questions
//!
//! The question model and the markdown format question banks are written in.
//! Headers pick the category, `**Difficulty:` lines the difficulty, and
//! italic `*Keywords:`, `*Time:` and `*Follow-up:` lines attach metadata to
//! the question above them.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Introduction,
    #[default]
    Technical,
    Coding,
    SystemDesign,
    Behavioral,
    Closing,
}

impl QuestionCategory {
    /// Maps a markdown section header onto a category by keyword.
    fn from_header(header: &str) -> Self {
        let header = header.to_lowercase();
        let has = |needle: &str| header.contains(needle);
        if has("intro") {
            QuestionCategory::Introduction
        } else if has("coding") || has("algorithm") {
            QuestionCategory::Coding
        } else if has("system") || has("design") {
            QuestionCategory::SystemDesign
        } else if has("behavioral") || has("behaviour") {
            QuestionCategory::Behavioral
        } else if has("closing") || has("conclusion") {
            QuestionCategory::Closing
        } else {
            QuestionCategory::Technical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::Introduction => "introduction",
            QuestionCategory::Technical => "technical",
            QuestionCategory::Coding => "coding",
            QuestionCategory::SystemDesign => "system_design",
            QuestionCategory::Behavioral => "behavioral",
            QuestionCategory::Closing => "closing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    fn from_marker(line: &str) -> Self {
        let line = line.to_lowercase();
        if line.contains("easy") {
            Difficulty::Easy
        } else if line.contains("hard") {
            Difficulty::Hard
        } else {
            Difficulty::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// A single interview question from the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub category: QuestionCategory,
    pub difficulty: Difficulty,
    pub expected_keywords: Vec<String>,
    pub time_limit_minutes: Option<u32>,
    pub follow_up_template: Option<String>,
}

impl Question {
    /// Creates a plain technical question of medium difficulty.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            category: QuestionCategory::default(),
            difficulty: Difficulty::default(),
            expected_keywords: Vec::new(),
            time_limit_minutes: None,
            follow_up_template: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error("Failed to read question file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Question file {0} contains no questions")]
    Empty(String),
}

static QUESTION_MARKERS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        r"^\*\*Q\d+[):.]?\*\*",
        r"^Q\d+[):.]?",
        r"^-\s*",
        r"^\*\*",
        r"\*\*$",
    ]
    .map(|pattern| Regex::new(pattern).expect("static question marker pattern"))
});

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("static number pattern"));

/// Strips a case-insensitive `*Label:` prefix.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let prefix = line.get(..label.len())?;
    prefix
        .eq_ignore_ascii_case(label)
        .then(|| line[label.len()..].trim())
}

fn question_text(line: &str) -> String {
    QUESTION_MARKERS
        .iter()
        .fold(line.to_string(), |text, marker| marker.replace(&text, "").into_owned())
        .trim()
        .to_string()
}

/// Parses an interview question set written in markdown.
///
/// Section headers set the category of the questions that follow, and
/// `**Difficulty:` lines set their difficulty. A question starts on a line
/// beginning with `**Q`, `Q` or `-`; subsequent plain lines extend its text,
/// and `*Keywords:`, `*Time:` and `*Follow-up:` lines attach metadata.
pub fn parse_markdown(markdown: &str) -> Vec<Question> {
    let mut questions = Vec::new();
    let mut category = QuestionCategory::default();
    let mut difficulty = Difficulty::default();
    let mut current: Option<Question> = None;
    let mut next_id = 1;

    let flush = |current: &mut Option<Question>, questions: &mut Vec<Question>| {
        if let Some(mut question) = current.take() {
            question.text = question.text.trim().to_string();
            if !question.text.is_empty() {
                questions.push(question);
            }
        }
    };

    for line in markdown.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("# ") || line.starts_with("## ") {
            category = QuestionCategory::from_header(line.trim_start_matches('#'));
        } else if line.starts_with("**Difficulty:") {
            difficulty = Difficulty::from_marker(line);
        } else if line.starts_with("**Q") || line.starts_with('Q') || line.starts_with('-') {
            flush(&mut current, &mut questions);
            let mut question = Question::new(format!("q_{next_id}"), question_text(line));
            question.category = category;
            question.difficulty = difficulty;
            current = Some(question);
            next_id += 1;
        } else if let Some(question) = current.as_mut() {
            if let Some(rest) =
                strip_label(line, "*Keywords:").or_else(|| strip_label(line, "*Keyword:"))
            {
                question.expected_keywords = split_keywords(rest);
            } else if let Some(rest) = strip_label(line, "*Expected:") {
                question.expected_keywords = split_keywords(rest);
            } else if line.starts_with("*Time:") || line.starts_with("*Duration:") {
                question.time_limit_minutes = FIRST_NUMBER
                    .find(line)
                    .and_then(|m| m.as_str().parse().ok());
            } else if let Some(rest) = strip_label(line, "*Follow-up:") {
                question.follow_up_template = Some(rest.to_string());
            } else if !question.text.is_empty() {
                question.text.push(' ');
                question.text.push_str(line);
            }
        }
    }
    flush(&mut current, &mut questions);

    questions
}

fn split_keywords(list: &str) -> Vec<String> {
    list.split(',')
        .map(|k| k.trim().trim_end_matches('*').trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads and parses a markdown question file.
pub fn load_questions_from_file(path: &Path) -> Result<Vec<Question>, QuestionError> {
    let content = std::fs::read_to_string(path).map_err(|source| QuestionError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let questions = parse_markdown(&content);
    if questions.is_empty() {
        return Err(QuestionError::Empty(path.display().to_string()));
    }
    tracing::info!(count = questions.len(), path = %path.display(), "Loaded interview questions");
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Introduction

**Q1:** Tell me about yourself.

## Data Structures
**Difficulty: Hard**

**Q2)** Explain the difference between a stack
and a queue.
*Keywords: LIFO, FIFO, push, pop
*Time: 5 minutes
*Follow-up: Where would you use each one?

- How does a hash map handle collisions?
*Expected: chaining, open addressing

## System Design
**Difficulty: Easy**
Q3. Design a URL shortener.

## Closing
- Do you have any questions for us?
"#;

    #[test]
    fn test_parse_markdown_questions() {
        let questions = parse_markdown(SAMPLE);
        assert_eq!(questions.len(), 5);

        assert_eq!(questions[0].id, "q_1");
        assert_eq!(questions[0].text, "Tell me about yourself.");
        assert_eq!(questions[0].category, QuestionCategory::Introduction);
        assert_eq!(questions[0].difficulty, Difficulty::Medium);

        let stack = &questions[1];
        assert_eq!(stack.text, "Explain the difference between a stack and a queue.");
        assert_eq!(stack.category, QuestionCategory::Technical);
        assert_eq!(stack.difficulty, Difficulty::Hard);
        assert_eq!(stack.expected_keywords, vec!["LIFO", "FIFO", "push", "pop"]);
        assert_eq!(stack.time_limit_minutes, Some(5));
        assert_eq!(
            stack.follow_up_template.as_deref(),
            Some("Where would you use each one?")
        );

        assert_eq!(questions[2].text, "How does a hash map handle collisions?");
        assert_eq!(questions[2].expected_keywords, vec!["chaining", "open addressing"]);

        assert_eq!(questions[3].text, "Design a URL shortener.");
        assert_eq!(questions[3].category, QuestionCategory::SystemDesign);
        assert_eq!(questions[3].difficulty, Difficulty::Easy);

        assert_eq!(questions[4].category, QuestionCategory::Closing);
        assert_eq!(questions[4].id, "q_5");
    }

    #[test]
    fn test_parse_markdown_empty() {
        assert!(parse_markdown("").is_empty());
        assert!(parse_markdown("# Only a header\nSome prose without markers.").is_empty());
    }

    #[test]
    fn test_category_from_header() {
        assert_eq!(QuestionCategory::from_header(" Coding Round"), QuestionCategory::Coding);
        assert_eq!(QuestionCategory::from_header("Behaviour"), QuestionCategory::Behavioral);
        assert_eq!(QuestionCategory::from_header("Wrap-up conclusion"), QuestionCategory::Closing);
        assert_eq!(QuestionCategory::from_header("Databases"), QuestionCategory::Technical);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_questions_from_file(Path::new("/nonexistent/questions.md")).unwrap_err();
        assert!(matches!(err, QuestionError::Io { .. }));
    }
}
