//! Question Generation Service
//!
//! Produces a pool of interview questions for a topic when no question set
//! was supplied with the interview.

use crate::question::Question;
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Defines the contract for any service that can generate interview questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Generates an ordered list of questions for the given topic.
    async fn generate_questions(&self, topic: &str) -> Result<Vec<Question>>;
}

/// A `QuestionGenerator` that asks an OpenAI-compatible model.
pub struct LLMQuestionGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    prompts: HashMap<String, String>,
}

impl LLMQuestionGenerator {
    /// # Arguments
    ///
    /// * `config` - API configuration (API key, base URL, etc.).
    /// * `model` - Model identifier to use for generation.
    /// * `prompts` - Prompt templates, which must include `"generate_questions"`.
    pub fn new(config: OpenAIConfig, model: String, prompts: HashMap<String, String>) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            prompts,
        }
    }
}

/// Pulls the items out of a numbered list such as `1. ...` or `2) ...`.
pub(crate) fn parse_numbered_list(answer: &str) -> Vec<String> {
    answer
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let idx = line.find(['.', ')'])?;
            if idx == 0 || !line[..idx].chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let item = line[idx + 1..].trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .collect()
}

#[async_trait]
impl QuestionGenerator for LLMQuestionGenerator {
    async fn generate_questions(&self, topic: &str) -> Result<Vec<Question>> {
        let prompt_template = self
            .prompts
            .get("generate_questions")
            .context("Missing prompt template: 'generate_questions'")?;
        let prompt = prompt_template.replace("{topic}", topic);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content("You are an experienced technical interviewer preparing questions.")
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let answer = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .as_ref()
            .context("No content in LLM response")?;

        let questions: Vec<Question> = parse_numbered_list(answer)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Question::new(format!("q_{}", i + 1), text))
            .collect();

        anyhow::ensure!(!questions.is_empty(), "LLM returned no questions for '{topic}'");
        Ok(questions)
    }
}

/// A deterministic `QuestionGenerator` for development and tests.
pub struct MockQuestionGenerator;

#[async_trait]
impl QuestionGenerator for MockQuestionGenerator {
    async fn generate_questions(&self, topic: &str) -> Result<Vec<Question>> {
        Ok(vec![
            Question::new("q_1", format!("What drew you to working with {topic}?")),
            Question::new("q_2", format!("Explain the core concepts of {topic}.")),
            Question::new("q_3", format!("Describe a hard problem you solved using {topic}.")),
            Question::new("q_4", format!("What are the common pitfalls of {topic}?")),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbered_list() {
        let answer = "Here are some questions:\n1. What is Rust?\n2) Explain ownership.\n\n\
                      3.   \nNotes. Not a question\n10. What is a trait?";
        assert_eq!(
            parse_numbered_list(answer),
            vec!["What is Rust?", "Explain ownership.", "What is a trait?"]
        );
    }

    #[tokio::test]
    async fn test_mock_generator() {
        let questions = MockQuestionGenerator.generate_questions("Kafka").await.unwrap();
        assert_eq!(questions.len(), 4);
        assert_eq!(questions[1].id, "q_2");
        assert!(questions[1].text.contains("Kafka"));
    }
}
