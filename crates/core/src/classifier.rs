//! Grading of candidate answers into quality buckets.
//!
//! The LLM classifier asks an OpenAI-compatible model for a JSON verdict.
//! When the call or the parse fails, [`analyze_or_fallback`] grades the
//! answer by length instead so a turn never fails on the model.

use crate::analysis::ResponseAnalysis;
use crate::question::Question;
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Everything the classifier needs to judge one candidate turn.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub question: String,
    pub category: String,
    pub difficulty: String,
    pub response: String,
}

impl AnalysisRequest {
    pub fn new(question: &Question, response: &str) -> Self {
        Self {
            question: question.text.clone(),
            category: question.category.as_str().to_string(),
            difficulty: question.difficulty.as_str().to_string(),
            response: response.to_string(),
        }
    }
}

/// Assigns a quality bucket to a candidate response.
#[async_trait]
pub trait ResponseClassifier: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<ResponseAnalysis>;
}

/// Runs `classifier`, degrading to the length heuristic on any failure.
pub async fn analyze_or_fallback(
    classifier: &dyn ResponseClassifier,
    request: &AnalysisRequest,
) -> ResponseAnalysis {
    match classifier.analyze(request).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(error = ?e, "Response analysis failed; using length heuristic");
            ResponseAnalysis::heuristic(&request.response)
        }
    }
}

/// A `ResponseClassifier` backed by any OpenAI-compatible chat completions API.
pub struct LLMResponseClassifier {
    client: Client<OpenAIConfig>,
    model: String,
    prompt_template: String,
}

impl LLMResponseClassifier {
    /// Creates a classifier for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - API key and base URL of the provider (OpenAI, Groq, Gemini).
    /// * `model` - Chat model identifier (e.g., "llama-3.1-8b-instant").
    /// * `prompts` - Prompt templates; must contain `"analyze_response"`.
    pub fn new(
        config: OpenAIConfig,
        model: String,
        prompts: &HashMap<String, String>,
    ) -> Result<Self> {
        let prompt_template = prompts
            .get("analyze_response")
            .context("Missing prompt template: 'analyze_response'")?
            .clone();
        Ok(Self {
            client: Client::with_config(config),
            model,
            prompt_template,
        })
    }

    fn render_prompt(&self, request: &AnalysisRequest) -> String {
        self.prompt_template
            .replace("{question}", &request.question)
            .replace("{category}", &request.category)
            .replace("{difficulty}", &request.difficulty)
            .replace("{response}", &request.response)
    }
}

#[async_trait]
impl ResponseClassifier for LLMResponseClassifier {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<ResponseAnalysis> {
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestUserMessageArgs::default()
                    .content(self.render_prompt(request))
                    .build()?
                    .into(),
            ])
            .temperature(0.2)
            .max_completion_tokens(512u32)
            .build()?;

        let response = self.client.chat().create(chat_request).await?;

        let reply = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .as_ref()
            .context("No content in LLM response")?;
        debug!(reply = %reply, "Classifier reply received");

        ResponseAnalysis::from_llm_reply(reply)
    }
}

/// A `ResponseClassifier` that only applies the length heuristic.
///
/// Useful offline and in tests, where no model endpoint is available.
pub struct HeuristicClassifier;

#[async_trait]
impl ResponseClassifier for HeuristicClassifier {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<ResponseAnalysis> {
        Ok(ResponseAnalysis::heuristic(&request.response))
    }
}
