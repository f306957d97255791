//! OpenAI-compatible chat backends and the prompt templates sent to them.
//!
//! Shared by the REST service and the stdio MCP server so both resolve
//! provider names, keys and endpoints the same way.

use anyhow::{Context, Result};
use async_openai::config::OpenAIConfig;
use std::{collections::HashMap, fmt, fs, path::Path, str::FromStr};

/// The chat completion backends the interviewer can grade answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Groq,
    Gemini,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not one of openai, groq, gemini")]
pub struct ParseProviderError(String);

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "groq" => Ok(Provider::Groq),
            "gemini" => Ok(Provider::Gemini),
            other => Err(ParseProviderError(other.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::OpenAI => "openai",
            Provider::Groq => "groq",
            Provider::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

impl Provider {
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4o",
            Provider::Groq => "llama-3.1-8b-instant",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }

    /// Client configuration pointing at this provider's endpoint.
    pub fn openai_config(&self, api_key: &str) -> OpenAIConfig {
        OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(self.api_base())
    }
}

/// Loads every `*.md` prompt in a directory, keyed by file stem.
pub fn load_prompts(prompts_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    let entries = fs::read_dir(prompts_path)
        .with_context(|| format!("Failed to read prompts from {}", prompts_path.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing_ignores_case() {
        assert_eq!("groq".parse::<Provider>(), Ok(Provider::Groq));
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAI));
        assert_eq!(" GEMINI ".parse::<Provider>(), Ok(Provider::Gemini));
        let err = "anthropic-local".parse::<Provider>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "'anthropic-local' is not one of openai, groq, gemini"
        );
    }

    #[test]
    fn test_provider_endpoints() {
        assert_eq!(Provider::Groq.api_base(), "https://api.groq.com/openai/v1");
        assert_eq!(Provider::OpenAI.api_key_var(), "OPENAI_API_KEY");
        assert_eq!(Provider::Gemini.api_key_var(), "GEMINI_API_KEY");
        assert_eq!(Provider::Groq.default_model(), "llama-3.1-8b-instant");
        assert_eq!(Provider::Gemini.to_string(), "gemini");
    }

    #[test]
    fn test_load_prompts_keys_markdown_by_stem() {
        let prompts = load_prompts(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../../prompts")))
            .unwrap();
        assert!(prompts.contains_key("analyze_response"));
        assert!(prompts.contains_key("generate_questions"));
        assert!(prompts["analyze_response"].contains("{response}"));
    }

    #[test]
    fn test_load_prompts_missing_dir_is_error() {
        let err = load_prompts(Path::new("/nonexistent/prompts")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/prompts"));
    }
}
