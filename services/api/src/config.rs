use interviewer_core::{
    policy::{PolicyConfig, PolicyConfigError},
    provider::Provider,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub provider: Provider,
    pub api_key: String,
    pub chat_model: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
    pub policy: PolicyConfig,
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "groq".to_string());
        let provider = provider_str
            .parse::<Provider>()
            .map_err(|e| ConfigError::InvalidValue("LLM_PROVIDER".to_string(), e.to_string()))?;

        let api_key = std::env::var(provider.api_key_var()).map_err(|_| {
            ConfigError::MissingVar(format!(
                "{} must be set for '{}' provider",
                provider.api_key_var(),
                provider
            ))
        })?;

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| provider.default_model().to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        let defaults = PolicyConfig::default();
        let policy = PolicyConfig {
            max_followups_per_question: parse_var(
                "MAX_FOLLOWUPS_PER_QUESTION",
                defaults.max_followups_per_question,
            )?,
            target_session_duration: Duration::from_secs(parse_var(
                "TARGET_SESSION_SECS",
                defaults.target_session_duration.as_secs(),
            )?),
            time_pressure_fraction: parse_var(
                "TIME_PRESSURE_FRACTION",
                defaults.time_pressure_fraction,
            )?,
            min_questions_before_end: parse_var(
                "MIN_QUESTIONS_BEFORE_END",
                defaults.min_questions_before_end,
            )?,
        };
        policy.validate().map_err(|e| {
            let var = match e {
                PolicyConfigError::TimePressureFraction(_) => "TIME_PRESSURE_FRACTION",
                PolicyConfigError::ZeroTargetDuration => "TARGET_SESSION_SECS",
            };
            ConfigError::InvalidValue(var.to_string(), e.to_string())
        })?;

        Ok(Self {
            bind_address,
            database_url,
            provider,
            api_key,
            chat_model,
            log_level,
            prompts_path,
            policy,
        })
    }
}
