//! Stdio MCP server running a single adaptive interview.
//!
//! An MCP client (a voice agent, an IDE assistant, a test harness) relays the
//! candidate's answers through the `submit_response` tool and speaks the
//! interviewer's replies. Logs go to stderr so stdout stays a clean transport.

use chrono::Utc;
use clap::Parser;
use interviewer_core::{
    agent::{InterviewAgent, InterviewService},
    classifier::{HeuristicClassifier, LLMResponseClassifier, ResponseClassifier},
    flow::InterviewFlow,
    policy::{PolicyConfig, PolicyConfigError},
    provider::{Provider, load_prompts},
    question::load_questions_from_file,
};
use rmcp::{ServiceExt, transport::stdio};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments for the interviewer MCP server
#[derive(Parser, Debug)]
#[command(name = "interviewer-mcp")]
#[command(version, about = "Adaptive technical interviewer served over MCP stdio")]
struct Cli {
    /// Markdown file holding the interview questions
    #[arg(short, long, env = "QUESTIONS_FILE", value_name = "PATH")]
    questions: PathBuf,

    /// Name used to greet the candidate
    #[arg(short, long, env = "CANDIDATE_NAME", default_value = "Candidate")]
    candidate: String,

    /// Interview topic mentioned in the greeting
    #[arg(short, long, env = "INTERVIEW_TOPIC", default_value = "technical")]
    topic: String,

    /// Chat completion backend used to grade answers
    #[arg(long, env = "LLM_PROVIDER", default_value = "groq")]
    provider: Provider,

    /// Chat model; defaults to the provider's model
    #[arg(long, env = "CHAT_MODEL")]
    model: Option<String>,

    /// Directory of `*.md` prompt templates
    #[arg(long, env = "PROMPTS_PATH", default_value = "./prompts")]
    prompts: PathBuf,

    /// Grade answers by length only, without calling a model
    #[arg(long)]
    heuristic: bool,

    #[arg(long, env = "MAX_FOLLOWUPS_PER_QUESTION", default_value_t = 2)]
    max_followups: u32,

    #[arg(long, env = "TARGET_SESSION_SECS", default_value_t = 1800)]
    target_secs: u64,

    #[arg(long, env = "TIME_PRESSURE_FRACTION", default_value_t = 0.7)]
    time_pressure_fraction: f64,

    #[arg(long, env = "MIN_QUESTIONS_BEFORE_END", default_value_t = 8)]
    min_questions: u32,
}

impl Cli {
    fn policy(&self) -> Result<PolicyConfig, PolicyConfigError> {
        let policy = PolicyConfig {
            max_followups_per_question: self.max_followups,
            target_session_duration: Duration::from_secs(self.target_secs),
            time_pressure_fraction: self.time_pressure_fraction,
            min_questions_before_end: self.min_questions,
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Picks the LLM classifier when a key is available, else the length heuristic.
fn build_classifier(cli: &Cli) -> anyhow::Result<Arc<dyn ResponseClassifier>> {
    if cli.heuristic {
        info!("Grading answers with the length heuristic.");
        return Ok(Arc::new(HeuristicClassifier));
    }
    let Ok(api_key) = std::env::var(cli.provider.api_key_var()) else {
        warn!(
            "{} is not set; grading answers with the length heuristic.",
            cli.provider.api_key_var()
        );
        return Ok(Arc::new(HeuristicClassifier));
    };

    let model = cli
        .model
        .clone()
        .unwrap_or_else(|| cli.provider.default_model().to_string());
    info!(provider = %cli.provider, %model, "Grading answers with LLM.");
    let config = cli.provider.openai_config(&api_key);
    let prompts = load_prompts(&cli.prompts)?;
    Ok(Arc::new(LLMResponseClassifier::new(config, model, &prompts)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let policy = cli.policy()?;
    let questions = load_questions_from_file(&cli.questions)?;
    let flow = Arc::new(InterviewFlow::new(build_classifier(&cli)?, policy));

    let now = Utc::now();
    let mut agent = InterviewAgent::new(cli.candidate.clone(), cli.topic.clone(), questions, now);
    let greeting = agent.start(now);
    info!(%greeting, "Interview started.");

    let (state_tx, mut state_rx) = mpsc::channel::<InterviewAgent>(8);
    tokio::spawn(async move {
        while let Some(state) = state_rx.recv().await {
            let stats = state.stats(Utc::now());
            info!(
                asked = stats.total_questions,
                remaining = stats.questions_remaining,
                followups = stats.current_followups,
                finished = state.finished,
                "Interview state updated."
            );
        }
    });

    let service = InterviewService::new(Arc::new(Mutex::new(agent)), flow, Some(state_tx))
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("Failed to start MCP server: {:?}", e))?;
    service.waiting().await?;

    info!("MCP client disconnected. Exiting.");
    Ok(())
}
