use std::sync::Arc;

use tracing::info;

use mentor_agent::provider::{CompletionRequest, LlmProvider, ProviderError};
use mentor_core::{Clock, Sink, SystemClock};
use mentor_scheduler::{JobContext, Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mentor=info".into()),
        )
        .init();

    // load config: explicit path > MENTOR_CONFIG env > ~/.mentor/mentor.toml
    let config_path = std::env::var("MENTOR_CONFIG").ok();
    let config =
        mentor_core::config::MentorConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            mentor_core::config::MentorConfig::default()
        });

    // open the store — WAL mode, idempotent migrations
    let db_path = &config.store.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    let store = Arc::new(mentor_store::Store::open(db_path)?);

    // outbound sink — the bot is useless without a transport token
    let telegram = config
        .telegram
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no telegram.bot_token configured"))?;
    let sink: Arc<dyn Sink> = Arc::new(mentor_telegram::TelegramSink::new(&telegram.bot_token));

    // LLM provider from config, env fallbacks, or the null placeholder
    let provider = build_provider(&config);
    let llm = Arc::new(mentor_agent::Llm::new(provider, config.providers.model.clone()));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let default_tz = mentor_core::tz::resolve(Some(&config.scheduler.default_timezone));

    let scheduler = Scheduler::new(JobContext {
        store,
        sink,
        llm,
        clock,
        default_tz,
        default_reminder_hour: config.scheduler.default_reminder_hour,
    });

    // run the engine until ctrl-c flips the shutdown flag
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    info!("mentor daemon running — ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    engine.await?;

    Ok(())
}

/// Pick the LLM provider: config slots first, then env vars, then the null
/// placeholder (handlers fall back to deterministic templates).
fn build_provider(config: &mentor_core::config::MentorConfig) -> Box<dyn LlmProvider> {
    if let Some(ref anthropic) = config.providers.anthropic {
        info!("LLM provider: Anthropic ({})", anthropic.base_url);
        return Box::new(mentor_agent::anthropic::AnthropicProvider::new(
            anthropic.api_key.clone(),
            Some(anthropic.base_url.clone()),
        ));
    }
    if let Some(ref openai) = config.providers.openai {
        info!("LLM provider: OpenAI ({})", openai.base_url);
        return Box::new(mentor_agent::openai::OpenAiProvider::new(
            openai.api_key.clone(),
            Some(openai.base_url.clone()),
        ));
    }
    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        info!("LLM provider: Anthropic (from env)");
        return Box::new(mentor_agent::anthropic::AnthropicProvider::new(key, None));
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        info!("LLM provider: OpenAI (from env)");
        return Box::new(mentor_agent::openai::OpenAiProvider::new(key, None));
    }

    tracing::warn!("No LLM provider configured — dynamic content will use fallbacks");
    Box::new(NullProvider)
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

/// Placeholder provider when no API key is available.
struct NullProvider;

#[async_trait::async_trait]
impl LlmProvider for NullProvider {
    fn name(&self) -> &str {
        "null"
    }
    async fn complete(&self, _req: &CompletionRequest) -> Result<String, ProviderError> {
        Err(ProviderError::Unavailable(
            "no LLM provider configured — set providers.anthropic.api_key in mentor.toml".into(),
        ))
    }
}
