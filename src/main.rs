//! Prizm agent - interactive conversational agent
//!
//! Runs one conversation on the terminal, either as a personal productivity
//! assistant or as a vendor-intake coordinator, against a live model or an
//! offline scripted one.

mod config;
mod llm;
mod prompts;
mod runtime;
mod state_machine;

use anyhow::Context;
use clap::Parser;
use config::AgentConfig;
use llm::{LlmConfig, LlmService, ScriptedModel};
use runtime::{
    initial_state, ConversationRuntime, ModelClassifier, ModelResponder, ProductionRuntime,
    StdioConsole,
};
use state_machine::{ConvContext, Variant};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "prizm_agent=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the conversation; logs go to stderr
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let config = AgentConfig::parse();
    init_logging(config.log_json);
    config.validate()?;

    let model: Arc<dyn LlmService> = if config.mocked {
        tracing::info!("Using scripted model");
        Arc::new(ScriptedModel::new())
    } else {
        let llm_config = LlmConfig::from_env();
        let service = llm_config
            .create_service()
            .context("failed to set up the live model")?;
        tracing::info!(model = %service.model_id(), "Using live model");
        service
    };

    let context = ConvContext::new(config.retry_cap);
    let agent_label = match config.variant {
        Variant::Productivity => prompts::AGENT_NAME,
        Variant::Intake => "Coordinator",
    };

    let runtime: ProductionRuntime = ConversationRuntime::new(
        context,
        initial_state(config.variant, config.subject()),
        ModelClassifier::new(model.clone()),
        ModelResponder::new(model),
        StdioConsole::new(agent_label),
    );

    let state = runtime.run().await.context("conversation aborted")?;

    tracing::info!(
        items = state.items.len(),
        skills = state.skills_used.len(),
        finished = state.step.is_terminal(),
        "Session ended"
    );
    Ok(())
}
