//! Lingua Gateway Server
//!
//! Runs the translation gateway as a standalone HTTP server.

use anyhow::Result;
use clap::Parser;
use lingua_gateway::{
    api::ApiState, config::Settings, llm_client::LlmConfig, server::run_server, LlmClient,
    TaskService, TaskStore, TranslationStore, TranslatorService,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lingua-server")]
#[command(about = "Lingua Gateway HTTP Server")]
struct Args {
    /// Server port
    #[arg(short, long, default_value = "8000", env = "GATEWAY_PORT")]
    port: u16,

    /// Server host
    #[arg(long, default_value = "0.0.0.0", env = "GATEWAY_HOST")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingua_gateway=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::from_env();

    info!("Starting Lingua Gateway");
    info!("  Database: {:?}", settings.database_path);
    info!("  Model: {}", settings.openai_model);
    if settings.internal_api_key.is_none() {
        info!("  Internal api key not configured; task claim endpoints will refuse calls");
    }

    // Initialize components
    let task_store = Arc::new(TaskStore::open(&settings.database_path)?);
    let translation_store = Arc::new(TranslationStore::open(&settings.database_path)?);
    let llm_client = LlmClient::new(LlmConfig::from_settings(&settings))?;

    let state = Arc::new(ApiState {
        tasks: TaskService::new(task_store),
        translator: TranslatorService::new(llm_client, translation_store),
        internal_api_key: settings.internal_api_key.clone(),
    });

    // Start server (blocks until shutdown)
    run_server(state, &args.host, args.port).await
}
