use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use study::{
    api::{build_router, AppState},
    config::{Config, LoggingConfig},
    provider::OpenAiClient,
    rag::{PipelineConfig, RagPipeline},
    FactStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("STUDY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("study.toml"));
    let config = Config::load(Some(&config_path)).context("Failed to load configuration")?;

    init_tracing(&config.logging);

    let client = Arc::new(OpenAiClient::new(&config.provider)?);

    // Every fact must be embedded before the first request is served
    let store = FactStore::load(&config.retrieval.facts_dir, client.as_ref())
        .await
        .with_context(|| {
            format!(
                "Failed to load facts from {}",
                config.retrieval.facts_dir.display()
            )
        })?;

    let pipeline = RagPipeline::new(
        Arc::new(store),
        client.clone(),
        client,
        PipelineConfig::new(&config.retrieval, config.provider.system_prompt.clone()),
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        title: config.server.title.clone(),
        language_model: config.provider.language_model.clone(),
        embedding_model: config.provider.embedding_model.clone(),
    };
    let router = build_router(state, config.server.max_body_bytes);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
