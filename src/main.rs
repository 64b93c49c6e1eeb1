use std::net::SocketAddr;
use std::sync::Arc;

use data_crew::{
    config::{CrewConfig, ServerConfig},
    crew::CrewRunner,
    routes::create_router,
    utils::init_tracing,
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Load configuration
    let config = ServerConfig::from_env()?;
    info!(host = %config.host, port = config.port, "Server configuration loaded");

    let mut crew_config = CrewConfig::load(&config.crew_config_path)?;
    crew_config.openai_api_key = config.openai_api_key.clone();
    info!(
        model = %crew_config.llm_model,
        base_url = %crew_config.ollama_base_url,
        agents = %crew_config.agents_file.display(),
        tasks = %crew_config.tasks_file.display(),
        "Crew configuration loaded"
    );

    tokio::fs::create_dir_all(&config.knowledge_dir).await?;

    // Create shared state
    let runner = Arc::new(CrewRunner::new(
        Arc::new(crew_config),
        config.knowledge_dir.clone(),
    ));
    let state = AppState::new(config.clone(), runner);

    // Create router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
