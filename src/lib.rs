// Data Crew - CSV knowledge upload and multi-agent LLM analysis service

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod crew;
pub mod knowledge;
pub mod llm;
pub mod routes;
pub mod utils;

// Re-exports for convenience
pub use config::{CrewConfig, ServerConfig};
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
