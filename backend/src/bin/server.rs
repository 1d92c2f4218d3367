//! Starlight HTTP Server Binary
//!
//! This is the main entry point for the planner REST API server.
//! It loads configuration, builds the reasoning service once, and starts
//! serving requests.
//!
//! # Usage
//!
//! ```bash
//! GEMINI_API_KEY=... cargo run --bin starlight-server
//! ```
//!
//! # Environment Variables
//!
//! - `GEMINI_API_KEY`: API key (variable name configurable via `service.api_key_env`)
//! - `STARLIGHT_MODEL`, `STARLIGHT_FALLBACK_MODEL`, `STARLIGHT_TIMEOUT_SECS`, `STARLIGHT_BASE_URL`
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use starlight_planner::http::{create_router, AppState};
use starlight_planner::services::{GeminiReasoningService, SessionPlanner};
use starlight_planner::PlannerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Starlight planner server");

    let config = PlannerConfig::load()?;
    info!(
        "Reasoning model {} (fallback: {}), timeout {} s, prompt {}",
        config.service.model,
        config.service.fallback_model.as_deref().unwrap_or("none"),
        config.service.timeout_secs,
        config.prompt.version
    );

    // One client for the process lifetime
    let service = Arc::new(GeminiReasoningService::new(&config.service)?);
    let planner = Arc::new(SessionPlanner::from_config(service, &config));

    let app = create_router(AppState::new(planner));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
