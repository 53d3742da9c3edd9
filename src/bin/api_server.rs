// API Server Binary Entry Point
//
// Purpose: Start the Axum API server over the recommendation orchestrator
// Usage: cargo run --features api --bin api_server

use crop_advisor_rust::{create_router, AdvisorConfig, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "crop_advisor_rust=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration from environment variables (see crop_advisor_rust::config)
    let config = AdvisorConfig::from_env()?;
    config.log_summary();

    tracing::info!("Loading knowledge base...");
    let kb = Arc::new(config.load_knowledge_base()?);

    let state = AppState::new(config.build_orchestrator(kb));
    tracing::info!(
        "Application state initialized (AI advisor: {}, vision: {})",
        state.orchestrator.ai_enabled(),
        state.orchestrator.vision_enabled()
    );

    // Create router with all endpoints and middleware
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await?;

    Ok(())
}
