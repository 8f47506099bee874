// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitPlan Pro API Server
//!
//! Generates personalized meal and workout plans with an LLM and serves
//! stored plans to identical or similar profiles.

use fitplan_pro::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb, Store},
    services::AiGateway,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting FitPlan Pro API");

    // Initialize storage
    let db: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    // Initialize AI gateway (OpenAI primary, Anthropic fallback)
    let gateway = AiGateway::from_config(&config, db.clone())?;
    tracing::info!(
        openai_model = %config.openai.model,
        anthropic_model = %config.anthropic.model,
        timeout_secs = config.ai_timeout.as_secs(),
        cache_enabled = config.ai_cache.enabled,
        "AI gateway initialized"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, gateway));

    // Build router
    let app = fitplan_pro::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fitplan_pro=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
