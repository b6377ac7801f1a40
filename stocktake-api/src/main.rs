//! # Stocktake API Server
//!
//! Backend for the Stocktake inventory app: organization membership with
//! invite codes, and AI image scanning.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - Organization endpoints (create, join, leave, manage, transfer ownership)
//! - Image scan endpoint backed by an OpenAI vision model
//! - JWT bearer authentication
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p stocktake-api
//! ```

use std::sync::Arc;

use stocktake_api::{
    app::{build_router, AppState},
    config::Config,
};
use stocktake_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    store::PgOrganizationStore,
    vision::{OpenAiVisionClient, VisionModel},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "stocktake_api=debug,stocktake_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Stocktake API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    let vision: Option<Arc<dyn VisionModel>> = match &config.openai {
        Some(openai) => {
            let client: Arc<dyn VisionModel> =
                Arc::new(OpenAiVisionClient::new(openai.client_config())?);
            tracing::info!(model = %openai.model, "Image scanning enabled");
            Some(client)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, image scanning disabled");
            None
        }
    };

    let bind_address = config.bind_address();
    let store = Arc::new(PgOrganizationStore::new(pool.clone()));
    let app = build_router(AppState::new(store, vision, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, exiting...");
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
