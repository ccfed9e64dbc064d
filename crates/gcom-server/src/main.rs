//! GCOM Server - ground control backend for the competition aircraft

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gcom_server::api;
use gcom_server::config::Config;
use gcom_server::persistence;
use gcom_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gcom_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting GCOM Server...");

    let config = Config::from_env();
    let port = config.server_port;

    let db =
        persistence::init_database(&config.database_path, config.database_max_connections).await?;
    if config.reset_on_start {
        tracing::warn!("GCOM_RESET_ON_START set, clearing waypoints and routes");
        persistence::clear_all(db.pool()).await?;
    }

    tracing::info!(
        "Solver: {} (timeout {:?})",
        config.solver_layout().executable_path().display(),
        config.solver_timeout()
    );
    let state = Arc::new(AppState::new(db, config)?);

    // Build the app
    let app = api::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
