mod config;
mod docs;
mod error;
mod info;
mod qr_codes;
mod redirect;
mod router;
mod scan;
mod state;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use config::ServerConfig;
use dotenvy::dotenv;
use log::{info, warn};
use qr_core::qr_code::storage::QrStorage;
use router::router;
use state::ServerState;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();

    let storage = QrStorage::open(&config.sled_url)
        .with_context(|| format!("Failed to open sled database at {}", config.sled_url))?;

    if let Some(seed_path) = &config.seed_path {
        let stored = storage
            .seed_from_file(seed_path)
            .with_context(|| format!("Failed to seed QR codes from {}", seed_path))?;
        info!("Seeded {} QR codes from {}", stored, seed_path);
    }

    if config.public_base_url.is_none() {
        warn!("PUBLIC_BASE_URL not set, redirect links will not be advertised");
    }

    let state = Arc::new(ServerState::from((storage.clone(), config.public_base_url.clone())));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_domain)
        .await
        .with_context(|| format!("Failed to bind {}", config.server_domain))?;
    info!("Listening on {}", config.server_domain);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    storage.flush().await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
