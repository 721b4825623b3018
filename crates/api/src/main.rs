use std::sync::Arc;

use anyhow::Context;
use burrow_api::{build_router, state::AppState};
use burrow_config::{LogSettings, Settings, StorageBackend};
use burrow_services::{MemoryStore, Stores};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings.log);

    let stores = match settings.database.backend {
        StorageBackend::Mongo => {
            let db = burrow_db::connect(&settings.database)
                .await
                .context("connecting to MongoDB")?;
            Stores::mongo(&db)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, nothing survives a restart");
            Stores::memory(Arc::new(MemoryStore::new()))
        }
    };

    let addr = settings.bind_addr();
    let app = build_router(AppState::new(settings, stores));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Burrow listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
