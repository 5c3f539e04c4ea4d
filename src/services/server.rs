use anyhow::Result;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::{create_router, AppState};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{self, MemoryStore, RestStore, SqliteStore, Store};

pub struct ServerService {
    port: u16,
    config: AppConfig,
}

impl ServerService {
    pub fn new(port: u16, config: AppConfig) -> Self {
        Self { port, config }
    }

    pub async fn run(&self) -> Result<()> {
        let store = open_store(&self.config)?;
        let state = Arc::new(AppState::new(store, &self.config));

        let app = create_router(state)
            .layer(CorsLayer::permissive());

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Builds the store selected by `STORE_BACKEND`
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            info!("Using SQLite store at {}", config.store.database_path);
            let pool = database::create_pool(&config.store.database_path)?;
            Ok(Arc::new(SqliteStore::open(pool)?))
        }
        StoreBackend::Rest => {
            info!("Using remote store");
            Ok(Arc::new(RestStore::from_settings(&config.store, config.server.user_agent)?))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
