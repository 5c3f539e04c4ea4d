use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::services::{MatchService, PlayerRegistry};

pub mod matches;
pub mod players;

pub struct AppState {
    pub players: PlayerRegistry,
    pub matches: MatchService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        Self {
            players: PlayerRegistry::new(Arc::clone(&store), config),
            matches: MatchService::new(store, config),
        }
    }
}
