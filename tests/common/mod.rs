#![allow(dead_code)]

pub mod faulty_store;

use std::sync::Arc;
use std::time::Duration;

use padel_ladder::config::AppConfig;
use padel_ladder::database::Store;
use padel_ladder::domain::{NewPlayer, Player};
use uuid::Uuid;

pub use faulty_store::{Fault, FaultyStore, Operation};

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::new();
    config.store.timeout = Duration::from_millis(200);
    config
}

fn email_of(name: &str) -> String {
    format!("{}@example.com", name.to_lowercase())
}

/// Player that is not stored anywhere
pub fn player(name: &str, rating: i32) -> Player {
    Player {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email_of(name),
        rating,
        matches: 0,
        wins: 0,
    }
}

/// Fault-injectable store holding one fresh player per `(name, rating)`,
/// returned in roster order
pub async fn store_with(roster: &[(&str, i32)]) -> (Arc<FaultyStore>, Vec<Player>) {
    let store = Arc::new(FaultyStore::new());
    let mut players = Vec::with_capacity(roster.len());
    for (name, rating) in roster {
        let new_player = NewPlayer {
            name: name.to_string(),
            email: email_of(name),
            rating: *rating,
        };
        players.push(store.insert_player(&new_player).await.expect("seed player"));
    }
    (store, players)
}
