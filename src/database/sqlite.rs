use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::ffi;

use super::connection::{get_connection, DbConn, DbPool};
use super::{matches, players, rating_deltas, setup, Store};
use crate::domain::{
    MatchId, MatchRecord, NewMatch, NewPlayer, Player, PlayerId, PlayerStats, RatingDelta,
};
use crate::errors::{StoreError, StoreResult};

/// Store over a local SQLite file. Queries run on the blocking thread pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Opens the pool and makes sure the schema exists
    pub fn open(pool: DbPool) -> Result<Self> {
        let mut conn = get_connection(&pool)?;
        setup::initialize_schema(&mut conn)?;
        Ok(Self::new(pool))
    }

    async fn run<T, F>(&self, query: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut DbConn) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut conn = get_connection(&pool)?;
            query(&mut conn)
        })
        .await
        .context("SQLite worker task failed")?;

        outcome.map_err(classify)
    }
}

fn classify(err: anyhow::Error) -> StoreError {
    match err.downcast_ref::<rusqlite::Error>() {
        Some(rusqlite::Error::SqliteFailure(failure, _)) if is_unique_violation(failure) => {
            StoreError::UniqueViolation
        }
        _ => StoreError::Backend(err),
    }
}

fn is_unique_violation(failure: &ffi::Error) -> bool {
    matches!(
        failure.extended_code,
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

#[async_trait]
impl Store for SqliteStore {
    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        self.run(players::list_by_rating).await
    }

    async fn find_players_by_ids(&self, ids: &[PlayerId]) -> StoreResult<Vec<Player>> {
        let ids = ids.to_vec();
        self.run(move |conn| players::find_by_ids(conn, &ids)).await
    }

    async fn find_players_by_name_or_email(&self, name: &str, email: &str) -> StoreResult<Vec<Player>> {
        let (name, email) = (name.to_string(), email.to_string());
        self.run(move |conn| players::find_by_name_or_email(conn, &name, &email))
            .await
    }

    async fn insert_player(&self, player: &NewPlayer) -> StoreResult<Player> {
        let player = player.clone();
        self.run(move |conn| players::insert_player(conn, &player)).await
    }

    async fn update_player_stats(
        &self,
        id: PlayerId,
        expected: PlayerStats,
        next: PlayerStats,
    ) -> StoreResult<Option<Player>> {
        self.run(move |conn| players::update_stats_if_unchanged(conn, id, &expected, &next))
            .await
    }

    async fn insert_match(&self, new_match: &NewMatch) -> StoreResult<MatchRecord> {
        let new_match = new_match.clone();
        self.run(move |conn| matches::insert_match(conn, &new_match)).await
    }

    async fn insert_rating_deltas(&self, deltas: &[RatingDelta]) -> StoreResult<()> {
        let deltas = deltas.to_vec();
        self.run(move |conn| rating_deltas::insert_many(conn, &deltas)).await
    }

    async fn list_matches(&self) -> StoreResult<Vec<MatchRecord>> {
        self.run(matches::list_all).await
    }

    async fn list_rating_deltas(&self, match_ids: &[MatchId]) -> StoreResult<Vec<RatingDelta>> {
        let match_ids = match_ids.to_vec();
        self.run(move |conn| rating_deltas::list_for_matches(conn, &match_ids))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;
    use crate::domain::Team;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use uuid::Uuid;

    use crate::config::AppConfig;
    use crate::errors::{ServiceError, ValidationError};
    use crate::services::PlayerRegistry;

    fn store() -> SqliteStore {
        SqliteStore::open(create_memory_pool().unwrap()).unwrap()
    }

    fn new_player(name: &str) -> NewPlayer {
        NewPlayer {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            rating: 1000,
        }
    }

    async fn seed(store: &SqliteStore, names: &[&str]) -> Vec<Player> {
        let mut seeded = Vec::new();
        for name in names {
            seeded.push(store.insert_player(&new_player(name)).await.unwrap());
        }
        seeded
    }

    #[tokio::test]
    async fn test_insert_and_list_players_by_rating() {
        let store = store();
        let players = seed(&store, &["Ana", "Bruno"]).await;
        store
            .update_player_stats(players[1].id, players[1].stats(), players[1].stats().after_match(16, true))
            .await
            .unwrap();

        let listed = store.list_players().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Bruno");
        assert_eq!(listed[0].rating, 1016);
        assert_eq!(listed[1].rating, 1000);
        assert_eq!(listed[1].matches, 0);
    }

    #[tokio::test]
    async fn test_unique_name_is_case_insensitive() {
        let store = store();
        seed(&store, &["Ana"]).await;

        let clash = NewPlayer {
            name: "ANA".to_string(),
            email: "other@example.com".to_string(),
            rating: 1000,
        };
        assert!(matches!(
            store.insert_player(&clash).await,
            Err(StoreError::UniqueViolation)
        ));

        let found = store
            .find_players_by_name_or_email("aNa", "nobody@example.com")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_update_is_compare_and_swap() {
        let store = store();
        let player = seed(&store, &["Ana"]).await.remove(0);
        let expected = player.stats();

        let updated = store
            .update_player_stats(player.id, expected, expected.after_match(-12, false))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.rating, 988);
        assert_eq!(updated.matches, 1);
        assert_eq!(updated.wins, 0);

        let stale = store
            .update_player_stats(player.id, expected, expected.after_match(10, true))
            .await
            .unwrap();
        assert!(stale.is_none());
    }

    #[tokio::test]
    async fn test_matches_and_deltas_round_trip() {
        let store = store();
        let players = seed(&store, &["Ana", "Bruno", "Carla", "Diego"]).await;
        let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();

        let older = store
            .insert_match(&NewMatch {
                date: Utc::now() - Duration::hours(1),
                team1: [ids[0], ids[1]],
                team2: [ids[2], ids[3]],
                winner: Team::Team1,
            })
            .await
            .unwrap();
        let newer = store
            .insert_match(&NewMatch {
                date: Utc::now(),
                team1: [ids[2], ids[0]],
                team2: [ids[3], ids[1]],
                winner: Team::Team2,
            })
            .await
            .unwrap();

        let deltas: Vec<RatingDelta> = ids
            .iter()
            .enumerate()
            .map(|(idx, id)| RatingDelta {
                match_id: older.id,
                player_id: *id,
                delta: if idx < 2 { 16 } else { -16 },
            })
            .collect();
        store.insert_rating_deltas(&deltas).await.unwrap();

        let listed = store.list_matches().await.unwrap();
        assert_eq!(listed.iter().map(|m| m.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
        assert_eq!(listed[0].winner, Team::Team2);
        assert_eq!(listed[1].team1, [ids[0], ids[1]]);

        let stored = store.list_rating_deltas(&[older.id, newer.id]).await.unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(stored.iter().map(|d| d.delta).sum::<i32>(), 0);
    }

    #[tokio::test]
    async fn test_delta_batch_is_all_or_nothing() {
        let store = store();
        let players = seed(&store, &["Ana", "Bruno", "Carla", "Diego"]).await;
        let record = store
            .insert_match(&NewMatch {
                date: Utc::now(),
                team1: [players[0].id, players[1].id],
                team2: [players[2].id, players[3].id],
                winner: Team::Team1,
            })
            .await
            .unwrap();

        let duplicate = RatingDelta {
            match_id: record.id,
            player_id: players[0].id,
            delta: 16,
        };
        assert!(store.insert_rating_deltas(&[duplicate, duplicate]).await.is_err());
        assert!(store.list_rating_deltas(&[record.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uniqueness_folds_non_ascii_case() {
        let store = store();
        seed(&store, &["Łukasz", "Ängel"]).await;

        let clash = NewPlayer {
            name: "łukasz".to_string(),
            email: "other@example.com".to_string(),
            rating: 1000,
        };
        assert!(matches!(
            store.insert_player(&clash).await,
            Err(StoreError::UniqueViolation)
        ));

        let by_email = store
            .find_players_by_name_or_email("Nobody", "ÄNGEL@example.com")
            .await
            .unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].name, "Ängel");
    }

    #[tokio::test]
    async fn test_registry_rejects_non_ascii_case_duplicate() {
        let store = Arc::new(store());
        let registry = PlayerRegistry::new(store.clone(), &AppConfig::new());

        registry.create("Łukasz", "lukasz@example.com").await.unwrap();
        let second = registry.create("łukasz", "other@example.com").await;

        assert!(matches!(
            second,
            Err(ServiceError::InvalidInput(ValidationError::DuplicateName))
        ));
        let names: Vec<String> = store.list_players().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Łukasz"]);
    }

    #[tokio::test]
    async fn test_lookups_span_id_batches() {
        let store = store();
        let players = seed(&store, &["Ana", "Bruno", "Carla", "Diego"]).await;
        let record = store
            .insert_match(&NewMatch {
                date: Utc::now(),
                team1: [players[0].id, players[1].id],
                team2: [players[2].id, players[3].id],
                winner: Team::Team2,
            })
            .await
            .unwrap();
        let deltas: Vec<RatingDelta> = players
            .iter()
            .enumerate()
            .map(|(idx, p)| RatingDelta {
                match_id: record.id,
                player_id: p.id,
                delta: if idx < 2 { -16 } else { 16 },
            })
            .collect();
        store.insert_rating_deltas(&deltas).await.unwrap();

        // more ids than one IN list takes, the real ones at the far end
        let mut match_ids: Vec<MatchId> = (0..1200).map(|_| Uuid::new_v4()).collect();
        match_ids.push(record.id);
        assert_eq!(store.list_rating_deltas(&match_ids).await.unwrap().len(), 4);

        let mut player_ids: Vec<PlayerId> = (0..1200).map(|_| Uuid::new_v4()).collect();
        player_ids.extend(players.iter().map(|p| p.id));
        assert_eq!(store.find_players_by_ids(&player_ids).await.unwrap().len(), 4);
    }
}
