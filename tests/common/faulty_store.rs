use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Mutex;

use padel_ladder::database::{MemoryStore, Store};
use padel_ladder::domain::{
    MatchId, MatchRecord, NewMatch, NewPlayer, Player, PlayerId, PlayerStats, RatingDelta,
};
use padel_ladder::errors::{StoreError, StoreResult};

/// Store calls that can be made to misbehave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListPlayers,
    FindPlayersByIds,
    FindPlayersByNameOrEmail,
    InsertPlayer,
    UpdatePlayerStats,
    InsertMatch,
    InsertRatingDeltas,
    ListMatches,
    ListRatingDeltas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Return a backend error
    Fail,
    /// Never answer
    Stall,
    /// Reject as a unique constraint violation
    UniqueViolation,
}

/// Memory store with per-operation fault injection. Every call yields to the
/// scheduler first, so concurrent callers interleave the way they would
/// against a remote store.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    faults: Mutex<HashMap<Operation, Fault>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn inject(&self, operation: Operation, fault: Fault) {
        self.faults.lock().await.insert(operation, fault);
    }

    pub async fn clear_faults(&self) {
        self.faults.lock().await.clear();
    }

    // Inspection helpers read the inner store directly and ignore faults.

    pub async fn player(&self, id: PlayerId) -> Option<Player> {
        self.inner
            .find_players_by_ids(&[id])
            .await
            .expect("memory store lookup")
            .into_iter()
            .next()
    }

    pub async fn player_count(&self) -> usize {
        self.inner.list_players().await.expect("memory store listing").len()
    }

    pub async fn match_count(&self) -> usize {
        self.inner.list_matches().await.expect("memory store listing").len()
    }

    pub async fn deltas_for(&self, match_id: MatchId) -> Vec<RatingDelta> {
        self.inner
            .list_rating_deltas(&[match_id])
            .await
            .expect("memory store listing")
    }

    async fn enter(&self, operation: Operation) -> StoreResult<()> {
        tokio::task::yield_now().await;

        let fault = self.faults.lock().await.get(&operation).copied();
        match fault {
            None => Ok(()),
            Some(Fault::Fail) => Err(StoreError::Backend(anyhow!("injected failure in {:?}", operation))),
            Some(Fault::UniqueViolation) => Err(StoreError::UniqueViolation),
            Some(Fault::Stall) => {
                std::future::pending::<()>().await;
                Err(StoreError::Timeout)
            }
        }
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        self.enter(Operation::ListPlayers).await?;
        self.inner.list_players().await
    }

    async fn find_players_by_ids(&self, ids: &[PlayerId]) -> StoreResult<Vec<Player>> {
        self.enter(Operation::FindPlayersByIds).await?;
        self.inner.find_players_by_ids(ids).await
    }

    async fn find_players_by_name_or_email(&self, name: &str, email: &str) -> StoreResult<Vec<Player>> {
        self.enter(Operation::FindPlayersByNameOrEmail).await?;
        self.inner.find_players_by_name_or_email(name, email).await
    }

    async fn insert_player(&self, player: &NewPlayer) -> StoreResult<Player> {
        self.enter(Operation::InsertPlayer).await?;
        self.inner.insert_player(player).await
    }

    async fn update_player_stats(
        &self,
        id: PlayerId,
        expected: PlayerStats,
        next: PlayerStats,
    ) -> StoreResult<Option<Player>> {
        self.enter(Operation::UpdatePlayerStats).await?;
        self.inner.update_player_stats(id, expected, next).await
    }

    async fn insert_match(&self, new_match: &NewMatch) -> StoreResult<MatchRecord> {
        self.enter(Operation::InsertMatch).await?;
        self.inner.insert_match(new_match).await
    }

    async fn insert_rating_deltas(&self, deltas: &[RatingDelta]) -> StoreResult<()> {
        self.enter(Operation::InsertRatingDeltas).await?;
        self.inner.insert_rating_deltas(deltas).await
    }

    async fn list_matches(&self) -> StoreResult<Vec<MatchRecord>> {
        self.enter(Operation::ListMatches).await?;
        self.inner.list_matches().await
    }

    async fn list_rating_deltas(&self, match_ids: &[MatchId]) -> StoreResult<Vec<RatingDelta>> {
        self.enter(Operation::ListRatingDeltas).await?;
        self.inner.list_rating_deltas(match_ids).await
    }
}
