pub mod connection;
pub mod matches;
pub mod memory;
pub mod players;
pub mod rating_deltas;
pub mod rest;
pub mod setup;
pub mod sqlite;

use async_trait::async_trait;

use crate::domain::{
    MatchId, MatchRecord, NewMatch, NewPlayer, Player, PlayerId, PlayerStats, RatingDelta,
};
use crate::errors::StoreResult;

pub use connection::{create_memory_pool, create_pool, get_connection, DbConn, DbPool};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// Access to the `players`, `matches` and `elo_changes` relations.
///
/// Every method is a single round trip. Implementations guarantee per-row
/// atomicity only; nothing spans several calls.
#[async_trait]
pub trait Store: Send + Sync {
    /// All players, highest rating first
    async fn list_players(&self) -> StoreResult<Vec<Player>>;

    async fn find_players_by_ids(&self, ids: &[PlayerId]) -> StoreResult<Vec<Player>>;

    /// Players whose name or email matches, case-insensitively
    async fn find_players_by_name_or_email(&self, name: &str, email: &str) -> StoreResult<Vec<Player>>;

    /// Fails with `StoreError::UniqueViolation` when name or email is taken
    async fn insert_player(&self, player: &NewPlayer) -> StoreResult<Player>;

    /// Compare-and-swap of the player's stats. `Ok(None)` means the row no
    /// longer holds `expected`.
    async fn update_player_stats(
        &self,
        id: PlayerId,
        expected: PlayerStats,
        next: PlayerStats,
    ) -> StoreResult<Option<Player>>;

    async fn insert_match(&self, new_match: &NewMatch) -> StoreResult<MatchRecord>;

    async fn insert_rating_deltas(&self, deltas: &[RatingDelta]) -> StoreResult<()>;

    /// All matches, most recent first
    async fn list_matches(&self) -> StoreResult<Vec<MatchRecord>>;

    async fn list_rating_deltas(&self, match_ids: &[MatchId]) -> StoreResult<Vec<RatingDelta>>;
}
