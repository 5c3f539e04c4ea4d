use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Store;
use crate::domain::{
    case_key, MatchId, MatchRecord, NewMatch, NewPlayer, Player, PlayerId, PlayerStats, RatingDelta,
};
use crate::errors::{StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    players: Vec<Player>,
    matches: Vec<MatchRecord>,
    deltas: Vec<RatingDelta>,
}

/// Process-local store, lost on exit. Enforces the same uniqueness and
/// compare-and-swap rules as the persistent backends.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_text(left: &str, right: &str) -> bool {
    case_key(left) == case_key(right)
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        let mut players = self.tables.lock().await.players.clone();
        players.sort_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.name.cmp(&b.name)));
        Ok(players)
    }

    async fn find_players_by_ids(&self, ids: &[PlayerId]) -> StoreResult<Vec<Player>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .players
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn find_players_by_name_or_email(&self, name: &str, email: &str) -> StoreResult<Vec<Player>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .players
            .iter()
            .filter(|p| same_text(&p.name, name) || same_text(&p.email, email))
            .cloned()
            .collect())
    }

    async fn insert_player(&self, player: &NewPlayer) -> StoreResult<Player> {
        let mut tables = self.tables.lock().await;
        let taken = tables
            .players
            .iter()
            .any(|p| same_text(&p.name, &player.name) || same_text(&p.email, &player.email));
        if taken {
            return Err(StoreError::UniqueViolation);
        }

        let created = Player {
            id: Uuid::new_v4(),
            name: player.name.clone(),
            email: player.email.clone(),
            rating: player.rating,
            matches: 0,
            wins: 0,
        };
        tables.players.push(created.clone());
        Ok(created)
    }

    async fn update_player_stats(
        &self,
        id: PlayerId,
        expected: PlayerStats,
        next: PlayerStats,
    ) -> StoreResult<Option<Player>> {
        let mut tables = self.tables.lock().await;
        let Some(player) = tables.players.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if player.stats() != expected {
            return Ok(None);
        }

        player.rating = next.rating;
        player.matches = next.matches;
        player.wins = next.wins;
        Ok(Some(player.clone()))
    }

    async fn insert_match(&self, new_match: &NewMatch) -> StoreResult<MatchRecord> {
        let record = MatchRecord {
            id: Uuid::new_v4(),
            date: new_match.date,
            team1: new_match.team1,
            team2: new_match.team2,
            winner: new_match.winner,
        };
        self.tables.lock().await.matches.push(record.clone());
        Ok(record)
    }

    async fn insert_rating_deltas(&self, deltas: &[RatingDelta]) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let clash = deltas.iter().enumerate().any(|(idx, delta)| {
            deltas[..idx]
                .iter()
                .chain(tables.deltas.iter())
                .any(|d| d.match_id == delta.match_id && d.player_id == delta.player_id)
        });
        if clash {
            return Err(StoreError::UniqueViolation);
        }

        tables.deltas.extend_from_slice(deltas);
        Ok(())
    }

    async fn list_matches(&self) -> StoreResult<Vec<MatchRecord>> {
        let mut matches: Vec<MatchRecord> =
            self.tables.lock().await.matches.iter().rev().cloned().collect();
        matches.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(matches)
    }

    async fn list_rating_deltas(&self, match_ids: &[MatchId]) -> StoreResult<Vec<RatingDelta>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .deltas
            .iter()
            .filter(|d| match_ids.contains(&d.match_id))
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_player(name: &str, email: &str) -> NewPlayer {
        NewPlayer {
            name: name.to_string(),
            email: email.to_string(),
            rating: 1000,
        }
    }

    #[tokio::test]
    async fn test_rejects_case_insensitive_duplicates() {
        let store = MemoryStore::new();
        store.insert_player(&new_player("Ängel", "angel@example.com")).await.unwrap();

        let by_email = store.insert_player(&new_player("Other", "ANGEL@example.com")).await;
        assert!(matches!(by_email, Err(StoreError::UniqueViolation)));
        let by_name = store.insert_player(&new_player("ängel", "new@example.com")).await;
        assert!(matches!(by_name, Err(StoreError::UniqueViolation)));
        assert_eq!(store.list_players().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_update_is_refused() {
        let store = MemoryStore::new();
        let player = store.insert_player(&new_player("Ana", "ana@example.com")).await.unwrap();
        let expected = player.stats();

        assert!(store
            .update_player_stats(player.id, expected, expected.after_match(16, true))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .update_player_stats(player.id, expected, expected.after_match(16, true))
            .await
            .unwrap()
            .is_none());

        let stored = store.find_players_by_ids(&[player.id]).await.unwrap().remove(0);
        assert_eq!((stored.rating, stored.matches, stored.wins), (1016, 1, 1));
    }

    #[tokio::test]
    async fn test_matches_listed_newest_first() {
        let store = MemoryStore::new();
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let first = store
            .insert_match(&NewMatch {
                date: chrono::Utc::now() - chrono::Duration::minutes(5),
                team1: [ids[0], ids[1]],
                team2: [ids[2], ids[3]],
                winner: crate::domain::Team::Team1,
            })
            .await
            .unwrap();
        let second = store
            .insert_match(&NewMatch {
                date: chrono::Utc::now(),
                team1: [ids[0], ids[2]],
                team2: [ids[1], ids[3]],
                winner: crate::domain::Team::Team2,
            })
            .await
            .unwrap();

        let listed: Vec<MatchId> = store.list_matches().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(listed, vec![second.id, first.id]);
    }
}
