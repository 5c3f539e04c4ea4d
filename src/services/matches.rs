use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;

use super::bounded;
use crate::config::AppConfig;
use crate::database::Store;
use crate::domain::{
    MatchDetails, MatchId, MatchRecord, MatchRequest, NewMatch, Player, PlayerId, RatingDelta,
};
use crate::errors::{ServiceError, StoreError, StoreResult, ValidationError};
use crate::rating::{compute_delta, RatingValue, TeamAverages};

/// Write step of a recording that did not complete after the match row was stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum FailedStep {
    RatingDeltas,
    #[serde(rename_all = "camelCase")]
    PlayerUpdate { player_id: PlayerId },
}

/// Result of the recording saga once input validation passed
#[derive(Debug)]
pub enum MatchOutcome {
    /// Every write landed
    Success(MatchDetails),
    /// The match exists but some dependent writes are missing. The match is
    /// never rolled back.
    PartialSuccess {
        match_id: MatchId,
        failed_steps: Vec<FailedStep>,
    },
    /// The match row itself could not be written; nothing was persisted
    Abort { reason: StoreError },
}

/// Rating change planned for one player of a match
#[derive(Debug, Clone)]
struct PlayerChange {
    snapshot: Player,
    delta: RatingValue,
    won: bool,
}

pub struct MatchService {
    store: Arc<dyn Store>,
    timeout: Duration,
    update_attempts: usize,
}

impl MatchService {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        Self {
            store,
            timeout: config.store.timeout,
            update_attempts: config.store.update_attempts.max(1),
        }
    }

    /// Records a 2 vs 2 match and moves the ratings of its four players.
    ///
    /// Writes happen in order: match row, the four delta rows, then the four
    /// player updates side by side. Failures after the match row is stored
    /// come back as [`MatchOutcome::PartialSuccess`].
    pub async fn record_match(&self, request: &MatchRequest) -> Result<MatchOutcome, ServiceError> {
        ensure_distinct(&request.player_ids())?;
        let (team1, team2) = self.resolve_rosters(request).await?;

        let averages = TeamAverages::from_rosters(&team1, &team2, request.winner);
        let delta = compute_delta(averages.winner, averages.loser);
        let changes = plan_changes(request, team1, team2, delta);

        Ok(self.run_saga(request, changes).await)
    }

    /// Match history, most recent first, with players and rating changes resolved
    pub async fn list_matches(&self) -> Result<Vec<MatchDetails>, ServiceError> {
        let records = bounded(self.timeout, self.store.list_matches())
            .await
            .map_err(|e| {
                error!("Database error while fetching matches: {:?}", e);
                ServiceError::unavailable("Unable to retrieve match data", e)
            })?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let match_ids: Vec<MatchId> = records.iter().map(|m| m.id).collect();
        let deltas = bounded(self.timeout, self.store.list_rating_deltas(&match_ids))
            .await
            .map_err(|e| {
                error!("Database error while fetching ELO changes: {:?}", e);
                ServiceError::unavailable("Unable to retrieve complete match data", e)
            })?;

        let players = self.load_players_of(&records).await?;
        let mut changes_by_match = group_deltas(deltas);

        records
            .into_iter()
            .map(|record| {
                let changes = changes_by_match.remove(&record.id).unwrap_or_default();
                resolve_details(record, &players, changes)
            })
            .collect()
    }

    async fn resolve_rosters(&self, request: &MatchRequest) -> Result<([Player; 2], [Player; 2]), ServiceError> {
        let ids = request.player_ids();
        let players = bounded(self.timeout, self.store.find_players_by_ids(&ids))
            .await
            .map_err(|e| {
                error!("Database error while fetching players for match: {:?}", e);
                ServiceError::unavailable("Unable to verify player information", e)
            })?;

        if players.len() != ids.len() {
            return Err(ValidationError::UnknownPlayer.into());
        }

        let find = |id: PlayerId| {
            players
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(ValidationError::UnknownPlayer)
        };

        Ok((
            [find(request.team1[0])?, find(request.team1[1])?],
            [find(request.team2[0])?, find(request.team2[1])?],
        ))
    }

    async fn run_saga(&self, request: &MatchRequest, changes: [PlayerChange; 4]) -> MatchOutcome {
        let new_match = NewMatch {
            date: Utc::now(),
            team1: request.team1,
            team2: request.team2,
            winner: request.winner,
        };

        let record = match bounded(self.timeout, self.store.insert_match(&new_match)).await {
            Ok(record) => record,
            Err(e) => {
                error!("Database error while inserting match: {:?}", e);
                return MatchOutcome::Abort { reason: e };
            }
        };
        info!("Match {} recorded, {} won", record.id, record.winner.as_str());

        let deltas: Vec<RatingDelta> = changes
            .iter()
            .map(|c| RatingDelta {
                match_id: record.id,
                player_id: c.snapshot.id,
                delta: c.delta,
            })
            .collect();

        if let Err(e) = bounded(self.timeout, self.store.insert_rating_deltas(&deltas)).await {
            error!("Database error while inserting ELO changes for match {}: {:?}", record.id, e);
            return MatchOutcome::PartialSuccess {
                match_id: record.id,
                failed_steps: vec![FailedStep::RatingDeltas],
            };
        }

        let [c0, c1, c2, c3] = &changes;
        let (r0, r1, r2, r3) = tokio::join!(
            self.apply_change(c0),
            self.apply_change(c1),
            self.apply_change(c2),
            self.apply_change(c3),
        );
        let results = [r0, r1, r2, r3];

        let failed_steps: Vec<FailedStep> = changes
            .iter()
            .zip(&results)
            .filter_map(|(change, result)| {
                let e = result.as_ref().err()?;
                error!("Player update failed for {} in match {}: {:?}", change.snapshot.id, record.id, e);
                Some(FailedStep::PlayerUpdate {
                    player_id: change.snapshot.id,
                })
            })
            .collect();

        match results {
            [Ok(a), Ok(b), Ok(c), Ok(d)] => MatchOutcome::Success(MatchDetails {
                id: record.id,
                date: record.date,
                team1: [a, b],
                team2: [c, d],
                winner: record.winner,
                rating_changes: deltas.iter().map(|row| (row.player_id, row.delta)).collect(),
            }),
            _ => {
                warn!(
                    "Match {} recorded with {} failed player updates",
                    record.id,
                    failed_steps.len()
                );
                MatchOutcome::PartialSuccess {
                    match_id: record.id,
                    failed_steps,
                }
            }
        }
    }

    /// Applies one player's change with compare-and-swap, re-reading the row
    /// and re-applying the same delta when a concurrent writer moved it
    async fn apply_change(&self, change: &PlayerChange) -> StoreResult<Player> {
        let mut current = change.snapshot.clone();

        for attempt in 1..=self.update_attempts {
            let expected = current.stats();
            let next = expected.after_match(change.delta, change.won);

            if let Some(player) =
                bounded(self.timeout, self.store.update_player_stats(current.id, expected, next)).await?
            {
                return Ok(player);
            }

            warn!(
                "Player {} changed concurrently (attempt {}/{})",
                current.id, attempt, self.update_attempts
            );
            if attempt == self.update_attempts {
                break;
            }

            current = bounded(self.timeout, self.store.find_players_by_ids(&[current.id]))
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| StoreError::Backend(anyhow!("Player {} no longer exists", current.id)))?;
        }

        Err(StoreError::Contended)
    }

    async fn load_players_of(&self, records: &[MatchRecord]) -> Result<HashMap<PlayerId, Player>, ServiceError> {
        let ids: Vec<PlayerId> = records
            .iter()
            .flat_map(MatchRecord::player_ids)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let players = bounded(self.timeout, self.store.find_players_by_ids(&ids))
            .await
            .map_err(|e| {
                error!("Database error while fetching match players: {:?}", e);
                ServiceError::unavailable("Unable to retrieve complete match data", e)
            })?;

        Ok(players.into_iter().map(|p| (p.id, p)).collect())
    }
}

fn ensure_distinct(ids: &[PlayerId; 4]) -> Result<(), ValidationError> {
    let unique: HashSet<&PlayerId> = ids.iter().collect();
    if unique.len() == ids.len() {
        Ok(())
    } else {
        Err(ValidationError::RepeatedPlayer)
    }
}

/// Winners get `+delta`, losers `-delta`; ordered team1 then team2
fn plan_changes(
    request: &MatchRequest,
    team1: [Player; 2],
    team2: [Player; 2],
    delta: RatingValue,
) -> [PlayerChange; 4] {
    let winners = request.winning_ids();
    let [a, b] = team1;
    let [c, d] = team2;

    [a, b, c, d].map(|snapshot| {
        let won = winners.contains(&snapshot.id);
        PlayerChange {
            delta: if won { delta } else { -delta },
            won,
            snapshot,
        }
    })
}

fn group_deltas(deltas: Vec<RatingDelta>) -> HashMap<MatchId, HashMap<PlayerId, RatingValue>> {
    let mut grouped: HashMap<MatchId, HashMap<PlayerId, RatingValue>> = HashMap::new();
    for delta in deltas {
        grouped
            .entry(delta.match_id)
            .or_default()
            .insert(delta.player_id, delta.delta);
    }
    grouped
}

fn resolve_details(
    record: MatchRecord,
    players: &HashMap<PlayerId, Player>,
    rating_changes: HashMap<PlayerId, RatingValue>,
) -> Result<MatchDetails, ServiceError> {
    let lookup = |id: PlayerId| {
        players.get(&id).cloned().ok_or_else(|| {
            error!("Match {} references unknown player {}", record.id, id);
            ServiceError::unavailable(
                "Unable to retrieve complete match data",
                StoreError::Backend(anyhow!("match {} references unknown player {}", record.id, id)),
            )
        })
    };

    Ok(MatchDetails {
        id: record.id,
        date: record.date,
        team1: [lookup(record.team1[0])?, lookup(record.team1[1])?],
        team2: [lookup(record.team2[0])?, lookup(record.team2[1])?],
        winner: record.winner,
        rating_changes,
    })
}
