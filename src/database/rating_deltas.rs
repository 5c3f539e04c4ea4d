use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter};

use super::connection::DbConn;
use super::players::{placeholders, MAX_BOUND_IDS};
use crate::domain::{MatchId, RatingDelta};

/// Inserts all rows of one match or none of them
pub fn insert_many(conn: &mut DbConn, deltas: &[RatingDelta]) -> Result<()> {
    let tx = conn.transaction().context("Failed to open transaction")?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO elo_changes (match_id, player_id, elo_change) VALUES (?1, ?2, ?3)",
        )?;
        for delta in deltas {
            stmt.execute(params![delta.match_id, delta.player_id, delta.delta])
                .with_context(|| format!("Failed to insert rating delta for player {}", delta.player_id))?;
        }
    }
    tx.commit().context("Failed to commit rating deltas")
}

/// Delta rows of the given matches, queried in batches of ids
pub fn list_for_matches(conn: &mut DbConn, match_ids: &[MatchId]) -> Result<Vec<RatingDelta>> {
    let mut rows = Vec::new();

    for chunk in match_ids.chunks(MAX_BOUND_IDS) {
        let sql = format!(
            "SELECT match_id, player_id, elo_change FROM elo_changes WHERE match_id IN ({})",
            placeholders(chunk.len())
        );

        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok(RatingDelta {
                    match_id: row.get(0)?,
                    player_id: row.get(1)?,
                    delta: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query rating deltas")?;
        rows.extend(found);
    }

    Ok(rows)
}
