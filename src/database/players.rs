use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, OptionalExtension};
use uuid::Uuid;

use super::connection::DbConn;
use crate::domain::{case_key, NewPlayer, Player, PlayerId, PlayerStats};

const PLAYER_COLUMNS: &str = "id, name, email, rating, matches, wins";

pub fn list_by_rating(conn: &mut DbConn) -> Result<Vec<Player>> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY rating DESC, name ASC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list players")?;

    Ok(rows)
}

pub fn find_by_ids(conn: &mut DbConn, ids: &[PlayerId]) -> Result<Vec<Player>> {
    let mut rows = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(MAX_BOUND_IDS) {
        let sql = format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE id IN ({})",
            placeholders(chunk.len())
        );

        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(chunk.iter()), parse_player_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query players by id")?;
        rows.extend(found);
    }

    Ok(rows)
}

/// Players whose name or email equals the given ones, ignoring case.
/// Compared on the stored keys since `NOCASE` only folds ASCII.
pub fn find_by_name_or_email(conn: &mut DbConn, name: &str, email: &str) -> Result<Vec<Player>> {
    let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE name_key = ?1 OR email_key = ?2");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![case_key(name), case_key(email)], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query players by name or email")?;

    Ok(rows)
}

pub fn insert_player(conn: &mut DbConn, player: &NewPlayer) -> Result<Player> {
    let sql = format!(
        "INSERT INTO players (id, name, email, name_key, email_key, rating, matches, wins) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0) RETURNING {PLAYER_COLUMNS}"
    );

    conn.query_row(
        &sql,
        params![
            Uuid::new_v4(),
            player.name,
            player.email,
            case_key(&player.name),
            case_key(&player.email),
            player.rating
        ],
        parse_player_row,
    )
    .context("Failed to insert new player")
}

/// Writes `next` only while the row still holds `expected`. Returns `None`
/// when another writer got there first.
pub fn update_stats_if_unchanged(
    conn: &mut DbConn,
    id: PlayerId,
    expected: &PlayerStats,
    next: &PlayerStats,
) -> Result<Option<Player>> {
    let sql = format!(
        "UPDATE players SET rating = ?1, matches = ?2, wins = ?3 \
         WHERE id = ?4 AND rating = ?5 AND matches = ?6 AND wins = ?7 \
         RETURNING {PLAYER_COLUMNS}"
    );

    conn.query_row(
        &sql,
        params![
            next.rating,
            next.matches,
            next.wins,
            id,
            expected.rating,
            expected.matches,
            expected.wins
        ],
        parse_player_row,
    )
    .optional()
    .context("Failed to update player statistics")
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        rating: row.get(3)?,
        matches: row.get(4)?,
        wins: row.get(5)?,
    })
}

/// Ids bound per `IN (...)` query, well under SQLite's host parameter limit
pub(super) const MAX_BOUND_IDS: usize = 500;

pub(super) fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ")
}
