use anyhow::{Context, Result};
use rusqlite::params;
use rusqlite::types::Type;
use uuid::Uuid;

use super::connection::DbConn;
use crate::domain::{MatchRecord, NewMatch, Team};

const MATCH_COLUMNS: &str =
    "id, date, winner, team1_player1, team1_player2, team2_player1, team2_player2";

pub fn insert_match(conn: &mut DbConn, new_match: &NewMatch) -> Result<MatchRecord> {
    let sql = format!(
        "INSERT INTO matches ({MATCH_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING {MATCH_COLUMNS}"
    );

    conn.query_row(
        &sql,
        params![
            Uuid::new_v4(),
            new_match.date,
            new_match.winner.as_str(),
            new_match.team1[0],
            new_match.team1[1],
            new_match.team2[0],
            new_match.team2[1]
        ],
        parse_match_row,
    )
    .context("Failed to insert match")
}

/// All matches, most recent first
pub fn list_all(conn: &mut DbConn) -> Result<Vec<MatchRecord>> {
    let sql = format!("SELECT {MATCH_COLUMNS} FROM matches ORDER BY date DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_match_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list matches")?;

    Ok(rows)
}

fn parse_match_row(row: &rusqlite::Row) -> rusqlite::Result<MatchRecord> {
    let winner: String = row.get(2)?;
    let winner = Team::parse(&winner).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown winner tag: {winner}").into(),
        )
    })?;

    Ok(MatchRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        winner,
        team1: [row.get(3)?, row.get(4)?],
        team2: [row.get(5)?, row.get(6)?],
    })
}
