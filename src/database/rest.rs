use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::error;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Store;
use crate::config::StoreSettings;
use crate::domain::{
    MatchId, MatchRecord, NewMatch, NewPlayer, Player, PlayerId, PlayerStats, RatingDelta, Team,
};
use crate::errors::{StoreError, StoreResult};
use crate::http::RestClient;

const PLAYERS: &str = "players";
const MATCHES: &str = "matches";
const ELO_CHANGES: &str = "elo_changes";

/// Postgres unique_violation
const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Ids per `in.(...)` filter, keeps request URLs short
const IDS_PER_REQUEST: usize = 200;

/// Store backed by a remote PostgREST endpoint (Supabase layout)
pub struct RestStore {
    client: RestClient,
}

#[derive(Debug, Serialize, Deserialize)]
struct PlayerRow {
    id: Uuid,
    name: String,
    email: String,
    elo: i32,
    matches: i32,
    wins: i32,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Player {
            id: row.id,
            name: row.name,
            email: row.email,
            rating: row.elo,
            matches: row.matches,
            wins: row.wins,
        }
    }
}

#[derive(Debug, Serialize)]
struct NewPlayerRow<'a> {
    name: &'a str,
    email: &'a str,
    elo: i32,
    matches: i32,
    wins: i32,
}

#[derive(Debug, Serialize)]
struct PlayerStatsRow {
    elo: i32,
    matches: i32,
    wins: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct MatchRow {
    id: Uuid,
    date: DateTime<Utc>,
    winner: Team,
    team1_player1: Uuid,
    team1_player2: Uuid,
    team2_player1: Uuid,
    team2_player2: Uuid,
}

impl From<MatchRow> for MatchRecord {
    fn from(row: MatchRow) -> Self {
        MatchRecord {
            id: row.id,
            date: row.date,
            winner: row.winner,
            team1: [row.team1_player1, row.team1_player2],
            team2: [row.team2_player1, row.team2_player2],
        }
    }
}

#[derive(Debug, Serialize)]
struct NewMatchRow {
    date: DateTime<Utc>,
    winner: Team,
    team1_player1: Uuid,
    team1_player2: Uuid,
    team2_player1: Uuid,
    team2_player2: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
struct EloChangeRow {
    match_id: Uuid,
    player_id: Uuid,
    elo_change: i32,
}

/// Error body returned by PostgREST
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
    code: Option<String>,
}

impl RestStore {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn from_settings(settings: &StoreSettings, user_agent: &str) -> anyhow::Result<Self> {
        let url = settings
            .rest_url
            .as_deref()
            .context("STORE_URL is required for the rest store")?;
        let key = settings
            .api_key
            .as_deref()
            .context("STORE_API_KEY is required for the rest store")?;

        let client = RestClient::new(url, key, user_agent, settings.timeout)?;
        Ok(Self::new(client))
    }

    async fn read_rows<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> StoreResult<Vec<T>> {
        let response = Self::check(response, what).await?;
        let rows = response
            .json::<Vec<T>>()
            .await
            .with_context(|| format!("Failed to decode {what} response"))?;
        Ok(rows)
    }

    async fn read_single<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> StoreResult<T> {
        Self::read_rows(response, what)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(anyhow!("Store returned no row for {what}")))
    }

    async fn check(response: reqwest::Response, what: &str) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        error!(
            "Store rejected {}: status={} message={:?} details={:?} hint={:?} code={:?}",
            what, status, body.message, body.details, body.hint, body.code
        );

        if status == StatusCode::CONFLICT || body.code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
            return Err(StoreError::UniqueViolation);
        }
        Err(StoreError::Backend(anyhow!(
            "Store rejected {} with status {}",
            what,
            status
        )))
    }
}

/// `in.(a,b,c)` filter over ids
fn in_filter(ids: &[Uuid]) -> String {
    let joined = ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
    format!("in.({joined})")
}

/// Escapes `%`, `_` and `\` so the value matches literally in `ilike`
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Double-quotes a filter value so reserved characters survive
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn name_or_email_filter(name: &str, email: &str) -> String {
    format!(
        "(name.ilike.{},email.ilike.{})",
        quote(&escape_like(name)),
        quote(&escape_like(email))
    )
}

fn compare_and_swap_query(id: PlayerId, expected: &PlayerStats) -> Vec<(&'static str, String)> {
    vec![
        ("id", format!("eq.{id}")),
        ("elo", format!("eq.{}", expected.rating)),
        ("matches", format!("eq.{}", expected.matches)),
        ("wins", format!("eq.{}", expected.wins)),
    ]
}

#[async_trait]
impl Store for RestStore {
    async fn list_players(&self) -> StoreResult<Vec<Player>> {
        let query = [("select", "*".to_string()), ("order", "elo.desc,name.asc".to_string())];
        let response = self.client.get(PLAYERS, &query).await?;
        let rows: Vec<PlayerRow> = Self::read_rows(response, "player list").await?;
        Ok(rows.into_iter().map(Player::from).collect())
    }

    async fn find_players_by_ids(&self, ids: &[PlayerId]) -> StoreResult<Vec<Player>> {
        let mut players = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(IDS_PER_REQUEST) {
            let query = [("select", "*".to_string()), ("id", in_filter(chunk))];
            let response = self.client.get(PLAYERS, &query).await?;
            let rows: Vec<PlayerRow> = Self::read_rows(response, "player lookup").await?;
            players.extend(rows.into_iter().map(Player::from));
        }
        Ok(players)
    }

    async fn find_players_by_name_or_email(&self, name: &str, email: &str) -> StoreResult<Vec<Player>> {
        let query = [
            ("select", "*".to_string()),
            ("or", name_or_email_filter(name, email)),
        ];
        let response = self.client.get(PLAYERS, &query).await?;
        let rows: Vec<PlayerRow> = Self::read_rows(response, "duplicate check").await?;
        Ok(rows.into_iter().map(Player::from).collect())
    }

    async fn insert_player(&self, player: &NewPlayer) -> StoreResult<Player> {
        let row = NewPlayerRow {
            name: &player.name,
            email: &player.email,
            elo: player.rating,
            matches: 0,
            wins: 0,
        };
        let response = self.client.post(PLAYERS, &[row], true).await?;
        let created: PlayerRow = Self::read_single(response, "player insert").await?;
        Ok(created.into())
    }

    async fn update_player_stats(
        &self,
        id: PlayerId,
        expected: PlayerStats,
        next: PlayerStats,
    ) -> StoreResult<Option<Player>> {
        let body = PlayerStatsRow {
            elo: next.rating,
            matches: next.matches,
            wins: next.wins,
        };
        let response = self
            .client
            .patch(PLAYERS, &compare_and_swap_query(id, &expected), &body)
            .await?;
        let rows: Vec<PlayerRow> = Self::read_rows(response, "player update").await?;
        Ok(rows.into_iter().next().map(Player::from))
    }

    async fn insert_match(&self, new_match: &NewMatch) -> StoreResult<MatchRecord> {
        let row = NewMatchRow {
            date: new_match.date,
            winner: new_match.winner,
            team1_player1: new_match.team1[0],
            team1_player2: new_match.team1[1],
            team2_player1: new_match.team2[0],
            team2_player2: new_match.team2[1],
        };
        let response = self.client.post(MATCHES, &[row], true).await?;
        let created: MatchRow = Self::read_single(response, "match insert").await?;
        Ok(created.into())
    }

    async fn insert_rating_deltas(&self, deltas: &[RatingDelta]) -> StoreResult<()> {
        let rows: Vec<EloChangeRow> = deltas
            .iter()
            .map(|d| EloChangeRow {
                match_id: d.match_id,
                player_id: d.player_id,
                elo_change: d.delta,
            })
            .collect();
        let response = self.client.post(ELO_CHANGES, &rows, false).await?;
        Self::check(response, "rating delta insert").await?;
        Ok(())
    }

    async fn list_matches(&self) -> StoreResult<Vec<MatchRecord>> {
        let query = [
            (
                "select",
                "id,date,winner,team1_player1,team1_player2,team2_player1,team2_player2".to_string(),
            ),
            ("order", "date.desc".to_string()),
        ];
        let response = self.client.get(MATCHES, &query).await?;
        let rows: Vec<MatchRow> = Self::read_rows(response, "match list").await?;
        Ok(rows.into_iter().map(MatchRecord::from).collect())
    }

    async fn list_rating_deltas(&self, match_ids: &[MatchId]) -> StoreResult<Vec<RatingDelta>> {
        let mut deltas = Vec::new();
        for chunk in match_ids.chunks(IDS_PER_REQUEST) {
            let query = [("select", "*".to_string()), ("match_id", in_filter(chunk))];
            let response = self.client.get(ELO_CHANGES, &query).await?;
            let rows: Vec<EloChangeRow> = Self::read_rows(response, "rating delta list").await?;
            deltas.extend(rows.into_iter().map(|row| RatingDelta {
                match_id: row.match_id,
                player_id: row.player_id,
                delta: row.elo_change,
            }));
        }
        Ok(deltas)
    }
}
