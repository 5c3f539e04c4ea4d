use serde_json::Value;
use uuid::Uuid;

use crate::domain::{MatchRequest, PlayerId, Team};
use crate::errors::ValidationError;

/// Checks the shape of a match body: both teams of exactly two player ids
/// and a known winner tag
pub fn parse_match_request(body: &Value) -> Result<MatchRequest, ValidationError> {
    let team1 = present(body, "team1")?;
    let team2 = present(body, "team2")?;
    let winner = present(body, "winner")?;

    let team1 = pair(team1)?;
    let team2 = pair(team2)?;
    let winner = winner
        .as_str()
        .and_then(Team::parse)
        .ok_or(ValidationError::InvalidWinner)?;

    Ok(MatchRequest {
        team1: [player_id(team1[0])?, player_id(team1[1])?],
        team2: [player_id(team2[0])?, player_id(team2[1])?],
        winner,
    })
}

fn present<'a>(body: &'a Value, field: &str) -> Result<&'a Value, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingMatchFields),
        Some(Value::String(text)) if text.is_empty() => Err(ValidationError::MissingMatchFields),
        Some(value) => Ok(value),
    }
}

fn pair(team: &Value) -> Result<[&Value; 2], ValidationError> {
    match team.as_array().map(Vec::as_slice) {
        Some([first, second]) => Ok([first, second]),
        _ => Err(ValidationError::TeamSize),
    }
}

/// An id that is not a UUID can never resolve to a player
fn player_id(value: &Value) -> Result<PlayerId, ValidationError> {
    value
        .as_str()
        .and_then(|text| Uuid::parse_str(text).ok())
        .ok_or(ValidationError::UnknownPlayer)
}
