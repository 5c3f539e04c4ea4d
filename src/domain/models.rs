use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rating::RatingValue;

pub type PlayerId = Uuid;
pub type MatchId = Uuid;

/// Ladder player with its aggregate statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub email: String,
    #[serde(alias = "elo")]
    pub rating: RatingValue,
    pub matches: i32,
    pub wins: i32,
}

impl Player {
    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            rating: self.rating,
            matches: self.matches,
            wins: self.wins,
        }
    }
}

/// Mutable part of a player row, compared and swapped as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStats {
    pub rating: RatingValue,
    pub matches: i32,
    pub wins: i32,
}

impl PlayerStats {
    /// Stats after one more match with the given signed rating change
    pub fn after_match(&self, delta: RatingValue, won: bool) -> Self {
        Self {
            rating: self.rating + delta,
            matches: self.matches + 1,
            wins: self.wins + i32::from(won),
        }
    }
}

/// Form of a name or email that uniqueness is decided on. Full Unicode
/// lowercasing, so "Łukasz" and "łukasz" share a key.
pub fn case_key(text: &str) -> String {
    text.to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    pub name: String,
    pub email: String,
    pub rating: RatingValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Team1,
    Team2,
}

impl Team {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "team1" => Some(Team::Team1),
            "team2" => Some(Team::Team2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Team1 => "team1",
            Team::Team2 => "team2",
        }
    }
}

/// Validated input of the match recording operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRequest {
    pub team1: [PlayerId; 2],
    pub team2: [PlayerId; 2],
    pub winner: Team,
}

impl MatchRequest {
    pub fn player_ids(&self) -> [PlayerId; 4] {
        [self.team1[0], self.team1[1], self.team2[0], self.team2[1]]
    }

    pub fn winning_ids(&self) -> &[PlayerId; 2] {
        match self.winner {
            Team::Team1 => &self.team1,
            Team::Team2 => &self.team2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub date: DateTime<Utc>,
    pub team1: [PlayerId; 2],
    pub team2: [PlayerId; 2],
    pub winner: Team,
}

/// Stored match row, players referenced by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub id: MatchId,
    pub date: DateTime<Utc>,
    pub team1: [PlayerId; 2],
    pub team2: [PlayerId; 2],
    pub winner: Team,
}

impl MatchRecord {
    pub fn player_ids(&self) -> [PlayerId; 4] {
        [self.team1[0], self.team1[1], self.team2[0], self.team2[1]]
    }
}

/// Signed rating change of one player in one match (an `elo_changes` row)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingDelta {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub delta: RatingValue,
}

/// Match with resolved players, as returned by the history listing and by a
/// successful recording
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetails {
    pub id: MatchId,
    pub date: DateTime<Utc>,
    pub team1: [Player; 2],
    pub team2: [Player; 2],
    pub winner: Team,
    pub rating_changes: HashMap<PlayerId, RatingValue>,
}
