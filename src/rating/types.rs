use crate::domain::{Player, Team};

use super::elo::team_average;

pub type RatingValue = i32;

/// Mean ratings of both sides of a match, oriented by the declared winner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamAverages {
    pub winner: f64,
    pub loser: f64,
}

impl TeamAverages {
    pub fn from_rosters(team1: &[Player; 2], team2: &[Player; 2], winner: Team) -> Self {
        let team1_avg = team_average(team1[0].rating, team1[1].rating);
        let team2_avg = team_average(team2[0].rating, team2[1].rating);

        match winner {
            Team::Team1 => Self { winner: team1_avg, loser: team2_avg },
            Team::Team2 => Self { winner: team2_avg, loser: team1_avg },
        }
    }
}
