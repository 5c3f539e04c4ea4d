use super::types::RatingValue;

/// Maximum rating swing of a single match
pub const K_FACTOR: f64 = 32.0;

/// Rating points needed for 10:1 odds
const SCALE: f64 = 400.0;

/// Rating magnitude won by every player of the winning team and lost by every
/// player of the losing team. Always within `0..=32`.
///
/// Half values are rounded away from zero, so a raw gain of `2.5` yields `3`.
pub fn compute_delta(winning_average: f64, losing_average: f64) -> RatingValue {
    let delta = round_half_away_from_zero(raw_delta(winning_average, losing_average));
    delta.clamp(0, K_FACTOR as RatingValue)
}

/// Unrounded `K * (1 - E_winner)`
pub fn raw_delta(winning_average: f64, losing_average: f64) -> f64 {
    K_FACTOR * (1.0 - expected_score(winning_average, losing_average))
}

pub fn expected_score(rating: f64, opponent_rating: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - rating) / SCALE))
}

pub fn round_half_away_from_zero(value: f64) -> RatingValue {
    value.round() as RatingValue
}

pub fn team_average(first: RatingValue, second: RatingValue) -> f64 {
    (f64::from(first) + f64::from(second)) / 2.0
}
