pub mod matches;
pub mod players;

pub use matches::parse_match_request;
pub use players::{parse_player_request, PlayerRequest};
