pub mod elo;
pub mod types;

pub use elo::{compute_delta, K_FACTOR};
pub use types::{RatingValue, TeamAverages};
