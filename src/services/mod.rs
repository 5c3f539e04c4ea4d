pub mod matches;
pub mod players;
pub mod server;

use std::future::Future;
use std::time::Duration;

use crate::errors::{StoreError, StoreResult};

pub use matches::{FailedStep, MatchOutcome, MatchService};
pub use players::PlayerRegistry;

/// Runs one store call, treating an elapsed deadline as a failed call
pub async fn bounded<T, F>(timeout: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| StoreError::Timeout)?
}
