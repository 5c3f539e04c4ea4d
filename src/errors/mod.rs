use thiserror::Error;

/// Failure of a single call against the backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("store call timed out")]
    Timeout,

    #[error("row kept changing under concurrent writers")]
    Contended,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Rejected client input. The messages are shown to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name and email are required")]
    MissingPlayerFields,

    #[error("Name must be between 2 and 50 characters")]
    NameLength,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("A player with this name already exists")]
    DuplicateName,

    #[error("A player with this email already exists")]
    DuplicateEmail,

    #[error("Missing required fields")]
    MissingMatchFields,

    #[error("Each team must have exactly 2 players")]
    TeamSize,

    #[error("Invalid winner value")]
    InvalidWinner,

    #[error("A player cannot appear more than once in a match")]
    RepeatedPlayer,

    #[error("One or more players not found")]
    UnknownPlayer,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    #[error("{0}")]
    Conflict(&'static str),

    /// Store failure before anything was written; `message` is user-safe
    #[error("{message}")]
    Unavailable {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    pub fn unavailable(message: &'static str, source: StoreError) -> Self {
        Self::Unavailable { message, source }
    }
}
