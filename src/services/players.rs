use std::sync::{Arc, LazyLock};
use std::time::Duration;

use log::{error, info};
use regex::Regex;

use super::bounded;
use crate::config::AppConfig;
use crate::database::Store;
use crate::domain::{case_key, NewPlayer, Player, PlayerId};
use crate::errors::{ServiceError, StoreError, ValidationError};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex is valid"));

/// Registration and lookup of ladder players
pub struct PlayerRegistry {
    store: Arc<dyn Store>,
    initial_rating: i32,
    timeout: Duration,
}

impl PlayerRegistry {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        Self {
            store,
            initial_rating: config.rating.initial_rating,
            timeout: config.store.timeout,
        }
    }

    /// All players, highest rating first
    pub async fn list(&self) -> Result<Vec<Player>, ServiceError> {
        bounded(self.timeout, self.store.list_players())
            .await
            .map_err(|e| {
                error!("Error fetching players: {:?}", e);
                ServiceError::unavailable("Unable to retrieve player data", e)
            })
    }

    /// Players among `ids` that exist; unknown ids are left out
    pub async fn lookup_by_ids(&self, ids: &[PlayerId]) -> Result<Vec<Player>, ServiceError> {
        bounded(self.timeout, self.store.find_players_by_ids(ids))
            .await
            .map_err(|e| {
                error!("Database error while fetching players by id: {:?}", e);
                ServiceError::unavailable("Unable to verify player information", e)
            })
    }

    /// Registers a new player at the initial rating with empty counters
    pub async fn create(&self, name: &str, email: &str) -> Result<Player, ServiceError> {
        let (name, email) = validate_registration(name, email)?;
        self.ensure_unique(name, email).await?;

        let new_player = NewPlayer {
            name: name.to_string(),
            email: email.to_string(),
            rating: self.initial_rating,
        };

        match bounded(self.timeout, self.store.insert_player(&new_player)).await {
            Ok(player) => {
                info!("Registered player {} ({})", player.name, player.id);
                Ok(player)
            }
            Err(StoreError::UniqueViolation) => {
                error!("Store rejected player {} on a uniqueness constraint", name);
                Err(ServiceError::Conflict("This player already exists in our system"))
            }
            Err(e) => {
                error!("Database error while adding player: {:?}", e);
                Err(ServiceError::unavailable("Unable to add player at this time", e))
            }
        }
    }

    async fn ensure_unique(&self, name: &str, email: &str) -> Result<(), ServiceError> {
        let existing = bounded(self.timeout, self.store.find_players_by_name_or_email(name, email))
            .await
            .map_err(|e| {
                error!("Database error while checking for duplicates: {:?}", e);
                ServiceError::unavailable("Unable to validate player information", e)
            })?;

        let (name_key, email_key) = (case_key(name), case_key(email));
        if existing.iter().any(|p| case_key(&p.name) == name_key) {
            return Err(ValidationError::DuplicateName.into());
        }
        if existing.iter().any(|p| case_key(&p.email) == email_key) {
            return Err(ValidationError::DuplicateEmail.into());
        }
        Ok(())
    }
}

/// Trims both fields and checks name length and email shape
pub fn validate_registration<'a>(name: &'a str, email: &'a str) -> Result<(&'a str, &'a str), ValidationError> {
    let name = name.trim();
    let email = email.trim();

    let name_chars = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_chars) {
        return Err(ValidationError::NameLength);
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok((name, email))
}
