use anyhow::{bail, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RatingSettings {
    pub initial_rating: i32,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self { initial_rating: 1000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Rest,
    Memory,
}

impl StoreBackend {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "rest" => Ok(StoreBackend::Rest),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("Unknown store backend: {}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub database_path: String,
    pub rest_url: Option<String>,
    pub api_key: Option<String>,
    /// Upper bound for every single call against the store
    pub timeout: Duration,
    /// Compare-and-swap attempts per player update
    pub update_attempts: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_path: "padel_ladder.db".to_string(),
            rest_url: None,
            api_key: None,
            timeout: Duration::from_millis(5000),
            update_attempts: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub user_agent: &'static str,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            user_agent: "PadelLadder/1.0",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub rating: RatingSettings,
    pub store: StoreSettings,
    pub server: ServerSettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `STORE_*` and `DATABASE_PATH` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();
        config.store = StoreSettings::from_lookup(|key| std::env::var(key).ok())?;
        Ok(config)
    }
}

impl StoreSettings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(backend) = lookup("STORE_BACKEND") {
            settings.backend = StoreBackend::parse(&backend)?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            settings.database_path = path;
        }
        settings.rest_url = lookup("STORE_URL");
        settings.api_key = lookup("STORE_API_KEY");

        if let Some(ms) = lookup("STORE_TIMEOUT_MS") {
            let ms: u64 = ms.parse().context("STORE_TIMEOUT_MS must be a number of milliseconds")?;
            settings.timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = lookup("STORE_UPDATE_ATTEMPTS") {
            settings.update_attempts = attempts
                .parse::<usize>()
                .context("STORE_UPDATE_ATTEMPTS must be a positive number")?
                .max(1);
        }

        Ok(settings)
    }
}
