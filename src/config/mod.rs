pub mod settings;

pub use settings::{AppConfig, RatingSettings, ServerSettings, StoreBackend, StoreSettings};
