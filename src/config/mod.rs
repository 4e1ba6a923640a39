/// Database connections and table creation
pub mod database;

/// Application settings from zarzify.toml and the environment
pub mod settings;

pub use settings::{AppConfig, load_app_configuration};
