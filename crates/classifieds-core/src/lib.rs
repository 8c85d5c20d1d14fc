//! Domain types and configuration shared by the marketplace client crates.

pub mod app_config;
pub mod categories;
pub mod config;
pub mod filters;
pub mod form;
pub mod listing;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use categories::{load_categories, CategoriesFile, CategoryConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use filters::{CleanedFilters, FilterState, FilterValue, GEO_KEYS, LATITUDE, LONGITUDE};
pub use listing::{
    FeedPage, FeedState, Listing, ListingId, Location, WishlistEntry, WishlistKey,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read categories file {path}: {source}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse categories file: {0}")]
    CategoriesFileParse(#[source] serde_yaml::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
