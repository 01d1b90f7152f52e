pub mod config;
pub mod covers;
pub mod export;
pub mod predict;
pub mod scrape;
pub mod stats;
pub mod store;

/// Application name for XDG paths
pub const APP_NAME: &str = "encore";
