use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Custom show-archive XML path (overrides XDG default).
    pub archive_path: Option<PathBuf>,
    /// Custom cover-song list path (overrides XDG default).
    pub covers_path: Option<PathBuf>,
    /// Scrape settings.
    pub scrape: ScrapeConfig,
}

/// Scrape settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Rate limit between HTTP requests in milliseconds.
    pub rate_limit_ms: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self { rate_limit_ms: 500 }
    }
}

impl AppConfig {
    /// Load config from `~/.config/encore/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default show-archive path using the XDG data directory.
pub fn default_archive_path() -> PathBuf {
    data_file("shows.xml")
}

/// Resolve the default cover-song list path.
pub fn default_covers_path() -> PathBuf {
    data_file("covers.txt")
}

fn data_file(name: &str) -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).ok();
        data_dir.join(name)
    } else {
        // Fallback: current directory
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.archive_path.is_none());
        assert!(config.covers_path.is_none());
        assert_eq!(config.scrape.rate_limit_ms, 500);
    }

    #[test]
    fn test_partial_config_parses_with_defaults() {
        let config: AppConfig = toml::from_str("archive_path = \"/tmp/shows.xml\"").unwrap();
        assert_eq!(config.archive_path, Some(PathBuf::from("/tmp/shows.xml")));
        assert_eq!(config.scrape.rate_limit_ms, 500);
    }

    #[test]
    fn test_scrape_section() {
        let config: AppConfig = toml::from_str("[scrape]\nrate_limit_ms = 1000").unwrap();
        assert_eq!(config.scrape.rate_limit_ms, 1000);
    }
}
