use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

/// Environment variable holding the inference route prefix.
pub const API_ROUTE_ENV: &str = "LIFGPT_API_ROUTE";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_route: Option<String>,
    pub escape_markup: Option<bool>,
    pub log_file: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {:?}: {}", config_path, e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn save_api_route(route: &str) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.api_route = Some(route.to_string());
        config.save()
    }

    /// Resolve the route: explicit flag, then the environment, then the file.
    pub fn resolve_api_route(&self, flag: Option<&str>) -> Result<String> {
        let env = std::env::var(API_ROUTE_ENV).ok();
        pick_route(flag, env.as_deref(), self.api_route.as_deref()).ok_or_else(|| {
            anyhow!(
                "No inference route configured. Pass --api-route, set {}, or run: lifgpt config set-route <URL>",
                API_ROUTE_ENV
            )
        })
    }

    pub fn escapes_markup(&self) -> bool {
        self.escape_markup.unwrap_or(false)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("lifgpt").join("config.json"))
    }
}

fn pick_route(flag: Option<&str>, env: Option<&str>, file: Option<&str>) -> Option<String> {
    [flag, env, file]
        .into_iter()
        .flatten()
        .find(|route| !route.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert!(!config.escapes_markup());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_route: Some("http://localhost:2000/".to_string()),
            escape_markup: Some(true),
            log_file: None,
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_is_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_route":"http://x/"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_route.as_deref(), Some("http://x/"));
        assert_eq!(config.escape_markup, None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_route_precedence() {
        assert_eq!(pick_route(Some("flag/"), Some("env/"), Some("file/")).as_deref(), Some("flag/"));
        assert_eq!(pick_route(None, Some("env/"), Some("file/")).as_deref(), Some("env/"));
        assert_eq!(pick_route(None, None, Some("file/")).as_deref(), Some("file/"));
        assert_eq!(pick_route(None, None, None), None);
    }

    #[test]
    fn test_empty_route_values_are_skipped() {
        assert_eq!(pick_route(Some(""), Some(""), Some("file/")).as_deref(), Some("file/"));
    }
}
