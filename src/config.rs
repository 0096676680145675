// Service configuration
// Defaults in code, optionally overlaid by a TOML file, then by environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; LinkfolioBot/1.0)";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkfolioConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub scraper: ScraperConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Pretty-printed JSON document holding the portfolio
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// None keeps the HTTP client's own default
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("./linkfolio-data/portfolio.json"),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: None,
        }
    }
}

impl LinkfolioConfig {
    /// Load configuration from a TOML file; missing sections keep defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `LINKFOLIO_*` overrides from the given lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LINKFOLIO_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("LINKFOLIO_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid LINKFOLIO_PORT: {port}"))?;
        }
        if let Some(data_file) = lookup("LINKFOLIO_DATA_FILE") {
            self.storage.data_file = PathBuf::from(data_file);
        }
        if let Some(user_agent) = lookup("LINKFOLIO_USER_AGENT") {
            self.scraper.user_agent = user_agent;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LinkfolioConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.scraper.user_agent, DEFAULT_USER_AGENT);
        assert!(config.scraper.timeout_secs.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 8088\n\n[scraper]\ntimeout_secs = 5").unwrap();

        let config = LinkfolioConfig::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.scraper.timeout_secs, Some(5));
        assert_eq!(
            config.storage.data_file,
            PathBuf::from("./linkfolio-data/portfolio.json")
        );
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LINKFOLIO_HOST", "127.0.0.1"),
            ("LINKFOLIO_PORT", "9000"),
            ("LINKFOLIO_DATA_FILE", "/srv/portfolio.json"),
        ]
        .into_iter()
        .collect();

        let mut config = LinkfolioConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.storage.data_file, PathBuf::from("/srv/portfolio.json"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = LinkfolioConfig::default();
        let result = config.apply_env(|key| (key == "LINKFOLIO_PORT").then(|| "http".to_string()));
        assert!(result.is_err());
    }
}
