use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://www.leagueofgraphs.com/summoner".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/93.0.4577.82 Safari/537.36"
        .to_string()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/accounts.duckdb")
}
fn default_true() -> bool {
    true
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            run_migrations: true,
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from `config/{default,local}.toml` plus `LOLACC__*` overrides.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("LOLACC").separator("__"))
            .build()?;

        let app_cfg = cfg.try_deserialize().unwrap_or_else(|e| {
            warn!("Invalid configuration ({}), falling back to defaults", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_league_of_graphs() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.scraper.base_url, "https://www.leagueofgraphs.com/summoner");
        assert!(cfg.scraper.user_agent.starts_with("Mozilla/5.0"));
        assert!(cfg.storage.run_migrations);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[scraper]\ntimeout_secs = 5\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.scraper.timeout_secs, 5);
        assert_eq!(cfg.scraper.base_url, default_base_url());
        assert_eq!(cfg.storage.db_path, PathBuf::from("data/accounts.duckdb"));
    }
}
