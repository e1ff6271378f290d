use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::services::scheduler::SyncMode;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_conns: u32,
    pub min_conns: u32,
    pub port: u16,
    pub weather_api_key: Option<String>,
    pub yahoo_access_token: Option<String>,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub mode_override: Option<SyncMode>,
    pub live_interval: Duration,
    pub active_interval: Duration,
    pub standard_interval: Duration,
    pub idle_interval: Duration,
    pub sync_games: bool,
    pub sync_stats: bool,
    pub sync_injuries: bool,
    pub clear_cache: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode_override: None,
            live_interval: Duration::from_secs(60),
            active_interval: Duration::from_secs(300),
            standard_interval: Duration::from_secs(900),
            idle_interval: Duration::from_secs(3600),
            sync_games: true,
            sync_stats: true,
            sync_injuries: true,
            clear_cache: true,
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

impl Config {
    /// Missing DATABASE_URL is a startup error, everything else has a default.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow!("DATABASE_URL must be set"))?;

        let defaults = SchedulerConfig::default();
        let mode_override = env_opt("SYNC_MODE_OVERRIDE")
            .map(|v| v.parse::<SyncMode>())
            .transpose()
            .map_err(|e| anyhow!("SYNC_MODE_OVERRIDE: {}", e))?;

        Ok(Config {
            database_url,
            max_conns: env_u32("DB_MAX_CONNS", 25),
            min_conns: env_u32("DB_MIN_CONNS", 5),
            port: env_u32("PORT", 3000) as u16,
            weather_api_key: env_opt("WEATHER_API_KEY"),
            yahoo_access_token: env_opt("YAHOO_ACCESS_TOKEN"),
            scheduler: SchedulerConfig {
                enabled: env_bool("SYNC_ENABLED", defaults.enabled),
                mode_override,
                live_interval: env_secs("SYNC_LIVE_INTERVAL_SECS", defaults.live_interval),
                active_interval: env_secs("SYNC_ACTIVE_INTERVAL_SECS", defaults.active_interval),
                standard_interval: env_secs("SYNC_STANDARD_INTERVAL_SECS", defaults.standard_interval),
                idle_interval: env_secs("SYNC_IDLE_INTERVAL_SECS", defaults.idle_interval),
                sync_games: env_bool("SYNC_GAMES", defaults.sync_games),
                sync_stats: env_bool("SYNC_STATS", defaults.sync_stats),
                sync_injuries: env_bool("SYNC_INJURIES", defaults.sync_injuries),
                clear_cache: env_bool("SYNC_CLEAR_CACHE", defaults.clear_cache),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_defaults() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.live_interval, Duration::from_secs(60));
        assert_eq!(cfg.idle_interval, Duration::from_secs(3600));
        assert!(cfg.enabled);
        assert!(cfg.mode_override.is_none());
    }

    #[test]
    fn env_bool_parsing() {
        std::env::set_var("GRIDFEED_TEST_FLAG", "true");
        assert!(env_bool("GRIDFEED_TEST_FLAG", false));
        std::env::set_var("GRIDFEED_TEST_FLAG", "0");
        assert!(!env_bool("GRIDFEED_TEST_FLAG", true));
        std::env::remove_var("GRIDFEED_TEST_FLAG");
        assert!(env_bool("GRIDFEED_TEST_FLAG", true));
    }
}
