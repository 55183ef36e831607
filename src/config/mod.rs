//! Configuration handling for the sync daemon.
//!
//! `Config::from_env` reads environment variables and falls back to
//! development defaults. Without `DATABASE_URL` content is kept in memory,
//! which is enough for local runs against a handful of feeds.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::feeds::RssFeed;
use crate::syndication::SchedulerConfig;

/// Environment variable names.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_FEEDS_FILE: &str = "FEEDS_FILE";
pub const ENV_SYNC_INTERVAL_SECS: &str = "SYNC_INTERVAL_SECS";
pub const ENV_SYNC_MAX_CONCURRENT: &str = "SYNC_MAX_CONCURRENT";
pub const ENV_FEED_TIMEOUT_SECS: &str = "FEED_TIMEOUT_SECS";
pub const ENV_FEED_MAX_RETRIES: &str = "FEED_MAX_RETRIES";
pub const ENV_AI_ANALYSIS_ENABLED: &str = "AI_ANALYSIS_ENABLED";

/// Default development values used when environment variables are absent.
const DEFAULT_FEEDS_FILE: &str = "feeds.json";
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 900;
const DEFAULT_SYNC_MAX_CONCURRENT: usize = 3;
const DEFAULT_FEED_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FEED_MAX_RETRIES: u32 = 2;
const DEFAULT_AI_ANALYSIS_ENABLED: bool = true;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    database_url: Option<String>,
    feeds_file: PathBuf,
    sync_interval: Duration,
    sync_max_concurrent: usize,
    feed_timeout: Duration,
    feed_max_retries: u32,
    ai_analysis_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            feeds_file: PathBuf::from(DEFAULT_FEEDS_FILE),
            sync_interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            sync_max_concurrent: DEFAULT_SYNC_MAX_CONCURRENT,
            feed_timeout: Duration::from_secs(DEFAULT_FEED_TIMEOUT_SECS),
            feed_max_retries: DEFAULT_FEED_MAX_RETRIES,
            ai_analysis_enabled: DEFAULT_AI_ANALYSIS_ENABLED,
        }
    }
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var(ENV_DATABASE_URL)
            .ok()
            .filter(|url| !url.trim().is_empty());
        let feeds_file = env::var(ENV_FEEDS_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_FEEDS_FILE));

        let sync_max_concurrent: usize =
            parse_var(ENV_SYNC_MAX_CONCURRENT, DEFAULT_SYNC_MAX_CONCURRENT)?;
        if sync_max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_SYNC_MAX_CONCURRENT,
                reason: "must be at least 1".into(),
            });
        }

        let sync_interval_secs: u64 = parse_var(ENV_SYNC_INTERVAL_SECS, DEFAULT_SYNC_INTERVAL_SECS)?;
        if sync_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_SYNC_INTERVAL_SECS,
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            database_url,
            feeds_file,
            sync_interval: Duration::from_secs(sync_interval_secs),
            sync_max_concurrent,
            feed_timeout: Duration::from_secs(parse_var(
                ENV_FEED_TIMEOUT_SECS,
                DEFAULT_FEED_TIMEOUT_SECS,
            )?),
            feed_max_retries: parse_var(ENV_FEED_MAX_RETRIES, DEFAULT_FEED_MAX_RETRIES)?,
            ai_analysis_enabled: parse_bool(ENV_AI_ANALYSIS_ENABLED, DEFAULT_AI_ANALYSIS_ENABLED)?,
        })
    }

    /// PostgreSQL URL; `None` selects the in-memory store.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
    pub fn feeds_file(&self) -> &Path {
        &self.feeds_file
    }
    pub fn sync_interval(&self) -> Duration {
        self.sync_interval
    }
    pub fn sync_max_concurrent(&self) -> usize {
        self.sync_max_concurrent
    }
    pub fn feed_timeout(&self) -> Duration {
        self.feed_timeout
    }
    pub fn feed_max_retries(&self) -> u32 {
        self.feed_max_retries
    }
    pub fn ai_analysis_enabled(&self) -> bool {
        self.ai_analysis_enabled
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.sync_interval,
            max_concurrent: self.sync_max_concurrent,
            ai_analysis_enabled: self.ai_analysis_enabled,
        }
    }
}

/// Reads the feed policies listed in `path` (a JSON array of feeds).
pub fn load_feeds(path: &Path) -> Result<Vec<RssFeed>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::FeedsFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::FeedsFormat {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_var<T: FromStr>(field: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(field) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field,
            reason: format!("{raw:?}: {e}"),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(field: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(field) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                field,
                reason: format!("{raw:?} is not a boolean"),
            }),
        },
        Err(_) => Ok(default),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("cannot read feeds file {}: {source}", path.display())]
    FeedsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("feeds file {} is not a JSON array of feeds: {source}", path.display())]
    FeedsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_DATABASE_URL,
            ENV_FEEDS_FILE,
            ENV_SYNC_INTERVAL_SECS,
            ENV_SYNC_MAX_CONCURRENT,
            ENV_FEED_TIMEOUT_SECS,
            ENV_FEED_MAX_RETRIES,
            ENV_AI_ANALYSIS_ENABLED,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.database_url().is_none());
        assert_eq!(cfg.sync_max_concurrent(), 3);
        assert_eq!(cfg.sync_interval(), Duration::from_secs(900));
        assert!(cfg.ai_analysis_enabled());
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_DATABASE_URL, "postgres://user:pw@db:5432/syndicator");
            env::set_var(ENV_FEEDS_FILE, "/etc/syndicator/feeds.json");
            env::set_var(ENV_SYNC_INTERVAL_SECS, "60");
            env::set_var(ENV_SYNC_MAX_CONCURRENT, "8");
            env::set_var(ENV_FEED_TIMEOUT_SECS, "5");
            env::set_var(ENV_FEED_MAX_RETRIES, "0");
            env::set_var(ENV_AI_ANALYSIS_ENABLED, "off");
        }
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.database_url(), Some("postgres://user:pw@db:5432/syndicator"));
        assert_eq!(cfg.feeds_file(), Path::new("/etc/syndicator/feeds.json"));
        assert_eq!(cfg.sync_interval(), Duration::from_secs(60));
        assert_eq!(cfg.sync_max_concurrent(), 8);
        assert_eq!(cfg.feed_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.feed_max_retries(), 0);
        assert!(!cfg.ai_analysis_enabled());
        assert_eq!(cfg.scheduler_config().max_concurrent, 8);
        clear_env();
    }

    #[test]
    fn rejects_invalid_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_SYNC_MAX_CONCURRENT, "0");
        }
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: ENV_SYNC_MAX_CONCURRENT, .. }));

        unsafe {
            env::set_var(ENV_SYNC_MAX_CONCURRENT, "three");
        }
        assert!(Config::from_env().is_err());

        clear_env();
        unsafe {
            env::set_var(ENV_AI_ANALYSIS_ENABLED, "maybe");
        }
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().starts_with("invalid value for 'AI_ANALYSIS_ENABLED'"));
        clear_env();
    }

    #[test]
    fn loads_feeds_file() {
        let path = env::temp_dir().join(format!("feeds-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"[{"id":"blog","url":"https://blog.example.com/feed","name":"Blog","auto_publish":true,"minimum_quality_score":60}]"#,
        )
        .unwrap();

        let feeds = load_feeds(&path).unwrap();
        assert_eq!(feeds.len(), 1);
        assert!(feeds[0].auto_publish);
        assert_eq!(feeds[0].minimum_quality_score, Some(60));
        assert!(feeds[0].include_keywords.is_empty());
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(load_feeds(&path), Err(ConfigError::FeedsFile { .. })));
    }
}
