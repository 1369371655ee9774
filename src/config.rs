// src/config.rs
// =============================================================================
// Settings for one crawl, with defaults. The binary fills this in from the
// command line (see cli.rs); tests build it directly.
// =============================================================================

use crate::robots::{RefusalLog, DEFAULT_REFUSAL_LOG};
use std::path::PathBuf;
use std::time::Duration;

/// Identifies us to servers when fetching robots.txt
pub const DEFAULT_USER_AGENT: &str = concat!("robots-walker/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// How long a page may take to settle after navigation
    pub settle_timeout: Duration,
    /// How long navigation itself may take
    pub navigation_timeout: Duration,
    /// Request timeout for the robots.txt fetch
    pub policy_timeout: Duration,
    pub user_agent: String,
    /// Where refused domains are appended; None logs them only
    pub refusal_log: Option<PathBuf>,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            settle_timeout: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(30),
            policy_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            refusal_log: Some(PathBuf::from(DEFAULT_REFUSAL_LOG)),
            headless: true,
            chrome_executable: None,
        }
    }
}

impl CrawlConfig {
    pub fn refusals(&self) -> RefusalLog {
        match &self.refusal_log {
            Some(path) => RefusalLog::to_file(path),
            None => RefusalLog::disabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.settle_timeout, Duration::from_secs(10));
        assert!(config.headless);
        assert_eq!(
            config.refusal_log.as_deref(),
            Some(std::path::Path::new("not_allowed_to_query.txt"))
        );
        assert!(config.user_agent.starts_with("robots-walker/"));
    }

    #[tokio::test]
    async fn test_refusals_follow_refusal_log_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refused.txt");

        let enabled = CrawlConfig {
            refusal_log: Some(path.clone()),
            ..CrawlConfig::default()
        };
        assert_eq!(enabled.refusals().path(), Some(path.as_path()));

        let disabled = CrawlConfig {
            refusal_log: None,
            ..CrawlConfig::default()
        };
        let log = disabled.refusals();
        assert_eq!(log.path(), None);

        log.record("https://a.example").await;
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
