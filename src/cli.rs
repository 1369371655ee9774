// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl:  render pages from a seed URL and print every link discovered
// - robots: only resolve and print the seed's robots.txt policy
//
// Flags shared by both (robots.txt client settings) live in PolicyArgs and
// are pulled into each subcommand with #[command(flatten)].
//
// Rust concepts:
// - Derive macros: Parser, Subcommand and Args generate the parsing code
// - From trait: turns parsed arguments into a CrawlConfig
// =============================================================================

use clap::{Args, Parser, Subcommand};
use robots_walker::config::CrawlConfig;
use robots_walker::robots::DEFAULT_REFUSAL_LOG;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when --chrome is not given
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

#[derive(Parser, Debug)]
#[command(
    name = "robots-walker",
    version,
    about = "Breadth-first link discovery over JavaScript-rendered pages",
    long_about = "robots-walker loads a site in headless Chromium, waits for each page to settle, \
                  and walks its links breadth-first without leaving the seed's host. \
                  The site's robots.txt is honoured; domains that single out named crawlers \
                  are not touched at all."
)]
pub struct Cli {
    /// Log debug output from the crawler (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and print every link discovered
    ///
    /// Example: robots-walker crawl https://example.com --max-links 100
    Crawl(CrawlArgs),

    /// Show how a website's robots.txt would be applied, without crawling
    ///
    /// Example: robots-walker robots https://example.com
    Robots {
        /// Website URL whose robots.txt to resolve
        website_url: String,

        /// Output the policy in JSON format
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Website URL to start from (e.g., https://example.com)
    ///
    /// A trailing slash is added if missing; robots.txt is looked up
    /// right under it.
    pub website_url: String,

    /// Print a JSON report at the end instead of one line per link
    #[arg(long)]
    pub json: bool,

    /// Stop after this many links
    #[arg(long)]
    pub max_links: Option<usize>,

    /// Seconds a page may take to settle after loading
    #[arg(long, default_value_t = 10)]
    pub settle_timeout: u64,

    /// Seconds a page may take to load
    #[arg(long, default_value_t = 30)]
    pub navigation_timeout: u64,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Path to the Chrome/Chromium binary
    ///
    /// Falls back to $CHROMIUM_PATH, then to the usual install locations.
    #[arg(long)]
    pub chrome: Option<PathBuf>,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// robots.txt client settings.
#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Seconds to wait for robots.txt
    #[arg(long, default_value_t = 10)]
    pub policy_timeout: u64,

    /// User-Agent header sent with the robots.txt request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// File that refused domains are appended to
    #[arg(long, default_value = DEFAULT_REFUSAL_LOG)]
    pub refusal_log: PathBuf,

    /// Don't write refused domains to a file (they are still logged)
    #[arg(long, conflicts_with = "refusal_log")]
    pub no_refusal_log: bool,
}

impl PolicyArgs {
    /// Copies the robots.txt settings into `config`.
    pub fn apply(&self, config: &mut CrawlConfig) {
        config.policy_timeout = Duration::from_secs(self.policy_timeout);
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        config.refusal_log = if self.no_refusal_log {
            None
        } else {
            Some(self.refusal_log.clone())
        };
    }
}

impl From<&CrawlArgs> for CrawlConfig {
    fn from(args: &CrawlArgs) -> Self {
        let mut config = CrawlConfig {
            settle_timeout: Duration::from_secs(args.settle_timeout),
            navigation_timeout: Duration::from_secs(args.navigation_timeout),
            headless: !args.headed,
            chrome_executable: args
                .chrome
                .clone()
                .or_else(|| std::env::var_os(CHROMIUM_PATH_ENV).map(PathBuf::from)),
            ..CrawlConfig::default()
        };
        args.policy.apply(&mut config);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawl_args(argv: &[&str]) -> CrawlArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Crawl(args) => args,
            other => panic!("expected crawl, got {:?}", other),
        }
    }

    #[test]
    fn test_crawl_defaults() {
        let args = crawl_args(&["robots-walker", "crawl", "https://example.com"]);
        assert_eq!(args.website_url, "https://example.com");
        assert!(!args.json);
        assert_eq!(args.max_links, None);

        let config = CrawlConfig::from(&args);
        assert_eq!(config.settle_timeout, Duration::from_secs(10));
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));
        assert_eq!(config.policy_timeout, Duration::from_secs(10));
        assert!(config.headless);
        assert_eq!(
            config.refusal_log.as_deref(),
            Some(std::path::Path::new(DEFAULT_REFUSAL_LOG))
        );
    }

    #[test]
    fn test_crawl_flags() {
        let args = crawl_args(&[
            "robots-walker",
            "crawl",
            "https://example.com",
            "--json",
            "--max-links",
            "25",
            "--settle-timeout",
            "3",
            "--headed",
            "--chrome",
            "/opt/chromium/chrome",
            "--user-agent",
            "test-agent",
            "--no-refusal-log",
        ]);
        assert!(args.json);
        assert_eq!(args.max_links, Some(25));

        let config = CrawlConfig::from(&args);
        assert_eq!(config.settle_timeout, Duration::from_secs(3));
        assert!(!config.headless);
        assert_eq!(
            config.chrome_executable.as_deref(),
            Some(std::path::Path::new("/opt/chromium/chrome"))
        );
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.refusal_log, None);
    }

    #[test]
    fn test_robots_subcommand() {
        let cli = Cli::try_parse_from([
            "robots-walker",
            "-v",
            "robots",
            "https://example.com",
            "--refusal-log",
            "refused.txt",
        ])
        .unwrap();
        assert!(cli.verbose);

        let Commands::Robots { website_url, json, policy } = cli.command else {
            panic!("expected robots");
        };
        assert_eq!(website_url, "https://example.com");
        assert!(!json);

        let mut config = CrawlConfig::default();
        policy.apply(&mut config);
        assert_eq!(
            config.refusal_log.as_deref(),
            Some(std::path::Path::new("refused.txt"))
        );
    }

    #[test]
    fn test_refusal_log_flags_conflict() {
        let result = Cli::try_parse_from([
            "robots-walker",
            "robots",
            "https://example.com",
            "--refusal-log",
            "x.txt",
            "--no-refusal-log",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_url_is_required() {
        assert!(Cli::try_parse_from(["robots-walker", "crawl"]).is_err());
    }
}
