// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Install the tracing subscriber (logs go to stderr, links to stdout)
// 3. Dispatch to the subcommand handler
// 4. Exit with proper code (0 = done, 1 = incomplete result, 2 = error)
//
// Rust concepts used:
// - async/await: the crawl drives a browser and an HTTP client
// - Result<T, E> with anyhow: any startup failure bubbles up to main()
// - match: Pattern matching to handle different subcommands
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, CrawlArgs, PolicyArgs};
use robots_walker::config::CrawlConfig;
use robots_walker::crawl::{self, CrawlStats, Crawler, SameHost};
use robots_walker::render::{ChromeOptions, ChromeSession};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

// Printed with --json once the crawl is over
#[derive(Debug, Serialize)]
struct CrawlReport {
    seed: String,
    links: Vec<String>,
    stats: CrawlStats,
}

// Printed by the robots subcommand with --json
#[derive(Debug, Serialize)]
struct PolicyReport {
    seed: String,
    refused: bool,
    seed_excluded: bool,
    disallowed: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Other crates (chromiumoxide in particular) only get to speak up at warn
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info,robots_walker=debug"
    } else {
        "warn,robots_walker=info"
    }
}

fn init_tracing(verbose: bool) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose).into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

// Returns:
//   Ok(0) = finished
//   Ok(1) = finished, but the result is incomplete
//   Err   = could not get started
async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Crawl(args) => handle_crawl(&args).await,
        Commands::Robots {
            website_url,
            json,
            policy,
        } => handle_robots(&website_url, json, &policy).await,
    }
}

// Handles the 'crawl' subcommand
async fn handle_crawl(args: &CrawlArgs) -> Result<i32> {
    let config = CrawlConfig::from(args);
    let seed = crawl::normalize_seed(&args.website_url)?;
    let crawler = Crawler::new(&config).context("Failed to set up the robots.txt client")?;

    if !args.json {
        println!("🔍 Crawling: {}", seed);
    }

    let options = ChromeOptions {
        headless: config.headless,
        executable: config.chrome_executable.clone(),
        ..ChromeOptions::default()
    };
    let session = ChromeSession::launch(&options).await?;

    // The browser is closed whether or not the crawl got going
    let result = collect_links(&session, &crawler, &seed, &config, args).await;
    session.close().await;
    let report = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("📊 Summary:");
        println!("   🔗 Links found: {}", report.links.len());
        println!("   📄 Pages rendered: {}", report.stats.pages_visited);
        println!("   ⏭️  Pages skipped: {}", report.stats.pages_skipped);
        println!("   🚫 Excluded by robots.txt: {}", report.stats.links_excluded);
    }

    if report.stats.truncated {
        Ok(1)
    } else {
        Ok(0)
    }
}

async fn collect_links(
    session: &ChromeSession,
    crawler: &Crawler,
    seed: &Url,
    config: &CrawlConfig,
    args: &CrawlArgs,
) -> Result<CrawlReport> {
    let mut fetcher = session.new_fetcher(config.navigation_timeout).await?;
    let same_host = SameHost::of(seed).context("Seed URL has no host")?;

    let mut traversal = crawler
        .traverse(seed.as_str(), &mut fetcher, same_host)
        .await?;

    let mut links = Vec::new();
    loop {
        if args.max_links.is_some_and(|max| links.len() >= max) {
            info!(max_links = links.len(), "link limit reached, stopping crawl");
            break;
        }
        let Some(link) = traversal.next_link().await else {
            break;
        };
        if !args.json {
            println!("Found link: {}", link);
        }
        links.push(link);
    }

    Ok(CrawlReport {
        seed: seed.to_string(),
        links,
        stats: traversal.stats(),
    })
}

// Handles the 'robots' subcommand
async fn handle_robots(website_url: &str, json: bool, policy_args: &PolicyArgs) -> Result<i32> {
    let mut config = CrawlConfig::default();
    policy_args.apply(&mut config);

    let seed = crawl::normalize_seed(website_url)?;
    let crawler = Crawler::new(&config).context("Failed to set up the robots.txt client")?;
    let policy = crawler.resolve_policy(&seed).await;

    let report = PolicyReport {
        seed: seed.to_string(),
        refused: policy.blocks_all(),
        seed_excluded: policy.excludes_seed(&seed),
        disallowed: policy.disallowed().map(str::to_string).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.refused {
        println!("⛔ {} addresses named crawlers; the whole domain is off-limits", seed);
    } else if report.disallowed.is_empty() {
        println!("✅ No restrictions for {}", seed);
    } else {
        println!("📋 Disallowed under {}:", seed);
        for entry in &report.disallowed {
            println!("   {}", entry);
        }
        if report.seed_excluded {
            println!("⚠️  The seed itself is excluded; a crawl would find nothing");
        }
    }

    if report.seed_excluded {
        Ok(1)
    } else {
        Ok(0)
    }
}
