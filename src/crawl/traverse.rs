// src/crawl/traverse.rs
// =============================================================================
// The traversal engine: breadth-first link discovery over rendered pages.
//
// How it works:
// 1. Resolve the seed's robots.txt into an ExclusionPolicy
// 2. Pre-load the visited set with the policy's entries, queue the seed
// 3. Visit queued URLs level by level: navigate, wait for the page to settle,
//    read its anchors
// 4. Each anchor target we haven't seen is marked seen, then checked against
//    robots.txt and the caller's predicate; survivors are queued and yielded
//
// The result is a pull cursor: every call to next_link() runs the crawl just
// far enough to produce one more link. Dropping the Traversal stops the crawl.
//
// Failures stay local. A page that won't load or won't settle is skipped and
// the crawl moves on. Only losing the browser itself ends the sequence early.
// =============================================================================

use super::accept::AcceptancePredicate;
use super::frontier::{Frontier, VisitedSet};
use crate::config::CrawlConfig;
use crate::error::{CrawlError, PageError, PolicyError};
use crate::render::PageFetcher;
use crate::robots::{ExclusionPolicy, ExclusionResolver};
use futures::Stream;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use url::Url;

/// Name of the exclusion policy file, relative to the seed
const POLICY_RESOURCE: &str = "robots.txt";

/// Counters for one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Pages whose anchors were read
    pub pages_visited: usize,
    /// Pages skipped after a navigation, settle or extraction failure
    pub pages_skipped: usize,
    /// Distinct anchor targets seen for the first time
    pub links_discovered: usize,
    /// Of those, dropped because robots.txt excludes them
    pub links_excluded: usize,
    /// Of those, dropped by the acceptance predicate
    pub links_rejected: usize,
    /// Of those, queued and yielded
    pub links_accepted: usize,
    /// The rendering session died before the frontier was exhausted
    pub truncated: bool,
}

/// Resolves robots.txt and starts traversals.
#[derive(Debug, Clone)]
pub struct Crawler {
    resolver: ExclusionResolver,
    settle_timeout: Duration,
}

impl Crawler {
    /// Fails only if the robots.txt HTTP client can't be built.
    pub fn new(config: &CrawlConfig) -> Result<Self, PolicyError> {
        let resolver = ExclusionResolver::new(
            &config.user_agent,
            config.policy_timeout,
            config.refusals(),
        )?;

        Ok(Self {
            resolver,
            settle_timeout: config.settle_timeout,
        })
    }

    /// Starts a traversal from `seed`.
    ///
    /// The seed's robots.txt is fetched before this returns. The only error
    /// is a seed that isn't an http(s) URL.
    pub async fn traverse<'f, F, A>(
        &self,
        seed: &str,
        fetcher: &'f mut F,
        accept: A,
    ) -> Result<Traversal<'f, F, A>, CrawlError>
    where
        F: PageFetcher + ?Sized,
        A: AcceptancePredicate,
    {
        let seed = normalize_seed(seed)?;
        let span = info_span!("crawl", seed = %seed);

        let policy = self.resolve_policy(&seed).instrument(span.clone()).await;

        Ok(Traversal::start(seed, policy, fetcher, accept, self.settle_timeout, span))
    }

    /// Fetches and interprets the robots.txt that governs `seed`.
    pub async fn resolve_policy(&self, seed: &Url) -> ExclusionPolicy {
        // Plain concatenation: a seed of https://ex.org/docs/ looks for
        // https://ex.org/docs/robots.txt
        match Url::parse(&format!("{}{}", seed, POLICY_RESOURCE)) {
            Ok(robots_url) => self.resolver.resolve(&robots_url).await,
            Err(e) => {
                warn!(seed = %seed, error = %e, "cannot build robots.txt URL, crawling without restrictions");
                ExclusionPolicy::unrestricted()
            }
        }
    }
}

/// A running breadth-first crawl.
///
/// Owns the frontier and visited set; borrows the page fetcher exclusively
/// for as long as it lives.
pub struct Traversal<'f, F: ?Sized, A> {
    fetcher: &'f mut F,
    accept: A,
    policy: ExclusionPolicy,
    frontier: Frontier,
    visited: VisitedSet,
    // Anchor targets of the page being worked through
    pending: VecDeque<String>,
    settle_timeout: Duration,
    stats: CrawlStats,
    finished: bool,
    span: Span,
}

// What happened to one dequeued URL
enum Visit {
    Rendered(Vec<Option<String>>),
    Skipped,
    SessionLost(String),
}

impl<'f, F, A> Traversal<'f, F, A>
where
    F: PageFetcher + ?Sized,
    A: AcceptancePredicate,
{
    /// Starts a traversal with an already-resolved policy, skipping the
    /// robots.txt fetch.
    pub fn with_policy(
        seed: &str,
        policy: ExclusionPolicy,
        fetcher: &'f mut F,
        accept: A,
        settle_timeout: Duration,
    ) -> Result<Self, CrawlError> {
        let seed = normalize_seed(seed)?;
        let span = info_span!("crawl", seed = %seed);
        Ok(Self::start(seed, policy, fetcher, accept, settle_timeout, span))
    }

    fn start(
        seed: Url,
        policy: ExclusionPolicy,
        fetcher: &'f mut F,
        accept: A,
        settle_timeout: Duration,
        span: Span,
    ) -> Self {
        let seed_str = seed.to_string();
        let mut visited: VisitedSet = policy.entries().into_iter().collect();

        // The seed is never queued twice, even if a page links back to it
        visited.insert(seed_str.clone());

        let frontier = if policy.excludes_seed(&seed) {
            info!(parent: &span, "seed is excluded by robots.txt, nothing to crawl");
            Frontier::empty()
        } else {
            info!(
                parent: &span,
                disallowed = policy.disallowed().count(),
                "crawl started"
            );
            Frontier::new(seed_str)
        };

        Self {
            fetcher,
            accept,
            policy,
            frontier,
            visited,
            pending: VecDeque::new(),
            settle_timeout,
            stats: CrawlStats::default(),
            finished: false,
            span,
        }
    }

    /// Runs the crawl until the next accepted link, or to the end.
    ///
    /// Returns None once the frontier is exhausted (or the rendering session
    /// is lost), and keeps returning None after that.
    pub async fn next_link(&mut self) -> Option<String> {
        let span = self.span.clone();
        self.advance().instrument(span).await
    }

    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    /// The policy this traversal is honouring.
    pub fn policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    /// Adapts the cursor into a Stream of links.
    pub fn into_stream(self) -> impl Stream<Item = String> + 'f
    where
        A: 'f,
    {
        futures::stream::unfold(self, |mut traversal| async move {
            traversal.next_link().await.map(|link| (link, traversal))
        })
    }

    async fn advance(&mut self) -> Option<String> {
        loop {
            while let Some(href) = self.pending.pop_front() {
                if let Some(link) = self.consider(href) {
                    return Some(link);
                }
            }

            if self.finished {
                return None;
            }

            let Some(url) = self.frontier.pop() else {
                self.finish();
                return None;
            };

            match self.visit(&url).await {
                Visit::Rendered(hrefs) => {
                    self.stats.pages_visited += 1;
                    self.pending
                        .extend(hrefs.into_iter().flatten().filter(|href| !href.is_empty()));
                }
                Visit::Skipped => self.stats.pages_skipped += 1,
                Visit::SessionLost(reason) => {
                    error!(url = %url, reason = %reason, "rendering session lost, stopping crawl");
                    self.stats.truncated = true;
                    self.finish();
                    return None;
                }
            }
        }
    }

    // Navigate, settle, read anchors. Any per-page failure means skip.
    async fn visit(&mut self, url: &str) -> Visit {
        debug!(url = %url, level = self.frontier.level(), "visiting");

        if let Err(e) = self.fetcher.navigate(url).await {
            return skip(url, e);
        }

        match self.fetcher.wait_until_settled(self.settle_timeout).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(url = %url, timeout = ?self.settle_timeout, "page did not settle in time, skipping");
                return Visit::Skipped;
            }
            Err(e) => return skip(url, e),
        }

        match self.fetcher.extract_anchor_hrefs().await {
            Ok(hrefs) => Visit::Rendered(hrefs),
            Err(e) => skip(url, e),
        }
    }

    // Seen check first, then robots, then the predicate. A URL is judged
    // once; whatever the verdict, it stays in the visited set.
    fn consider(&mut self, href: String) -> Option<String> {
        if !self.visited.insert(href.as_str()) {
            return None;
        }
        self.stats.links_discovered += 1;

        if self.excluded_by_policy(&href) {
            debug!(url = %href, "excluded by robots.txt");
            self.stats.links_excluded += 1;
            return None;
        }

        if !self.accept.accepts(&href) {
            debug!(url = %href, "rejected by acceptance predicate");
            self.stats.links_rejected += 1;
            return None;
        }

        self.stats.links_accepted += 1;
        self.frontier.push(href.clone());
        Some(href)
    }

    fn excluded_by_policy(&self, href: &str) -> bool {
        Url::parse(href)
            .map(|url| self.policy.is_excluded(&url))
            .unwrap_or(false)
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        info!(
            parent: &self.span,
            pages_visited = self.stats.pages_visited,
            pages_skipped = self.stats.pages_skipped,
            links_accepted = self.stats.links_accepted,
            seen = self.visited.len(),
            truncated = self.stats.truncated,
            "crawl finished"
        );
    }
}

fn skip(url: &str, error: PageError) -> Visit {
    match error {
        PageError::Session(reason) => Visit::SessionLost(reason),
        other => {
            debug!(url = %url, error = %other, "skipping page");
            Visit::Skipped
        }
    }
}

/// Parses the seed, making sure it ends with a `/`.
pub fn normalize_seed(seed: &str) -> Result<Url, CrawlError> {
    let seed = seed.trim();
    let with_slash = if seed.ends_with('/') {
        seed.to_string()
    } else {
        format!("{}/", seed)
    };

    let url = Url::parse(&with_slash).map_err(|source| CrawlError::InvalidSeed {
        url: seed.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CrawlError::UnsupportedScheme(seed.to_string()));
    }

    Ok(url)
}
