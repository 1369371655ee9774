// src/error.rs
// =============================================================================
// Typed errors for the crawler's library modules.
//
// Three families:
// - PolicyError: anything that goes wrong while getting robots.txt. Apart from
//   Client (we could not even build the HTTP client) these never escape the
//   resolver, they degrade to an empty policy.
// - PageError: what the page-fetch collaborator can report for one URL.
// - CrawlError: the only error a caller of Crawler::traverse can see.
//
// main.rs wraps these in anyhow::Error with some context.
// =============================================================================

use thiserror::Error;

/// Errors raised while resolving a site's exclusion policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The HTTP client itself could not be constructed
    #[error("failed to build policy HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Network-level failure (DNS, connect, timeout, body read)
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered, but not with a 2xx
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    /// 2xx, but the body is not a robots file we can read
    #[error("could not parse policy at {url}: {reason}")]
    Parse { url: String, reason: String },
}

/// Errors a page fetcher reports for the page it is currently driving.
#[derive(Debug, Error)]
pub enum PageError {
    /// Navigation failed or ran past its budget; skip this URL
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The DOM could not be read after the page settled; skip this URL
    #[error("could not read anchors from {url}: {reason}")]
    Extraction { url: String, reason: String },

    /// The rendering session is gone; nothing further can be fetched
    #[error("rendering session lost: {0}")]
    Session(String),
}

/// Errors returned before a traversal starts.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("seed URL '{0}' is not http(s)")]
    UnsupportedScheme(String),
}
