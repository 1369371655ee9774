// src/render/mod.rs
// =============================================================================
// The page-fetch collaborator: something that can load a URL, run its
// JavaScript, and tell us which links the resulting DOM contains.
//
// Submodules:
// - anchors: pulls <a> targets out of rendered HTML (scraper)
// - chrome: the real implementation, headless Chromium (chromiumoxide)
// - fake (tests only): an in-memory site
//
// The crawl engine only ever sees the PageFetcher trait.
// =============================================================================

mod anchors;
mod chrome;
#[cfg(test)]
pub mod fake;

pub use anchors::extract_anchor_hrefs;
pub use chrome::{ChromeFetcher, ChromeOptions, ChromeSession};

use crate::error::PageError;
use async_trait::async_trait;
use std::time::Duration;

/// One rendering session, driven by one traversal at a time.
#[async_trait]
pub trait PageFetcher: Send {
    /// Loads `url`, replacing whatever page was loaded before.
    async fn navigate(&mut self, url: &str) -> Result<(), PageError>;

    /// Waits for script-driven content to stop changing.
    ///
    /// `Ok(false)` means the budget ran out first.
    async fn wait_until_settled(&mut self, timeout: Duration) -> Result<bool, PageError>;

    /// The target of every `<a>` element on the current page, in document
    /// order. `None` for anchors without an `href`.
    async fn extract_anchor_hrefs(&mut self) -> Result<Vec<Option<String>>, PageError>;
}
