// src/lib.rs
// =============================================================================
// robots-walker: breadth-first link discovery over JavaScript-rendered pages,
// honouring the site's robots.txt.
//
// Modules:
// - config: settings for one crawl
// - crawl: the traversal engine (frontier, visited set, acceptance predicates)
// - render: the PageFetcher trait and its headless Chromium implementation
// - robots: fetching and interpreting robots.txt, plus the refusal log
// - error: error types shared by the above
//
// Typical use:
//
//     let crawler = Crawler::new(&CrawlConfig::default())?;
//     let mut traversal = crawler.traverse("https://example.com", &mut fetcher, same_host).await?;
//     while let Some(link) = traversal.next_link().await { ... }
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod render;
pub mod robots;
