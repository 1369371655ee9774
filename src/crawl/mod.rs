// src/crawl/mod.rs
// =============================================================================
// This module handles the crawl itself.
//
// Features:
// - Breadth-first traversal, level by level, starting from a seed URL
// - Visit-once: every URL is judged a single time, then remembered
// - robots.txt exclusions applied before the caller's acceptance predicate
// - A lazy result: links are produced one at a time as the crawl advances
//
// Submodules:
// - frontier: the queue and the visited set
// - accept: acceptance predicates (closures, SameHost)
// - traverse: Crawler and Traversal, the engine
// =============================================================================

mod accept;
mod frontier;
mod traverse;

pub use accept::{AcceptancePredicate, SameHost};
pub use traverse::{normalize_seed, CrawlStats, Crawler, Traversal};
