// src/crawl/frontier.rs
// =============================================================================
// The two pieces of state a traversal owns:
//
// - Frontier: FIFO queue of URLs waiting to be visited, handed out level by
//   level. When a level starts we snapshot the queue length and hand out
//   exactly that many URLs before starting the next level, so everything
//   discovered at depth d is visited before anything from depth d+1.
//   No per-URL depth is stored.
//
// - VisitedSet: every URL we have already seen, whether we visited it,
//   rejected it, or were told by robots.txt not to touch it. It only grows.
//
// Rust concepts:
// - VecDeque: push_back() to enqueue, pop_front() to dequeue
// - HashSet::insert returns false when the value was already there, which
//   gives us check-and-mark in a single call
// =============================================================================

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    // URLs still to hand out from the current level's snapshot
    remaining_in_level: usize,
    // 0 before the first pop; the seed is level 1
    level: usize,
}

impl Frontier {
    /// A frontier holding only the seed.
    pub fn new(seed: String) -> Self {
        Self {
            queue: VecDeque::from([seed]),
            ..Self::default()
        }
    }

    /// A frontier with nothing to do.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: String) {
        self.queue.push_back(url);
    }

    /// Next URL in breadth-first order, or None once the queue is drained.
    pub fn pop(&mut self) -> Option<String> {
        if self.remaining_in_level == 0 {
            if self.queue.is_empty() {
                return None;
            }
            self.remaining_in_level = self.queue.len();
            self.level += 1;
        }

        self.remaining_in_level -= 1;
        self.queue.pop_front()
    }

    /// Level of the URL most recently popped.
    pub fn level(&self) -> usize {
        self.level
    }
}

#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
}

impl VisitedSet {
    /// Marks `url` as seen. Returns false if it already was.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.seen.insert(url.into())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

impl FromIterator<String> for VisitedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            seen: iter.into_iter().collect(),
        }
    }
}
