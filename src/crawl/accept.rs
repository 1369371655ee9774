// src/crawl/accept.rs
// =============================================================================
// Acceptance predicates: the caller's say in which discovered links are worth
// following. The engine asks only after a link has passed the visited and
// robots checks, and never asks twice about the same URL.
//
// Any `Fn(&str) -> bool` closure works. SameHost is what the binary uses to
// keep a crawl on the seed's own host.
// =============================================================================

use url::Url;

/// Decides whether a discovered URL should be yielded and followed.
pub trait AcceptancePredicate {
    fn accepts(&self, url: &str) -> bool;
}

impl<F> AcceptancePredicate for F
where
    F: Fn(&str) -> bool,
{
    fn accepts(&self, url: &str) -> bool {
        self(url)
    }
}

/// Accepts http(s) URLs on exactly the seed's host, whatever the scheme.
///
/// Subdomains count as other hosts. The port matters only when the seed
/// spells one out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SameHost {
    host: String,
    // Explicit port of the seed, if any
    port: Option<u16>,
}

impl SameHost {
    /// Host of `seed`, or None when the URL has no host (e.g. `data:`).
    pub fn of(seed: &Url) -> Option<Self> {
        Some(Self {
            host: seed.host_str()?.to_ascii_lowercase(),
            port: seed.port(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl AcceptancePredicate for SameHost {
    fn accepts(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        url.host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.host))
            && self
                .port
                .map_or(true, |port| url.port_or_known_default() == Some(port))
    }
}
