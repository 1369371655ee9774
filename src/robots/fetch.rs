// src/robots/fetch.rs
// =============================================================================
// This module resolves a domain's exclusion policy over HTTP.
//
// Strategy:
// - GET <seed>/robots.txt with a dedicated reqwest client
// - Anything other than a readable 2xx robots file means "no restrictions"
// - A file that addresses a named agent means "touch nothing on this domain",
//   and the domain goes to the refusal log
//
// Note the asymmetry: a missing or broken robots.txt lets us crawl everything,
// while a well-formed one with a named agent group blocks everything.
// =============================================================================

use crate::error::PolicyError;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::audit::RefusalLog;
use super::policy::{ExclusionPolicy, RobotsFile};

/// Fetches and interprets robots.txt files.
#[derive(Debug, Clone)]
pub struct ExclusionResolver {
    client: Client,
    refusals: RefusalLog,
}

impl ExclusionResolver {
    /// Builds the resolver's HTTP client.
    ///
    /// This is the one failure in policy resolution that reaches the caller:
    /// without a client there is nothing to degrade from.
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        refusals: RefusalLog,
    ) -> Result<Self, PolicyError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(PolicyError::Client)?;

        Ok(Self { client, refusals })
    }

    /// Resolves the policy published at `robots_url`.
    ///
    /// Never fails: fetch and parse problems are logged and yield
    /// `ExclusionPolicy::unrestricted()`.
    pub async fn resolve(&self, robots_url: &Url) -> ExclusionPolicy {
        let body = match self.fetch(robots_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "no usable robots.txt, crawling without restrictions");
                return ExclusionPolicy::unrestricted();
            }
        };

        match interpret(robots_url, &body) {
            Ok(Interpretation::Refused(policy)) => {
                self.refusals
                    .record(&robots_url.origin().ascii_serialization())
                    .await;
                policy
            }
            Ok(Interpretation::Allowed(policy)) => {
                info!(
                    disallowed = policy.disallowed().count(),
                    "robots.txt resolved"
                );
                policy
            }
            Err(e) => {
                warn!(error = %e, "no usable robots.txt, crawling without restrictions");
                ExclusionPolicy::unrestricted()
            }
        }
    }

    // GET the file and hand back its body as text
    async fn fetch(&self, url: &Url) -> Result<String, PolicyError> {
        debug!(url = %url, "fetching robots.txt");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|source| PolicyError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PolicyError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // text() honours the Content-Type charset and strips a BOM
        response.text().await.map_err(|source| PolicyError::Fetch {
            url: url.to_string(),
            source,
        })
    }
}

// What a successfully parsed file means for this crawler
#[derive(Debug)]
enum Interpretation {
    Allowed(ExclusionPolicy),
    Refused(ExclusionPolicy),
}

fn interpret(robots_url: &Url, body: &str) -> Result<Interpretation, PolicyError> {
    let robots = RobotsFile::parse(body).map_err(|reason| PolicyError::Parse {
        url: robots_url.to_string(),
        reason,
    })?;

    if robots.restricts_specific_agent() {
        return Ok(Interpretation::Refused(ExclusionPolicy::block_all(robots_url)));
    }

    Ok(Interpretation::Allowed(ExclusionPolicy::from_robots(
        &robots, robots_url,
    )))
}
