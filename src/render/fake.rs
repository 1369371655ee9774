// src/render/fake.rs
// An in-memory site for exercising the crawl engine without a browser.

use super::PageFetcher;
use crate::error::PageError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct FakeSite {
    pages: HashMap<String, Vec<Option<String>>>,
    never_settles: HashSet<String>,
    session_dies_at: Option<String>,
    current: Option<String>,
    /// Every URL navigate() was called with, in order
    pub navigations: Vec<String>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page whose anchors point at `links`.
    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            links.iter().map(|link| Some(link.to_string())).collect(),
        );
        self
    }

    /// A page with raw anchors, `None` standing for an anchor without href.
    pub fn raw_page(mut self, url: &str, anchors: Vec<Option<&str>>) -> Self {
        self.pages.insert(
            url.to_string(),
            anchors.into_iter().map(|a| a.map(str::to_string)).collect(),
        );
        self
    }

    /// A page that loads but never finishes settling.
    pub fn slow_page(mut self, url: &str, links: &[&str]) -> Self {
        self.never_settles.insert(url.to_string());
        self.page(url, links)
    }

    /// Navigating to `url` reports the browser as gone.
    pub fn session_dies_at(mut self, url: &str) -> Self {
        self.session_dies_at = Some(url.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        self.navigations.push(url.to_string());

        if self.session_dies_at.as_deref() == Some(url) {
            return Err(PageError::Session("browser crashed".to_string()));
        }
        if !self.pages.contains_key(url) {
            self.current = None;
            return Err(PageError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }

        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_until_settled(&mut self, _timeout: Duration) -> Result<bool, PageError> {
        Ok(match &self.current {
            Some(url) => !self.never_settles.contains(url),
            None => false,
        })
    }

    async fn extract_anchor_hrefs(&mut self) -> Result<Vec<Option<String>>, PageError> {
        let url = self.current.clone().unwrap_or_default();
        self.pages
            .get(&url)
            .cloned()
            .ok_or(PageError::Extraction {
                url,
                reason: "no page loaded".to_string(),
            })
    }
}
