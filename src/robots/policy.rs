// src/robots/policy.rs
// =============================================================================
// This module turns the text of a robots.txt file into an ExclusionPolicy.
//
// Two steps:
// 1. RobotsFile::parse groups the file's lines into (user-agents, rules)
//    groups, following the usual robots grammar.
// 2. ExclusionPolicy is what the crawler actually consumes: a set of
//    disallowed path patterns, or a "block the whole domain" sentinel.
//
// The decision of which of the two a file produces lives in fetch.rs, next
// to the HTTP call and the refusal log, because it has a side effect.
// =============================================================================

use std::collections::BTreeSet;
use url::Url;

/// One `User-agent` group and the rules that followed it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    pub agents: Vec<String>,
    pub disallow: Vec<String>,
    pub allow: Vec<String>,
}

impl Group {
    /// A group that lists `*` among its agents applies to every crawler.
    pub fn is_universal(&self) -> bool {
        self.agents.iter().any(|agent| agent == "*")
    }
}

/// A parsed robots.txt file: just its groups, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsFile {
    pub groups: Vec<Group>,
}

// Where the parser is inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    // Between groups
    Idle,
    // Collected at least one User-agent line, no rules yet
    Agents,
    // Collected rules; the next User-agent line opens a new group
    Rules,
}

impl RobotsFile {
    /// Parses robots.txt content.
    ///
    /// Returns `Err(reason)` when the body plainly is not a robots file:
    /// it has content, but not a single `name: value` directive line. An
    /// HTML error page served with status 200 is the usual culprit.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut robots = RobotsFile::default();
        let mut group = Group::default();
        let mut state = State::Idle;

        let mut content_lines = 0usize;
        let mut directive_lines = 0usize;

        // A leading byte-order mark would glue itself to the first directive
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        for raw in content.lines() {
            // A blank line closes the current group. A comment-only line does not.
            if raw.trim().is_empty() {
                match state {
                    State::Agents => group = Group::default(),
                    State::Rules => robots.groups.push(std::mem::take(&mut group)),
                    State::Idle => {}
                }
                state = State::Idle;
                continue;
            }

            let line = match raw.find('#') {
                Some(idx) => &raw[..idx],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            content_lines += 1;

            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if !is_directive_name(name) {
                continue;
            }
            directive_lines += 1;

            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "user-agent" => {
                    if state == State::Rules {
                        robots.groups.push(std::mem::take(&mut group));
                    }
                    group.agents.push(value.to_string());
                    state = State::Agents;
                }
                "disallow" => {
                    // Rules before any User-agent line belong to no group
                    if state != State::Idle {
                        // An empty Disallow means "nothing is disallowed"
                        if !value.is_empty() {
                            group.disallow.push(value.to_string());
                        }
                        state = State::Rules;
                    }
                }
                "allow" => {
                    if state != State::Idle {
                        if !value.is_empty() {
                            group.allow.push(value.to_string());
                        }
                        state = State::Rules;
                    }
                }
                // Still rule lines as far as grouping goes, even though we
                // don't honour them
                "crawl-delay" | "request-rate" => {
                    if state != State::Idle {
                        state = State::Rules;
                    }
                }
                // Sitemap, Host and anything else
                _ => {}
            }
        }

        if state == State::Rules {
            robots.groups.push(group);
        }

        if content_lines > 0 && directive_lines == 0 {
            return Err(format!(
                "{} line(s) of content but no robots directives",
                content_lines
            ));
        }

        Ok(robots)
    }

    /// True when some group is addressed to a named agent instead of `*`.
    pub fn restricts_specific_agent(&self) -> bool {
        self.groups.iter().any(|group| !group.is_universal())
    }

    /// Disallow rules of every universal group, in file order.
    pub fn universal_disallows(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .filter(|group| group.is_universal())
            .flat_map(|group| group.disallow.iter().map(String::as_str))
    }

    /// Allow rules of every universal group, in file order.
    pub fn universal_allows(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .filter(|group| group.is_universal())
            .flat_map(|group| group.allow.iter().map(String::as_str))
    }
}

// "User-agent", "Disallow", "Crawl-delay", ... letters and dashes only.
// Keeps `<div style="color: red">` from counting as a directive.
fn is_directive_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
}

/// What the crawler is allowed to touch on one domain.
///
/// Immutable once built; one per crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionPolicy {
    // scheme://host[:port] of the domain the policy belongs to
    origin: Option<String>,
    // Host and explicit port, for judging links regardless of scheme
    site: Option<(String, Option<u16>)>,
    disallowed: BTreeSet<String>,
    allowed: Vec<String>,
    block_all: bool,
}

impl ExclusionPolicy {
    /// No robots.txt, or one we could not use: crawl everything.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// The whole domain is off-limits. The disallowed set holds the domain
    /// itself, as scheme+host.
    pub fn block_all(origin: &Url) -> Self {
        let site = site_of(origin);
        let origin = origin.origin().ascii_serialization();
        Self {
            disallowed: BTreeSet::from([origin.clone()]),
            origin: Some(origin),
            site,
            allowed: Vec::new(),
            block_all: true,
        }
    }

    /// Policy built from the universal groups of a parsed file.
    pub fn from_robots(robots: &RobotsFile, origin: &Url) -> Self {
        Self {
            origin: Some(origin.origin().ascii_serialization()),
            site: site_of(origin),
            disallowed: robots.universal_disallows().map(str::to_string).collect(),
            allowed: robots.universal_allows().map(str::to_string).collect(),
            block_all: false,
        }
    }

    pub fn blocks_all(&self) -> bool {
        self.block_all
    }

    /// The disallowed patterns (or the domain sentinel), sorted.
    pub fn disallowed(&self) -> impl Iterator<Item = &str> {
        self.disallowed.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.disallowed.is_empty() && !self.block_all
    }

    /// Strings to pre-load into the crawler's visited set.
    ///
    /// Every disallowed entry as written, plus each path pattern resolved
    /// against the domain so absolute hrefs match exactly.
    pub fn entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = self.disallowed.iter().cloned().collect();

        if self.block_all {
            if let Some(origin) = &self.origin {
                entries.push(format!("{}/", origin));
            }
            return entries;
        }

        if let Some(origin) = &self.origin {
            for pattern in &self.disallowed {
                if pattern.starts_with('/') {
                    entries.push(format!("{}{}", origin, pattern));
                }
            }
        }

        entries
    }

    /// Whether a crawl starting at `seed` must not even begin: the domain is
    /// blocked, the seed itself is a disallowed entry, or a pattern covers it.
    pub fn excludes_seed(&self, seed: &Url) -> bool {
        self.block_all
            || self.entries().iter().any(|entry| entry == seed.as_str())
            || self.is_excluded(seed)
    }

    /// Whether this policy forbids fetching `url`.
    ///
    /// Only URLs on the policy's own host are ever excluded, whatever their
    /// scheme. A port counts only if the robots.txt URL named one. Matching
    /// is by path prefix; the longest matching Allow beats a shorter Disallow.
    pub fn is_excluded(&self, url: &Url) -> bool {
        let Some((host, port)) = &self.site else {
            return false;
        };
        let on_site = url
            .host_str()
            .is_some_and(|other| other.eq_ignore_ascii_case(host))
            && port.map_or(true, |port| url.port_or_known_default() == Some(port));
        if !on_site {
            return false;
        }
        if self.block_all {
            return true;
        }

        let target = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        match longest_prefix(&self.disallowed, &target) {
            None => false,
            Some(disallow_len) => match longest_prefix(&self.allowed, &target) {
                Some(allow_len) => disallow_len > allow_len,
                None => true,
            },
        }
    }
}

fn site_of(url: &Url) -> Option<(String, Option<u16>)> {
    Some((url.host_str()?.to_ascii_lowercase(), url.port()))
}

// Length of the longest pattern that `target` starts with
fn longest_prefix<'a>(patterns: impl IntoIterator<Item = &'a String>, target: &str) -> Option<usize> {
    patterns
        .into_iter()
        .filter(|pattern| target.starts_with(pattern.as_str()))
        .map(|pattern| pattern.len())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://ex.org/robots.txt").unwrap()
    }

    #[test]
    fn test_parse_universal_group() {
        let robots = RobotsFile::parse(
            "User-agent: *\nDisallow: /private/\nDisallow: /tmp\nAllow: /private/open/\n",
        )
        .unwrap();

        assert_eq!(robots.groups.len(), 1);
        assert!(!robots.restricts_specific_agent());
        assert_eq!(
            robots.universal_disallows().collect::<Vec<_>>(),
            vec!["/private/", "/tmp"]
        );
        assert_eq!(robots.universal_allows().collect::<Vec<_>>(), vec!["/private/open/"]);
    }

    #[test]
    fn test_parse_skips_byte_order_mark() {
        let robots = RobotsFile::parse("\u{feff}User-agent: *\nDisallow: /private/\n").unwrap();

        assert_eq!(robots.groups.len(), 1);
        assert_eq!(robots.universal_disallows().collect::<Vec<_>>(), vec!["/private/"]);
    }

    #[test]
    fn test_parse_named_agent_group() {
        let robots = RobotsFile::parse(
            "User-agent: *\nDisallow: /a\n\nUser-agent: Googlebot\nDisallow: /b\n",
        )
        .unwrap();

        assert_eq!(robots.groups.len(), 2);
        assert!(robots.restricts_specific_agent());
    }

    #[test]
    fn test_shared_group_with_wildcard_is_universal() {
        let robots =
            RobotsFile::parse("User-agent: bingbot\nUser-agent: *\nDisallow: /x\n").unwrap();

        assert_eq!(robots.groups.len(), 1);
        assert!(!robots.restricts_specific_agent());
        assert_eq!(robots.universal_disallows().collect::<Vec<_>>(), vec!["/x"]);
    }

    #[test]
    fn test_comments_and_case() {
        let robots = RobotsFile::parse(
            "# robots for ex.org\nUSER-AGENT: * # everyone\ndisallow: /cgi-bin/ # scripts\n",
        )
        .unwrap();
        assert_eq!(robots.universal_disallows().collect::<Vec<_>>(), vec!["/cgi-bin/"]);
    }

    #[test]
    fn test_empty_disallow_contributes_nothing() {
        let robots = RobotsFile::parse("User-agent: *\nDisallow:\n").unwrap();
        assert_eq!(robots.groups.len(), 1);
        assert_eq!(robots.universal_disallows().count(), 0);
    }

    #[test]
    fn test_agent_without_rules_is_dropped() {
        let robots = RobotsFile::parse("User-agent: lonelybot\n\nUser-agent: *\nDisallow: /q\n")
            .unwrap();
        assert_eq!(robots.groups.len(), 1);
        assert!(!robots.restricts_specific_agent());
    }

    #[test]
    fn test_rules_before_any_agent_are_ignored() {
        let robots = RobotsFile::parse("Disallow: /orphan\nUser-agent: *\nDisallow: /kept\n")
            .unwrap();
        assert_eq!(robots.universal_disallows().collect::<Vec<_>>(), vec!["/kept"]);
    }

    #[test]
    fn test_crawl_delay_keeps_group_alive() {
        let robots = RobotsFile::parse("User-agent: slowbot\nCrawl-delay: 10\n").unwrap();
        assert!(robots.restricts_specific_agent());
    }

    #[test]
    fn test_empty_body_is_valid() {
        let robots = RobotsFile::parse("").unwrap();
        assert!(robots.groups.is_empty());

        let robots = RobotsFile::parse("# nothing to see\n\n").unwrap();
        assert!(robots.groups.is_empty());
    }

    #[test]
    fn test_html_body_is_rejected() {
        let html = "<!doctype html>\n<html><body style=\"color: red\">Not Found</body></html>\n";
        assert!(RobotsFile::parse(html).is_err());
    }

    #[test]
    fn test_block_all_policy() {
        let policy = ExclusionPolicy::block_all(&origin());

        assert!(policy.blocks_all());
        assert_eq!(policy.disallowed().collect::<Vec<_>>(), vec!["https://ex.org"]);
        assert!(policy.entries().contains(&"https://ex.org/".to_string()));
        assert!(policy.is_excluded(&Url::parse("https://ex.org/anything").unwrap()));
        assert!(!policy.is_excluded(&Url::parse("https://other.org/").unwrap()));
    }

    #[test]
    fn test_entries_resolve_paths() {
        let robots = RobotsFile::parse("User-agent: *\nDisallow: /private/\n").unwrap();
        let policy = ExclusionPolicy::from_robots(&robots, &origin());

        let entries = policy.entries();
        assert!(entries.contains(&"/private/".to_string()));
        assert!(entries.contains(&"https://ex.org/private/".to_string()));
    }

    #[test]
    fn test_is_excluded_prefix_and_allow() {
        let robots = RobotsFile::parse(
            "User-agent: *\nDisallow: /private/\nAllow: /private/open/\nDisallow: /search?\n",
        )
        .unwrap();
        let policy = ExclusionPolicy::from_robots(&robots, &origin());

        let excluded = |s: &str| policy.is_excluded(&Url::parse(s).unwrap());
        assert!(excluded("https://ex.org/private/secret"));
        assert!(!excluded("https://ex.org/private/open/page"));
        assert!(excluded("https://ex.org/search?q=rust"));
        assert!(!excluded("https://ex.org/search"));
        assert!(!excluded("https://ex.org/public"));
        // Another domain's paths are not ours to judge
        assert!(!excluded("https://other.org/private/secret"));
    }

    #[test]
    fn test_is_excluded_ignores_scheme() {
        let robots = RobotsFile::parse("User-agent: *\nDisallow: /private/\n").unwrap();
        let policy = ExclusionPolicy::from_robots(&robots, &origin());

        let excluded = |s: &str| policy.is_excluded(&Url::parse(s).unwrap());
        assert!(excluded("http://ex.org/private/secret"));
        assert!(excluded("https://EX.org/private/secret"));
        assert!(!excluded("http://ex.org/public"));

        assert!(ExclusionPolicy::block_all(&origin())
            .is_excluded(&Url::parse("http://ex.org/anything").unwrap()));
    }

    #[test]
    fn test_is_excluded_respects_explicit_port() {
        let robots_url = Url::parse("http://127.0.0.1:8080/robots.txt").unwrap();
        let robots = RobotsFile::parse("User-agent: *\nDisallow: /admin\n").unwrap();
        let policy = ExclusionPolicy::from_robots(&robots, &robots_url);

        assert!(policy.is_excluded(&Url::parse("http://127.0.0.1:8080/admin").unwrap()));
        assert!(!policy.is_excluded(&Url::parse("http://127.0.0.1:9090/admin").unwrap()));
    }

    #[test]
    fn test_excludes_seed() {
        let seed = Url::parse("https://ex.org/").unwrap();

        let root_blocked = RobotsFile::parse("User-agent: *\nDisallow: /\n").unwrap();
        assert!(ExclusionPolicy::from_robots(&root_blocked, &origin()).excludes_seed(&seed));

        let some_blocked = RobotsFile::parse("User-agent: *\nDisallow: /admin\n").unwrap();
        assert!(!ExclusionPolicy::from_robots(&some_blocked, &origin()).excludes_seed(&seed));

        assert!(ExclusionPolicy::block_all(&origin()).excludes_seed(&seed));
        assert!(!ExclusionPolicy::unrestricted().excludes_seed(&seed));
    }

    #[test]
    fn test_unrestricted_policy() {
        let policy = ExclusionPolicy::unrestricted();
        assert!(policy.is_empty());
        assert!(policy.entries().is_empty());
        assert!(!policy.is_excluded(&Url::parse("https://ex.org/private").unwrap()));
    }
}
