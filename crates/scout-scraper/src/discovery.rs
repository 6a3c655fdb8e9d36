//! Candidate profile discovery on a search or listing page.

use crate::definition::PlatformDefinition;
use crate::error::{Result, ScrapeError};
use crate::throttle::{ActionKind, Throttler};
use crate::url_builder::build_search_url;
use regex::Regex;
use scout_browser::{PageActions, WaitUntil};
use scout_core::{CandidateUrl, Platform, ScrapeRequest};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Below this many fresh candidates the raw-markup scan runs.
pub const FALLBACK_THRESHOLD: usize = 3;

/// Compiled discovery rules for one platform.
#[derive(Debug, Clone)]
pub struct Discoverer {
    platform: Platform,
    base: Url,
    strategies: Vec<String>,
    fallback: Regex,
    path_shape: Regex,
    min_segment_len: usize,
    denylist: HashSet<String>,
    deny_prefixes: Vec<String>,
    canonical_segments: Option<usize>,
    search_timeout: Duration,
    scrolls: u32,
}

impl Discoverer {
    /// Compile the discovery rules of `definition`.
    pub fn new(definition: &PlatformDefinition) -> Result<Self> {
        let invalid = |reason: String| ScrapeError::InvalidDefinition {
            platform: definition.platform.to_string(),
            reason,
        };
        let discovery = &definition.discovery;

        Ok(Self {
            platform: definition.platform,
            base: Url::parse(&definition.base_url).map_err(|e| invalid(e.to_string()))?,
            strategies: discovery.strategies.clone(),
            fallback: Regex::new(&discovery.fallback_pattern)
                .map_err(|e| invalid(e.to_string()))?,
            path_shape: Regex::new(&discovery.path_pattern).map_err(|e| invalid(e.to_string()))?,
            min_segment_len: discovery.min_segment_len,
            denylist: discovery
                .denylist
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            deny_prefixes: discovery
                .deny_prefixes
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            canonical_segments: discovery.canonical_segments,
            search_timeout: Duration::from_millis(definition.search.timeout_ms),
            scrolls: definition.search.scrolls,
        })
    }

    /// Load the search page for `request` and collect candidate profile URLs.
    ///
    /// A failed search navigation is returned as [`ScrapeError::Navigation`];
    /// everything after that point degrades to fewer candidates instead.
    pub async fn discover(
        &self,
        page: &dyn PageActions,
        throttler: &dyn Throttler,
        definition: &PlatformDefinition,
        request: &ScrapeRequest,
    ) -> Result<Vec<CandidateUrl>> {
        let search_url = build_search_url(definition, &request.query, &request.location);
        debug!(platform = %self.platform, url = %search_url, "loading search page");

        page.goto(&search_url, WaitUntil::NetworkIdle, self.search_timeout)
            .await
            .map_err(|source| ScrapeError::Navigation {
                url: search_url.clone(),
                source,
            })?;

        throttler.pause(self.platform, ActionKind::SearchSettle).await;

        for round in 0..self.scrolls {
            if let Err(e) = page.scroll_to_end().await {
                debug!(platform = %self.platform, round, error = %e, "scroll failed");
            }
            throttler.pause(self.platform, ActionKind::Scroll).await;
        }

        let candidates = self.collect_candidates(page, request).await;
        info!(
            platform = %self.platform,
            count = candidates.len(),
            "search page loaded"
        );
        Ok(candidates)
    }

    /// Run the selector strategies, then the markup scan if they came up short.
    ///
    /// Candidates are unique, absent from `request.existing_urls`, and in
    /// first-seen order.
    pub async fn collect_candidates(
        &self,
        page: &dyn PageActions,
        request: &ScrapeRequest,
    ) -> Vec<CandidateUrl> {
        let mut found = Accumulator::new(request);

        for selector in &self.strategies {
            match page.query_all_attr(selector, "href").await {
                Ok(hrefs) => {
                    let before = found.len();
                    for href in &hrefs {
                        self.admit(&mut found, href);
                    }
                    debug!(
                        platform = %self.platform,
                        selector = %selector,
                        matched = hrefs.len(),
                        added = found.len() - before,
                        "discovery strategy"
                    );
                }
                Err(e) => {
                    debug!(platform = %self.platform, selector = %selector, error = %e, "discovery strategy failed");
                }
            }
        }

        if found.len() < FALLBACK_THRESHOLD {
            match page.content().await {
                Ok(html) => {
                    let before = found.len();
                    for href in self.scan_markup(&html) {
                        self.admit(&mut found, href);
                    }
                    debug!(
                        platform = %self.platform,
                        added = found.len() - before,
                        "markup fallback scan"
                    );
                }
                Err(e) => {
                    warn!(platform = %self.platform, error = %e, "could not read page markup for fallback scan");
                }
            }
        }

        found.into_inner()
    }

    /// Raw href values captured by the fallback pattern, in document order.
    pub fn scan_markup<'a>(&'a self, html: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fallback
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
    }

    /// Resolve `href` and keep it only if it looks like a profile link.
    /// The result is in canonical form.
    #[must_use]
    pub fn accept(&self, href: &str) -> Option<CandidateUrl> {
        self.filter(href).map(|candidate| self.canonicalize(candidate))
    }

    /// Add `href` unless it is filtered out or known to the caller in either
    /// its linked or its canonical form.
    fn admit(&self, found: &mut Accumulator<'_>, href: &str) {
        let Some(linked) = self.filter(href) else {
            return;
        };
        if found.request.is_existing(&linked) {
            return;
        }
        found.push(self.canonicalize(linked));
    }

    fn canonicalize(&self, candidate: CandidateUrl) -> CandidateUrl {
        let Some(keep) = self.canonical_segments else {
            return candidate;
        };
        let path = candidate.path();
        let kept: Vec<&str> = path.trim_start_matches('/').split('/').take(keep).collect();
        CandidateUrl::resolve(&format!("/{}", kept.join("/")), &self.base).unwrap_or(candidate)
    }

    fn filter(&self, href: &str) -> Option<CandidateUrl> {
        let candidate = CandidateUrl::resolve(href, &self.base)?;
        if candidate.host().as_deref() != self.base.host_str() {
            return None;
        }

        let path = candidate.path();
        if !self.path_shape.is_match(&path) {
            return None;
        }

        let first = path.trim_start_matches('/').split('/').next()?;
        if first.chars().count() < self.min_segment_len {
            return None;
        }

        let first = first.to_lowercase();
        if self.denylist.contains(&first) {
            return None;
        }
        if self.deny_prefixes.iter().any(|p| first.starts_with(p)) {
            return None;
        }

        Some(candidate)
    }
}

/// Order-preserving, deduplicating candidate list that drops known URLs.
struct Accumulator<'r> {
    request: &'r ScrapeRequest,
    seen: HashSet<CandidateUrl>,
    ordered: Vec<CandidateUrl>,
}

impl<'r> Accumulator<'r> {
    fn new(request: &'r ScrapeRequest) -> Self {
        Self {
            request,
            seen: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    fn push(&mut self, candidate: CandidateUrl) {
        if self.request.is_existing(&candidate) {
            return;
        }
        if self.seen.insert(candidate.clone()) {
            self.ordered.push(candidate);
        }
    }

    fn len(&self) -> usize {
        self.ordered.len()
    }

    fn into_inner(self) -> Vec<CandidateUrl> {
        self.ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PlatformRegistry;

    fn discoverer(platform: Platform) -> Discoverer {
        let registry = PlatformRegistry::builtin().expect("built-in definitions");
        Discoverer::new(registry.get(platform).expect("registered")).expect("compiles")
    }

    #[test]
    fn test_github_accepts_single_segment() {
        let d = discoverer(Platform::Github);
        assert_eq!(
            d.accept("/octocat").map(String::from).as_deref(),
            Some("https://github.com/octocat")
        );
        assert!(d.accept("https://github.com/octocat?tab=stars").is_some());
    }

    #[test]
    fn test_github_rejects_navigation_links() {
        let d = discoverer(Platform::Github);
        for href in [
            "/settings",
            "/Search",
            "/login",
            "/a",
            "/octocat/hello-world",
            "https://gist.github.com/octocat",
            "https://example.com/octocat",
            "#",
        ] {
            assert!(d.accept(href).is_none(), "should reject {href}");
        }
    }

    #[test]
    fn test_behance_deny_prefix() {
        let d = discoverer(Platform::Behance);
        assert!(d.accept("https://www.behance.net/janedoe").is_some());
        assert!(d.accept("https://www.behance.net/galleries").is_none());
        assert!(d.accept("https://www.behance.net/gallery123").is_none());
        assert!(d.accept("https://www.behance.net/ab").is_none());
    }

    #[test]
    fn test_stackoverflow_user_paths() {
        let d = discoverer(Platform::StackOverflow);
        assert_eq!(
            d.accept("/users/22656/jon-skeet").map(String::from).as_deref(),
            Some("https://stackoverflow.com/users/22656")
        );
        assert_eq!(
            d.accept("/users/22656").map(String::from).as_deref(),
            Some("https://stackoverflow.com/users/22656")
        );
        assert!(d.accept("/users/login").is_none());
        assert!(d.accept("/users/22656/jon-skeet/activity").is_none());
    }

    #[test]
    fn test_scan_markup_captures_href() {
        let d = discoverer(Platform::Github);
        let html = r#"<a href="/alice">A</a><a class="x" href="/bob">B</a><img src="/logo">"#;
        let hrefs: Vec<&str> = d.scan_markup(html).collect();
        assert_eq!(hrefs, vec!["/alice", "/bob"]);
    }
}
