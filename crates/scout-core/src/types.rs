//! Shared types used across the Scout workspace.
//!
//! This module defines the request and result records exchanged between the
//! CLI, the dispatcher and the per-platform scrapers.

use crate::error::ScoutError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Platforms with a scraping pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// github.com user search
    Github,
    /// behance.net creative profiles
    Behance,
    /// stackoverflow.com reputation listing
    #[serde(rename = "stackoverflow")]
    StackOverflow,
    /// dev.to article authors
    Devto,
}

impl Platform {
    /// Every supported platform, in dispatch order.
    pub const ALL: [Platform; 4] = [
        Platform::Github,
        Platform::Behance,
        Platform::StackOverflow,
        Platform::Devto,
    ];

    /// Identifier accepted on input (`github`, `behance`, `stackoverflow`, `devto`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Behance => "behance",
            Self::StackOverflow => "stackoverflow",
            Self::Devto => "devto",
        }
    }

    /// Human-readable name used as the `source` tag on emitted profiles.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Github => "GitHub",
            Self::Behance => "Behance",
            Self::StackOverflow => "Stack Overflow",
            Self::Devto => "Dev.to",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ScoutError;

    /// Case-insensitive parse of a platform identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ScoutError::Validation(format!("unknown platform '{s}'")))
    }
}

/// Normalize an absolute URL for identity comparison.
///
/// Drops the query string and fragment and any trailing slash on a non-root
/// path. Returns `None` for unparsable input or non-HTTP schemes.
#[must_use]
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);
    url.set_query(None);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

/// A normalized absolute URL believed to reference a profile page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateUrl(String);

impl CandidateUrl {
    /// Resolve `href` (absolute or relative) against `base` and normalize it.
    #[must_use]
    pub fn resolve(href: &str, base: &Url) -> Option<Self> {
        let joined = base.join(href.trim()).ok()?;
        normalize_url(joined.as_str()).map(Self)
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path component of the URL, e.g. `/octocat`.
    #[must_use]
    pub fn path(&self) -> String {
        Url::parse(&self.0)
            .map(|u| u.path().to_string())
            .unwrap_or_default()
    }

    /// Host component of the URL, if any.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.0)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}

impl fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CandidateUrl> for String {
    fn from(url: CandidateUrl) -> Self {
        url.0
    }
}

/// One scrape invocation. Immutable once handed to the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// Platform identifier as given by the caller; parsed case-insensitively at dispatch
    pub platform: String,
    /// Free-text search query
    pub query: String,
    /// Location filter; ignored by platforms without location-aware search
    pub location: String,
    /// Upper bound on emitted profiles
    pub max_profiles: usize,
    /// Normalized profile URLs the caller already knows about
    pub existing_urls: HashSet<String>,
}

impl Default for ScrapeRequest {
    fn default() -> Self {
        Self {
            platform: "github".to_string(),
            query: "fullstack".to_string(),
            location: "India".to_string(),
            max_profiles: 10,
            existing_urls: HashSet::new(),
        }
    }
}

impl ScrapeRequest {
    /// Create a request for `platform` with default query, location and cap.
    #[must_use]
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            ..Self::default()
        }
    }

    /// Set the search query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set the location filter.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the profile cap.
    #[must_use]
    pub fn with_max_profiles(mut self, max_profiles: usize) -> Self {
        self.max_profiles = max_profiles;
        self
    }

    /// Set the exclusion set. Entries are normalized; unparsable ones are kept verbatim.
    #[must_use]
    pub fn with_existing_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.existing_urls = urls
            .into_iter()
            .map(|u| normalize_url(u.as_ref()).unwrap_or_else(|| u.as_ref().trim().to_string()))
            .collect();
        self
    }

    /// Whether `url` is already known to the caller.
    #[must_use]
    pub fn is_existing(&self, url: &CandidateUrl) -> bool {
        self.existing_urls.contains(url.as_str())
    }
}

/// Best-effort record extracted from one profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformProfile {
    /// Display name; profiles without one are never emitted
    pub full_name: String,
    /// Reserved; no platform exposes it publicly
    pub email: String,
    /// Free-text bio, length-capped by the platform definition
    pub bio: String,
    /// Self-reported location
    pub location: String,
    /// Page the record was extracted from; unique within a result set
    pub profile_url: String,
    /// Skills in discovery order, without duplicates
    pub skills: Vec<String>,
    /// Employer or organisation
    pub company: String,
    /// Personal website
    pub website: String,
    /// Reserved follower count
    #[serde(rename = "followers")]
    pub followers_count: u64,
    /// Reserved repository count
    #[serde(rename = "repos")]
    pub repos_count: u64,
    /// Source platform label, attached by the aggregator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl PlatformProfile {
    /// Empty record for `profile_url`.
    #[must_use]
    pub fn new(profile_url: impl Into<String>) -> Self {
        Self {
            profile_url: profile_url.into(),
            ..Self::default()
        }
    }

    /// Append a skill unless it is empty or already present. Returns whether it was added.
    pub fn push_skill(&mut self, skill: impl Into<String>) -> bool {
        let skill = skill.into();
        if skill.is_empty() || self.skills.contains(&skill) {
            return false;
        }
        self.skills.push(skill);
        true
    }

    /// Whether the required name is present.
    #[must_use]
    pub fn has_name(&self) -> bool {
        !self.full_name.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_case_insensitive() {
        assert_eq!("GitHub".parse::<Platform>().unwrap(), Platform::Github);
        assert_eq!(
            "STACKOVERFLOW".parse::<Platform>().unwrap(),
            Platform::StackOverflow
        );
        assert_eq!(" devto ".parse::<Platform>().unwrap(), Platform::Devto);
    }

    #[test]
    fn test_platform_parse_unknown() {
        for input in ["myspace", "", "dev.to", "git hub"] {
            assert!(input.parse::<Platform>().is_err(), "Should fail for: {input}");
        }
    }

    #[test]
    fn test_platform_labels() {
        assert_eq!(Platform::Github.label(), "GitHub");
        assert_eq!(Platform::StackOverflow.label(), "Stack Overflow");
        assert_eq!(Platform::Devto.label(), "Dev.to");
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("https://github.com/octocat/").as_deref(),
            Some("https://github.com/octocat")
        );
        assert_eq!(
            normalize_url("https://GitHub.com/octocat?tab=repositories#top").as_deref(),
            Some("https://github.com/octocat")
        );
        assert_eq!(normalize_url("mailto:someone@example.com"), None);
        assert_eq!(normalize_url("not a url"), None);
    }

    #[test]
    fn test_candidate_resolve_relative() {
        let base = Url::parse("https://dev.to/").unwrap();
        let candidate = CandidateUrl::resolve("/ben", &base).expect("resolves");
        assert_eq!(candidate.as_str(), "https://dev.to/ben");
        assert_eq!(candidate.path(), "/ben");
        assert_eq!(candidate.host().as_deref(), Some("dev.to"));
    }

    #[test]
    fn test_request_existing_urls_normalized() {
        let request = ScrapeRequest::new("github")
            .with_existing_urls(["https://github.com/octocat/", "garbage"]);
        let base = Url::parse("https://github.com").unwrap();

        let known = CandidateUrl::resolve("/octocat", &base).unwrap();
        let fresh = CandidateUrl::resolve("/torvalds", &base).unwrap();
        assert!(request.is_existing(&known));
        assert!(!request.is_existing(&fresh));
        assert!(request.existing_urls.contains("garbage"));
    }

    #[test]
    fn test_request_defaults() {
        let request = ScrapeRequest::default();
        assert_eq!(request.platform, "github");
        assert_eq!(request.query, "fullstack");
        assert_eq!(request.location, "India");
        assert_eq!(request.max_profiles, 10);
        assert!(request.existing_urls.is_empty());
    }

    #[test]
    fn test_push_skill_dedup() {
        let mut profile = PlatformProfile::new("https://github.com/octocat");
        assert!(profile.push_skill("Rust"));
        assert!(profile.push_skill("Go"));
        assert!(!profile.push_skill("Rust"));
        assert!(!profile.push_skill(""));
        assert_eq!(profile.skills, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_profile_serialization_keys() {
        let mut profile = PlatformProfile::new("https://dev.to/ben");
        profile.full_name = "Ben Halpern".to_string();
        profile.source = Some("Dev.to".to_string());

        let json = serde_json::to_value(&profile).expect("serialize profile");
        assert_eq!(json["fullName"], "Ben Halpern");
        assert_eq!(json["profileUrl"], "https://dev.to/ben");
        assert_eq!(json["followers"], 0);
        assert_eq!(json["repos"], 0);
        assert_eq!(json["source"], "Dev.to");
        assert_eq!(json["email"], "");
    }
}
