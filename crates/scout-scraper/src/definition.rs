//! Platform definition types.
//!
//! Selectors, denylists and timings for each platform are plain data loaded
//! from TOML, so markup drift on a site is fixed by editing a definition file.

use crate::error::{Result, ScrapeError};
use regex::Regex;
use scout_core::Platform;
use serde::{Deserialize, Serialize};
use url::Url;

/// Complete platform definition loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformDefinition {
    /// Platform this definition drives
    pub platform: Platform,

    /// Source tag attached to every profile from this platform
    pub label: String,

    /// Origin that relative links are resolved against
    pub base_url: String,

    /// Search/listing page
    pub search: SearchConfig,

    /// Request pacing
    pub pacing: PacingConfig,

    /// Candidate link discovery
    pub discovery: DiscoveryConfig,

    /// Profile page navigation
    pub profile: ProfilePageConfig,

    /// Per-field extraction chains
    #[serde(default)]
    pub fields: FieldChains,

    /// Multi-match skills harvesting
    #[serde(default)]
    pub skills: Option<SkillsConfig>,
}

impl PlatformDefinition {
    /// Validate the definition for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ScrapeError::InvalidDefinition {
            platform: self.platform.to_string(),
            reason,
        };

        if self.label.trim().is_empty() {
            return Err(invalid("label cannot be empty".to_string()));
        }

        Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("base_url {} is not a URL: {e}", self.base_url)))?;

        if self.search.url_template.trim().is_empty() {
            return Err(invalid("search.url_template cannot be empty".to_string()));
        }

        if self.search.timeout_ms == 0 || self.profile.timeout_ms == 0 {
            return Err(invalid("navigation timeouts must be non-zero".to_string()));
        }

        for (name, range) in [
            ("pacing.profile_navigation_ms", self.pacing.profile_navigation_ms),
            ("pacing.scroll_ms", self.pacing.scroll_ms),
        ] {
            if range[0] > range[1] {
                return Err(invalid(format!(
                    "{name} lower bound {} exceeds upper bound {}",
                    range[0], range[1]
                )));
            }
        }

        let fallback = Regex::new(&self.discovery.fallback_pattern)
            .map_err(|e| invalid(format!("discovery.fallback_pattern: {e}")))?;
        if fallback.captures_len() < 2 {
            return Err(invalid(
                "discovery.fallback_pattern needs a capture group around the href".to_string(),
            ));
        }

        Regex::new(&self.discovery.path_pattern)
            .map_err(|e| invalid(format!("discovery.path_pattern: {e}")))?;

        if self
            .discovery
            .strategies
            .iter()
            .any(|s| s.trim().is_empty())
        {
            return Err(invalid("discovery strategies cannot be empty selectors".to_string()));
        }

        if self.discovery.canonical_segments == Some(0) {
            return Err(invalid(
                "discovery.canonical_segments must keep at least one segment".to_string(),
            ));
        }

        if self.fields.name.strategies.is_empty() {
            return Err(invalid("fields.name needs at least one strategy".to_string()));
        }

        for (field, chain) in self.fields.iter() {
            chain.validate().map_err(|reason| invalid(format!("fields.{field}: {reason}")))?;
        }

        if let Some(skills) = &self.skills {
            if skills.selector.trim().is_empty() || skills.limit == 0 {
                return Err(invalid(
                    "skills needs a selector and a non-zero limit".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Search/listing page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// URL with `{query}` and `{location}` placeholders
    pub url_template: String,

    /// Navigation deadline for the listing page
    pub timeout_ms: u64,

    /// Scroll-to-end actions for infinite-scroll listings
    #[serde(default)]
    pub scrolls: u32,
}

/// Delays inserted between browser actions, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Uniform range slept before each profile navigation
    pub profile_navigation_ms: [u64; 2],

    /// Uniform range slept after each scroll action
    pub scroll_ms: [u64; 2],

    /// Fixed settle after the listing page loads
    pub search_settle_ms: u64,

    /// Fixed settle after a profile page loads
    #[serde(default)]
    pub profile_settle_ms: u64,
}

/// Candidate link discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// CSS selectors whose `href` values are candidates, most reliable first
    #[serde(default)]
    pub strategies: Vec<String>,

    /// Regex over raw markup; capture group 1 is the href
    pub fallback_pattern: String,

    /// Regex the candidate URL path must match
    pub path_pattern: String,

    /// Minimum length of the first path segment
    #[serde(default = "default_min_segment_len")]
    pub min_segment_len: usize,

    /// First path segments that are never profiles (case-insensitive)
    #[serde(default)]
    pub denylist: Vec<String>,

    /// First path segment prefixes that are never profiles (case-insensitive)
    #[serde(default)]
    pub deny_prefixes: Vec<String>,

    /// Keep only this many leading path segments of an accepted candidate,
    /// so `/users/1/jon` and `/users/1` collapse to one profile
    #[serde(default)]
    pub canonical_segments: Option<usize>,
}

fn default_min_segment_len() -> usize {
    1
}

/// Profile page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePageConfig {
    /// Navigation deadline for each profile page
    pub timeout_ms: u64,

    /// Selector that must be present for the page to count as a profile
    #[serde(default)]
    pub marker: Option<String>,
}

/// Extraction chains for the single-valued profile fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldChains {
    /// Display name (required for a profile to be kept)
    pub name: FieldChain,
    /// Free-text bio
    pub bio: FieldChain,
    /// Self-reported location
    pub location: FieldChain,
    /// Employer or organisation
    pub company: FieldChain,
    /// Personal website
    pub website: FieldChain,
}

impl FieldChains {
    /// Iterate `(field name, chain)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldChain)> {
        [
            ("name", &self.name),
            ("bio", &self.bio),
            ("location", &self.location),
            ("company", &self.company),
            ("website", &self.website),
        ]
        .into_iter()
    }
}

/// Ordered fallback chain for one field. The first accepted value wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldChain {
    /// Strategies in the order they are tried
    #[serde(default)]
    pub strategies: Vec<TextStrategy>,

    /// Maximum characters kept from the winning value
    #[serde(default)]
    pub truncate: Option<usize>,
}

impl FieldChain {
    fn validate(&self) -> std::result::Result<(), String> {
        for strategy in &self.strategies {
            if strategy.selector.trim().is_empty() {
                return Err("strategy selector cannot be empty".to_string());
            }
            if let Some(max) = strategy.max_len {
                if max < strategy.min_len {
                    return Err(format!(
                        "{}: max_len {max} below min_len {}",
                        strategy.selector, strategy.min_len
                    ));
                }
            }
        }
        Ok(())
    }

    /// Cut `value` to the chain's character limit.
    pub fn apply_truncate(&self, value: String) -> String {
        match self.truncate {
            Some(limit) if value.chars().count() > limit => {
                value.chars().take(limit).collect::<String>().trim_end().to_string()
            }
            _ => value,
        }
    }
}

/// Read the inner text of the first element matching `selector`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStrategy {
    /// CSS selector
    pub selector: String,

    /// Minimum characters after trimming
    #[serde(default = "default_min_len")]
    pub min_len: usize,

    /// Maximum characters after trimming; longer text is treated as no match
    #[serde(default)]
    pub max_len: Option<usize>,
}

fn default_min_len() -> usize {
    1
}

impl TextStrategy {
    /// Trim `raw` and return it if its length is within bounds.
    pub fn accept(&self, raw: &str) -> Option<String> {
        let text = raw.trim();
        let len = text.chars().count();
        if len == 0 || len < self.min_len {
            return None;
        }
        if self.max_len.is_some_and(|max| len > max) {
            return None;
        }
        Some(text.to_string())
    }
}

/// Multi-match skills harvesting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Selector matching one element per skill
    pub selector: String,

    /// Matched elements examined, in document order
    pub limit: usize,

    /// Skills longer than this are ignored
    #[serde(default)]
    pub max_len: Option<usize>,
}
