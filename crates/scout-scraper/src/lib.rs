//! Scout Scraper - profile discovery and extraction across sourcing platforms.
//!
//! This crate turns a [`ScrapeRequest`](scout_core::ScrapeRequest) into a list of
//! [`PlatformProfile`](scout_core::PlatformProfile) records. Each platform is
//! described by a TOML definition (search URL, discovery selectors, denylists,
//! per-field fallback chains and pacing), so markup drift is a data fix.
//!
//! # Pipeline
//!
//! - [`ScrapeOrchestrator`] resolves the platform and opens one browser session
//! - [`Discoverer`] loads the search page and collects candidate profile URLs
//! - [`Extractor`] reads each profile page through ordered fallback chains
//! - [`Throttler`] paces every navigation and scroll
//!
//! # Example
//!
//! ```rust,ignore
//! use scout_browser::BrowserEngine;
//! use scout_core::ScrapeRequest;
//! use scout_scraper::{PlatformRegistry, RandomThrottler, ScrapeOrchestrator, ThrottlePolicy};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(PlatformRegistry::builtin()?);
//! let throttler = RandomThrottler::new(ThrottlePolicy::from_registry(&registry));
//! let orchestrator = ScrapeOrchestrator::new(
//!     registry,
//!     Arc::new(BrowserEngine::default()),
//!     Arc::new(throttler),
//! );
//!
//! let request = ScrapeRequest::new("github").with_max_profiles(5);
//! let profiles = orchestrator.dispatch(&request).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod definition;
pub mod discovery;
#[allow(missing_docs)]
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod registry;
pub mod throttle;
#[allow(missing_docs)]
pub mod url_builder;

// Re-export commonly used types
pub use definition::{FieldChain, PlatformDefinition, TextStrategy};
pub use discovery::{Discoverer, FALLBACK_THRESHOLD};
pub use error::{Result, ScrapeError};
pub use extractor::Extractor;
pub use orchestrator::{ItemOutcome, ScrapeOrchestrator, ScrapeReport, SessionPhase, SkipReason};
pub use registry::{parse_definition, PlatformRegistry};
pub use throttle::{ActionKind, DelayRange, NoDelay, RandomThrottler, ThrottlePolicy, Throttler};
pub use url_builder::build_search_url;
