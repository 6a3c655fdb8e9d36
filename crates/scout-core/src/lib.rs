//! Scout Core - Foundation crate for the Scout profile scraper.
//!
//! This crate provides shared types, error handling and configuration
//! management that the browser, scraper and CLI crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Validation and configuration errors using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared domain types (`Platform`, `ScrapeRequest`, `PlatformProfile`, `CandidateUrl`)
//!
//! # Example
//!
//! ```rust
//! use scout_core::{AppConfig, Platform, ScrapeRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let request = ScrapeRequest::new(&config.scraping.default_platform)
//!     .with_query("rust")
//!     .with_max_profiles(5);
//!
//! assert_eq!(request.platform.parse::<Platform>()?, Platform::Github);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, LogFormat, LoggingConfig, ScrapingConfig};
pub use error::{ConfigError, ConfigResult, ScoutError};
pub use types::{normalize_url, CandidateUrl, Platform, PlatformProfile, ScrapeRequest};
