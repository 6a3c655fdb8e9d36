//! Browser automation for profile scraping.
//!
//! Provides headless Chromium sessions (one browser, one isolated context,
//! one page) with a randomized user agent, behind traits the scraper can
//! swap out for fixtures.

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;

pub use actions::{PageActions, WaitUntil};
pub use engine::{BrowserEngine, BrowserSession, ChromiumSession, LaunchOptions, SessionLauncher};
pub use error::{BrowserError, Result};
pub use fingerprint::{FingerprintConfig, DEFAULT_USER_AGENTS};
