use scout_browser::BrowserError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("browser session failed: {0}")]
    SessionFatal(#[source] BrowserError),

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("invalid definition for {platform}: {reason}")]
    InvalidDefinition { platform: String, reason: String },

    #[error("failed to parse platform definition {origin}: {source}")]
    DefinitionParse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("platform definitions directory not found at {path}")]
    DirectoryNotFound { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
