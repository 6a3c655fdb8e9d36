use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("browser context failed: {0}")]
    ContextFailed(String),

    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("navigation to {url} failed: {reason}")]
    NavigationError { url: String, reason: String },

    #[error("selector {selector} failed: {reason}")]
    SelectorError { selector: String, reason: String },

    #[error("chromium error: {0}")]
    ChromiumError(String),
}

impl BrowserError {
    /// The navigation deadline passed before the page loaded.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::NavigationTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::NavigationTimeout {
            url: "https://github.com/octocat".to_string(),
            timeout_ms: 20000,
        };
        assert_eq!(
            err.to_string(),
            "navigation to https://github.com/octocat timed out after 20000ms"
        );
        assert!(err.is_timeout());
        assert!(!BrowserError::LaunchFailed("no chrome".to_string()).is_timeout());
    }
}
