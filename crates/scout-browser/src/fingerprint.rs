use rand::seq::SliceRandom;
use rand::Rng;

/// Desktop user agents rotated across sessions.
pub const DEFAULT_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

const DESKTOP_VIEWPORT: (u32, u32) = (1920, 1080);

/// Identity presented by one browsing context.
///
/// The viewport is fixed to a common desktop size so every session looks
/// like the same class of non-headless browser; only the user agent rotates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl FingerprintConfig {
    /// Pick a user agent from the default pool with the thread RNG.
    pub fn randomized() -> Self {
        Self::from_pool(&DEFAULT_USER_AGENTS, &mut rand::thread_rng())
    }

    /// Pick a user agent uniformly from `pool` using `rng`.
    ///
    /// An empty pool falls back to the first default user agent.
    pub fn from_pool<S: AsRef<str>, R: Rng + ?Sized>(pool: &[S], rng: &mut R) -> Self {
        let user_agent = pool
            .choose(rng)
            .map(|ua| ua.as_ref().to_string())
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string());

        Self {
            user_agent,
            viewport_width: DESKTOP_VIEWPORT.0,
            viewport_height: DESKTOP_VIEWPORT.1,
        }
    }

    /// Override the viewport size.
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }
}
