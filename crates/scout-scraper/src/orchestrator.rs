//! Scrape orchestrator: platform dispatch, session scope and the per-profile loop.
//!
//! One [`ScrapeOrchestrator::run`] call owns exactly one browser session.
//! Every path that opens a session closes it at a single point, and no
//! failure inside a run is raised to the caller; it is recorded in the
//! returned [`ScrapeReport`] instead.

use crate::definition::PlatformDefinition;
use crate::discovery::Discoverer;
use crate::error::{Result, ScrapeError};
use crate::extractor::Extractor;
use crate::registry::PlatformRegistry;
use crate::throttle::{ActionKind, Throttler};
use futures::stream::{FuturesUnordered, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scout_browser::{
    FingerprintConfig, PageActions, SessionLauncher, WaitUntil, DEFAULT_USER_AGENTS,
};
use scout_core::{CandidateUrl, Platform, PlatformProfile, ScrapeRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Default number of sessions [`ScrapeOrchestrator::run_many`] keeps open at once.
const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 2;

/// Lifecycle of one run. `SessionClosed` is terminal for every run that
/// attempted to open a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session was attempted
    Uninitialized,
    /// Browser, context and page are open
    SessionOpen,
    /// The search page loaded and candidates were collected
    SearchLoaded,
    /// The session was released
    SessionClosed,
}

/// Why a candidate produced no profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No name strategy matched
    MissingName,
    /// The page lacks the platform's profile marker
    NotAProfile,
    /// Navigation failed or timed out
    Navigation,
}

/// Result of visiting one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A profile with a name was extracted
    Extracted(Box<PlatformProfile>),
    /// The candidate was dropped
    Skipped(SkipReason),
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// Platform identifier as requested
    pub platform: String,
    /// Extracted profiles in navigation order
    pub profiles: Vec<PlatformProfile>,
    /// Fresh candidates returned by discovery
    pub candidates_found: usize,
    /// Candidates visited without producing a profile
    pub skipped: usize,
    /// Phase the run ended in
    pub phase: SessionPhase,
    /// Run-level failure, if any
    pub error: Option<String>,
}

impl ScrapeReport {
    fn new(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
            profiles: Vec::new(),
            candidates_found: 0,
            skipped: 0,
            phase: SessionPhase::Uninitialized,
            error: None,
        }
    }
}

/// Routes requests to platform pipelines and runs them in a browser session.
pub struct ScrapeOrchestrator {
    /// Platform definitions
    registry: Arc<PlatformRegistry>,
    /// Opens browser sessions
    launcher: Arc<dyn SessionLauncher>,
    /// Paces browser actions
    throttler: Arc<dyn Throttler>,
    /// User agents picked from per session
    user_agents: Vec<String>,
    /// Viewport presented by every session
    viewport: (u32, u32),
    /// Random source for fingerprint selection
    rng: Mutex<StdRng>,
    /// Session cap for `run_many`
    max_concurrent_sessions: usize,
}

impl ScrapeOrchestrator {
    /// Create an orchestrator using the default user-agent pool.
    #[must_use]
    pub fn new(
        registry: Arc<PlatformRegistry>,
        launcher: Arc<dyn SessionLauncher>,
        throttler: Arc<dyn Throttler>,
    ) -> Self {
        Self {
            registry,
            launcher,
            throttler,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| (*s).to_string()).collect(),
            viewport: (1920, 1080),
            rng: Mutex::new(StdRng::from_entropy()),
            max_concurrent_sessions: DEFAULT_MAX_CONCURRENT_SESSIONS,
        }
    }

    /// Replace the user-agent pool.
    #[must_use]
    pub fn with_user_agents(mut self, user_agents: Vec<String>) -> Self {
        self.user_agents = user_agents;
        self
    }

    /// Set the viewport presented by every session.
    #[must_use]
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    /// Seed the fingerprint random source.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Set how many sessions `run_many` may keep open at once.
    #[must_use]
    pub fn with_max_concurrent_sessions(mut self, max: usize) -> Self {
        self.max_concurrent_sessions = max.max(1);
        self
    }

    /// Scrape profiles for `request`. Never fails: unknown platforms and
    /// session failures yield whatever was collected, possibly nothing.
    pub async fn dispatch(&self, request: &ScrapeRequest) -> Vec<PlatformProfile> {
        self.run(request).await.profiles
    }

    /// Scrape profiles for `request` and report how the run went.
    pub async fn run(&self, request: &ScrapeRequest) -> ScrapeReport {
        let mut report = ScrapeReport::new(&request.platform);

        let definition = match self.resolve(&request.platform) {
            Ok(definition) => definition,
            Err(e) => {
                warn!(platform = %request.platform, "{e}");
                report.error = Some(e.to_string());
                return report;
            }
        };
        let platform = definition.platform;

        if request.max_profiles == 0 {
            debug!(platform = %platform, "profile cap is zero, nothing to do");
            return report;
        }

        info!(
            platform = %platform,
            query = %request.query,
            location = %request.location,
            max_profiles = request.max_profiles,
            existing = request.existing_urls.len(),
            "starting scrape"
        );

        let fingerprint = self.fingerprint().await;
        let session = match self.launcher.launch(&fingerprint).await {
            Ok(session) => session,
            Err(e) => {
                let e = ScrapeError::SessionFatal(e);
                error!(platform = %platform, error = %e, "could not open browser session");
                report.error = Some(e.to_string());
                report.phase = SessionPhase::SessionClosed;
                return report;
            }
        };
        report.phase = SessionPhase::SessionOpen;
        info!(platform = %platform, user_agent = %fingerprint.user_agent, "session open");

        if let Err(e) = self
            .scrape_with_session(session.page(), definition, request, &mut report)
            .await
        {
            warn!(
                platform = %platform,
                collected = report.profiles.len(),
                error = %e,
                "scrape aborted"
            );
            report.error = Some(e.to_string());
        }

        if let Err(e) = session.close().await {
            warn!(platform = %platform, error = %e, "session close failed");
        }
        report.phase = SessionPhase::SessionClosed;

        info!(
            platform = %platform,
            profiles = report.profiles.len(),
            candidates = report.candidates_found,
            skipped = report.skipped,
            "session closed"
        );
        report
    }

    /// Run independent requests concurrently, each in its own session.
    ///
    /// Reports come back in request order.
    pub async fn run_many(&self, requests: &[ScrapeRequest]) -> Vec<ScrapeReport> {
        let mut pending = requests.iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut reports: Vec<Option<ScrapeReport>> = vec![None; requests.len()];

        for (index, request) in pending.by_ref().take(self.max_concurrent_sessions) {
            in_flight.push(self.run_indexed(index, request));
        }

        while let Some((index, report)) = in_flight.next().await {
            reports[index] = Some(report);
            if let Some((index, request)) = pending.next() {
                in_flight.push(self.run_indexed(index, request));
            }
        }

        reports.into_iter().flatten().collect()
    }

    async fn run_indexed(&self, index: usize, request: &ScrapeRequest) -> (usize, ScrapeReport) {
        (index, self.run(request).await)
    }

    fn resolve(&self, platform: &str) -> Result<&PlatformDefinition> {
        let unknown = || ScrapeError::UnknownPlatform(platform.trim().to_string());
        let platform: Platform = platform.parse().map_err(|_| unknown())?;
        self.registry.get(platform).ok_or_else(unknown)
    }

    async fn fingerprint(&self) -> FingerprintConfig {
        let mut rng = self.rng.lock().await;
        FingerprintConfig::from_pool(self.user_agents.as_slice(), &mut *rng)
            .with_viewport(self.viewport.0, self.viewport.1)
    }

    /// Discovery then the per-candidate loop. The cap is enforced only here.
    async fn scrape_with_session(
        &self,
        page: &dyn PageActions,
        definition: &PlatformDefinition,
        request: &ScrapeRequest,
        report: &mut ScrapeReport,
    ) -> Result<()> {
        let discoverer = Discoverer::new(definition)?;
        let extractor = Extractor::new(definition.clone());

        let candidates = discoverer
            .discover(page, self.throttler.as_ref(), definition, request)
            .await?;
        report.phase = SessionPhase::SearchLoaded;
        report.candidates_found = candidates.len();

        for candidate in &candidates {
            if report.profiles.len() >= request.max_profiles {
                break;
            }

            match self.visit(page, definition, &extractor, candidate).await {
                ItemOutcome::Extracted(mut profile) => {
                    profile.source = Some(definition.label.clone());
                    info!(
                        platform = %definition.platform,
                        url = %candidate,
                        name = %profile.full_name,
                        "profile extracted"
                    );
                    report.profiles.push(*profile);
                }
                ItemOutcome::Skipped(reason) => {
                    debug!(platform = %definition.platform, url = %candidate, ?reason, "candidate skipped");
                    report.skipped += 1;
                }
            }
        }

        Ok(())
    }

    /// Throttle, navigate, check, extract and validate one candidate.
    async fn visit(
        &self,
        page: &dyn PageActions,
        definition: &PlatformDefinition,
        extractor: &Extractor,
        candidate: &CandidateUrl,
    ) -> ItemOutcome {
        let platform = definition.platform;
        self.throttler
            .pause(platform, ActionKind::ProfileNavigation)
            .await;

        let timeout = Duration::from_millis(definition.profile.timeout_ms);
        if let Err(e) = page
            .goto(candidate.as_str(), WaitUntil::DomContentLoaded, timeout)
            .await
        {
            warn!(
                platform = %platform,
                url = %candidate,
                timed_out = e.is_timeout(),
                error = %e,
                "profile navigation failed"
            );
            return ItemOutcome::Skipped(SkipReason::Navigation);
        }

        self.throttler
            .pause(platform, ActionKind::ProfileSettle)
            .await;

        if !extractor.is_profile_page(page).await {
            return ItemOutcome::Skipped(SkipReason::NotAProfile);
        }

        let profile = extractor.extract(page, candidate).await;
        if !profile.has_name() {
            return ItemOutcome::Skipped(SkipReason::MissingName);
        }
        ItemOutcome::Extracted(Box::new(profile))
    }
}
