//! Human-like pacing between browser actions.
//!
//! [`ThrottlePolicy`] is a pure function from `(platform, action)` to a delay
//! range. A [`Throttler`] turns that range into an actual pause; tests inject
//! [`NoDelay`] so nothing waits on the wall clock.

use crate::registry::PlatformRegistry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scout_core::Platform;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// Browser actions that are paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Before navigating to a profile page
    ProfileNavigation,
    /// After each scroll-to-end on a listing page
    Scroll,
    /// After the listing page loads
    SearchSettle,
    /// After a profile page loads
    ProfileSettle,
}

/// Inclusive uniform range of milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    /// Lower bound
    pub min_ms: u64,
    /// Upper bound
    pub max_ms: u64,
}

impl DelayRange {
    /// Range from `min_ms` to `max_ms`; bounds are swapped if given in reverse.
    #[must_use]
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    /// Degenerate range for a fixed delay.
    #[must_use]
    pub fn fixed(ms: u64) -> Self {
        Self::new(ms, ms)
    }

    /// No delay.
    #[must_use]
    pub fn zero() -> Self {
        Self::fixed(0)
    }

    /// Draw a duration from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }
}

/// Delay ranges per platform and action, read from the platform definitions.
#[derive(Debug, Clone, Default)]
pub struct ThrottlePolicy {
    ranges: HashMap<(Platform, ActionKind), DelayRange>,
}

impl ThrottlePolicy {
    /// Build the policy from every definition in `registry`.
    #[must_use]
    pub fn from_registry(registry: &PlatformRegistry) -> Self {
        let mut ranges = HashMap::new();
        for platform in Platform::ALL {
            let Some(definition) = registry.get(platform) else {
                continue;
            };
            let pacing = definition.pacing;
            ranges.insert(
                (platform, ActionKind::ProfileNavigation),
                DelayRange::new(pacing.profile_navigation_ms[0], pacing.profile_navigation_ms[1]),
            );
            ranges.insert(
                (platform, ActionKind::Scroll),
                DelayRange::new(pacing.scroll_ms[0], pacing.scroll_ms[1]),
            );
            ranges.insert(
                (platform, ActionKind::SearchSettle),
                DelayRange::fixed(pacing.search_settle_ms),
            );
            ranges.insert(
                (platform, ActionKind::ProfileSettle),
                DelayRange::fixed(pacing.profile_settle_ms),
            );
        }
        Self { ranges }
    }

    /// Delay range for `kind` on `platform`. Unknown pairs get no delay.
    #[must_use]
    pub fn delay(&self, platform: Platform, kind: ActionKind) -> DelayRange {
        self.ranges
            .get(&(platform, kind))
            .copied()
            .unwrap_or_else(DelayRange::zero)
    }
}

/// Pauses between browser actions.
#[async_trait::async_trait]
pub trait Throttler: Send + Sync {
    /// Wait before or after `kind` on `platform`
    async fn pause(&self, platform: Platform, kind: ActionKind);
}

/// Sleeps for a random duration drawn from the policy.
pub struct RandomThrottler {
    policy: ThrottlePolicy,
    rng: Mutex<StdRng>,
}

impl RandomThrottler {
    /// Throttler seeded from the operating system.
    #[must_use]
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Throttler with a fixed seed, for reproducible delay sequences.
    #[must_use]
    pub fn with_seed(policy: ThrottlePolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draw the next delay without sleeping.
    pub async fn next_delay(&self, platform: Platform, kind: ActionKind) -> Duration {
        let range = self.policy.delay(platform, kind);
        let mut rng = self.rng.lock().await;
        range.sample(&mut *rng)
    }
}

#[async_trait::async_trait]
impl Throttler for RandomThrottler {
    async fn pause(&self, platform: Platform, kind: ActionKind) {
        let delay = self.next_delay(platform, kind).await;
        if delay.is_zero() {
            return;
        }
        tracing::debug!(
            platform = %platform,
            action = ?kind,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "throttling"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait::async_trait]
impl Throttler for NoDelay {
    async fn pause(&self, _platform: Platform, _kind: ActionKind) {}
}
