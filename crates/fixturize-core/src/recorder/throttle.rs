//! Spacing for mutating requests.
//!
//! GitHub's secondary rate limits punish bursts of content-creating
//! requests, so writes are spaced at least `min_spacing` apart. Reads are
//! never delayed.

use std::time::{Duration, Instant};

use tracing::debug;

/// Methods that are spaced apart.
const MUTATING_METHODS: &[&str] = &["DELETE", "PATCH", "POST", "PUT"];

/// Returns `true` if requests with `method` are throttled.
#[must_use]
pub fn is_mutating(method: &str) -> bool {
    MUTATING_METHODS
        .iter()
        .any(|m| m.eq_ignore_ascii_case(method))
}

/// Enforces a minimum interval between mutating requests.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_spacing: Duration,
    last_mutation: Option<Instant>,
}

impl Throttle {
    /// Creates a throttle with the given minimum spacing.
    #[must_use]
    pub const fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last_mutation: None,
        }
    }

    /// A throttle that never delays.
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// How long a request with `method` issued at `now` has to wait.
    #[must_use]
    pub fn delay_for(&self, method: &str, now: Instant) -> Duration {
        if !is_mutating(method) {
            return Duration::ZERO;
        }
        self.last_mutation.map_or(Duration::ZERO, |last| {
            (last + self.min_spacing).saturating_duration_since(now)
        })
    }

    /// Blocks until a request with `method` may be sent, then records it.
    pub fn acquire(&mut self, method: &str) {
        let delay = self.delay_for(method, Instant::now());
        if !delay.is_zero() {
            debug!(method, ?delay, "throttling mutating request");
            std::thread::sleep(delay);
        }
        if is_mutating(method) {
            self.last_mutation = Some(Instant::now());
        }
    }
}
