//! Address-keyed refresh throttling.

use cl_lens_domain::Address;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cooldown and failure-backoff windows.
#[derive(Debug, Clone)]
pub struct RefreshGuardConfig {
    /// Minimum spacing between refreshes of one address.
    pub cooldown: Duration,
    /// Retry suppression after a failed refresh.
    pub failure_backoff: Duration,
}

impl Default for RefreshGuardConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(15),
            failure_backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum LastOutcome {
    Succeeded(Instant),
    Failed(Instant),
}

/// Rate limiter owned by the orchestrating caller.
///
/// The engine itself keeps no cross-refresh state; callers that want to
/// throttle repeated refreshes hold one of these next to the pipeline.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    config: RefreshGuardConfig,
    last: HashMap<Address, LastOutcome>,
}

impl RefreshGuard {
    #[must_use]
    pub fn new(config: RefreshGuardConfig) -> Self {
        Self {
            config,
            last: HashMap::new(),
        }
    }

    /// Whether a refresh for `owner` may start now.
    #[must_use]
    pub fn ready(&self, owner: &Address) -> bool {
        match self.last.get(owner) {
            None => true,
            Some(LastOutcome::Succeeded(at)) => at.elapsed() >= self.config.cooldown,
            Some(LastOutcome::Failed(at)) => at.elapsed() >= self.config.failure_backoff,
        }
    }

    pub fn record_success(&mut self, owner: &Address) {
        self.last
            .insert(owner.clone(), LastOutcome::Succeeded(Instant::now()));
    }

    pub fn record_failure(&mut self, owner: &Address) {
        self.last
            .insert(owner.clone(), LastOutcome::Failed(Instant::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".parse().unwrap()
    }

    #[test]
    fn first_refresh_is_always_ready() {
        let guard = RefreshGuard::default();
        assert!(guard.ready(&owner()));
    }

    #[test]
    fn success_starts_the_cooldown_window() {
        let mut guard = RefreshGuard::new(RefreshGuardConfig {
            cooldown: Duration::from_secs(3600),
            failure_backoff: Duration::ZERO,
        });
        guard.record_success(&owner());
        assert!(!guard.ready(&owner()));
    }

    #[test]
    fn failure_uses_the_backoff_window() {
        let mut guard = RefreshGuard::new(RefreshGuardConfig {
            cooldown: Duration::ZERO,
            failure_backoff: Duration::from_secs(3600),
        });
        guard.record_failure(&owner());
        assert!(!guard.ready(&owner()));
    }

    #[test]
    fn elapsed_windows_reopen() {
        let mut guard = RefreshGuard::new(RefreshGuardConfig {
            cooldown: Duration::ZERO,
            failure_backoff: Duration::ZERO,
        });
        guard.record_success(&owner());
        assert!(guard.ready(&owner()));
        guard.record_failure(&owner());
        assert!(guard.ready(&owner()));
    }

    #[test]
    fn addresses_are_throttled_independently() {
        let mut guard = RefreshGuard::new(RefreshGuardConfig {
            cooldown: Duration::from_secs(3600),
            failure_backoff: Duration::from_secs(3600),
        });
        guard.record_success(&owner());
        let other: Address = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
            .parse()
            .unwrap();
        assert!(guard.ready(&other));
    }
}
