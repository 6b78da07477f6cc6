//! Round source abstraction.
//!
//! A round source answers "what is the latest round?". Implementations may
//! query a coordinator over the network, read a local cache, or anything else.
//! Fetching is the only operation in session activation that may suspend.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use callwheel_core::Round;

use crate::error::{Result, RoundError};

/// Source of the latest globally known round.
///
/// Implementations must be thread-safe (Send + Sync). A failed fetch is
/// transient; callers decide whether to retry.
#[async_trait]
pub trait RoundSource: Send + Sync {
    /// Fetch the latest round.
    async fn latest_round(&self) -> Result<Round>;
}

#[async_trait]
impl<S: RoundSource + ?Sized> RoundSource for Arc<S> {
    async fn latest_round(&self) -> Result<Round> {
        (**self).latest_round().await
    }
}

/// Bounds every fetch of the inner source with a timeout.
pub struct TimeoutRoundSource<S> {
    inner: S,
    timeout: Duration,
}

impl<S: RoundSource> TimeoutRoundSource<S> {
    /// Wrap a source.
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<S: RoundSource> RoundSource for TimeoutRoundSource<S> {
    async fn latest_round(&self) -> Result<Round> {
        match tokio::time::timeout(self.timeout, self.inner.latest_round()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(timeout = ?self.timeout, "latest round fetch timed out");
                Err(RoundError::Timeout(self.timeout))
            }
        }
    }
}

/// Never reports a round lower than one it has already returned.
///
/// Replicas of the round service may lag each other; this keeps a client's
/// view non-decreasing across fetches.
pub struct MonotonicRoundSource<S> {
    inner: S,
    high_water: AtomicU32,
}

impl<S: RoundSource> MonotonicRoundSource<S> {
    /// Wrap a source.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            high_water: AtomicU32::new(0),
        }
    }

    /// Highest round returned so far.
    pub fn high_water(&self) -> Round {
        Round(self.high_water.load(Ordering::Acquire))
    }
}

#[async_trait]
impl<S: RoundSource> RoundSource for MonotonicRoundSource<S> {
    async fn latest_round(&self) -> Result<Round> {
        let fetched = self.inner.latest_round().await?;
        let previous = self.high_water.fetch_max(fetched.0, Ordering::AcqRel);
        if previous > fetched.0 {
            tracing::debug!(
                fetched = fetched.0,
                high_water = previous,
                "round source went backwards, keeping high water mark"
            );
            return Ok(Round(previous));
        }
        Ok(fetched)
    }
}

/// A controllable in-memory round source for tests.
pub mod memory {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct ManualState {
        round: Round,
        /// Failures returned by the next fetches, in order.
        queued_failures: VecDeque<RoundError>,
        /// Failure returned by every fetch while set.
        outage: Option<RoundError>,
    }

    /// Round source whose answers are set by the test.
    pub struct ManualRoundSource {
        state: Mutex<ManualState>,
        fetches: AtomicUsize,
    }

    impl ManualRoundSource {
        /// Create a source reporting `round`.
        pub fn new(round: Round) -> Self {
            Self {
                state: Mutex::new(ManualState {
                    round,
                    queued_failures: VecDeque::new(),
                    outage: None,
                }),
                fetches: AtomicUsize::new(0),
            }
        }

        /// Set the reported round.
        pub fn set_round(&self, round: Round) {
            self.state.lock().unwrap().round = round;
        }

        /// Advance the reported round.
        pub fn advance(&self, rounds: u32) {
            let mut state = self.state.lock().unwrap();
            state.round = Round(state.round.0.saturating_add(rounds));
        }

        /// Make the next fetch fail with `err`.
        pub fn fail_next(&self, err: RoundError) {
            self.state.lock().unwrap().queued_failures.push_back(err);
        }

        /// Fail every fetch with `err` until cleared with `None`.
        pub fn set_outage(&self, err: Option<RoundError>) {
            self.state.lock().unwrap().outage = err;
        }

        /// Number of fetches attempted.
        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RoundSource for ManualRoundSource {
        async fn latest_round(&self) -> Result<Round> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            if let Some(err) = state.queued_failures.pop_front() {
                return Err(err);
            }
            if let Some(err) = &state.outage {
                return Err(err.clone());
            }
            Ok(state.round)
        }
    }

    /// Round source that never answers; for timeout tests.
    pub struct StalledRoundSource;

    #[async_trait]
    impl RoundSource for StalledRoundSource {
        async fn latest_round(&self) -> Result<Round> {
            std::future::pending().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{ManualRoundSource, StalledRoundSource};
    use super::*;

    #[tokio::test]
    async fn test_manual_source_reports_round() {
        let source = ManualRoundSource::new(Round(100));
        assert_eq!(source.latest_round().await.unwrap(), Round(100));

        source.advance(5);
        assert_eq!(source.latest_round().await.unwrap(), Round(105));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_manual_source_queued_failure() {
        let source = ManualRoundSource::new(Round(7));
        source.fail_next(RoundError::Unavailable("connection reset".into()));

        assert!(source.latest_round().await.is_err());
        assert_eq!(source.latest_round().await.unwrap(), Round(7));
    }

    #[tokio::test]
    async fn test_manual_source_outage() {
        let source = ManualRoundSource::new(Round(7));
        source.set_outage(Some(RoundError::NotConfigured { round: Round(8) }));

        assert!(source.latest_round().await.is_err());
        assert!(source.latest_round().await.is_err());

        source.set_outage(None);
        assert_eq!(source.latest_round().await.unwrap(), Round(7));
    }

    #[tokio::test]
    async fn test_timeout_source_times_out() {
        let source = TimeoutRoundSource::new(StalledRoundSource, Duration::from_millis(20));
        let err = source.latest_round().await.unwrap_err();
        assert_eq!(err, RoundError::Timeout(Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_timeout_source_passes_through() {
        let source = TimeoutRoundSource::new(
            ManualRoundSource::new(Round(3)),
            Duration::from_secs(5),
        );
        assert_eq!(source.latest_round().await.unwrap(), Round(3));
    }

    #[tokio::test]
    async fn test_monotonic_source_keeps_high_water() {
        let inner = Arc::new(ManualRoundSource::new(Round(50)));
        let source = MonotonicRoundSource::new(Arc::clone(&inner));

        assert_eq!(source.latest_round().await.unwrap(), Round(50));

        inner.set_round(Round(40));
        assert_eq!(source.latest_round().await.unwrap(), Round(50));

        inner.set_round(Round(60));
        assert_eq!(source.latest_round().await.unwrap(), Round(60));
        assert_eq!(source.high_water(), Round(60));
    }

    #[tokio::test]
    async fn test_monotonic_source_propagates_errors() {
        let inner = Arc::new(ManualRoundSource::new(Round(50)));
        let source = MonotonicRoundSource::new(Arc::clone(&inner));
        inner.fail_next(RoundError::Unavailable("down".into()));

        assert!(source.latest_round().await.is_err());
        assert_eq!(source.high_water(), Round(0));
    }

    proptest::proptest! {
        #[test]
        fn prop_monotonic_never_decreases(rounds in proptest::collection::vec(0u32..10_000, 1..32)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let inner = Arc::new(ManualRoundSource::new(Round(0)));
                let source = MonotonicRoundSource::new(Arc::clone(&inner));
                let mut last = Round(0);
                for r in rounds {
                    inner.set_round(Round(r));
                    let seen = source.latest_round().await.unwrap();
                    assert!(seen >= last);
                    assert!(seen >= Round(r));
                    last = seen;
                }
            });
        }
    }
}
