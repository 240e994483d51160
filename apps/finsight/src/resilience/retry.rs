//! Retry with exponential backoff for asynchronous gateway calls.
//!
//! [`Retry`] wraps any `FnMut() -> Future<Output = Result<T, E>>` and re-runs
//! it while the failure is classified as retryable by the [`RetryPolicy`].
//!
//! # Retryable Failures (default policy)
//!
//! | Retryable | Non-Retryable |
//! |-----------|---------------|
//! | Connection reset / refused | Unknown ISIN |
//! | Timeouts | Rejected credential |
//! | HTTP 5xx | Undecodable response |
//! | HTTP 429 (Rate Limited) | Other HTTP 4xx |
//!
//! # Example
//!
//! ```rust,ignore
//! use finsight::resilience::{Retry, RetryPolicy};
//! use std::time::Duration;
//!
//! let retry = Retry::new(RetryPolicy::new(5, Duration::from_millis(500), 2.0))?;
//!
//! // Delays between attempts: 500ms, 1s, 2s, 4s
//! let accounts = retry.run(|| session.get_accounts()).await?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{FailureKind, GatewayError};

/// Errors that can tell which [`FailureKind`] they belong to.
pub trait Classify {
    /// Category used for the retry decision.
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for GatewayError {
    fn failure_kind(&self) -> FailureKind {
        self.kind()
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `0` disables retrying.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after every retry (>= 1.0).
    pub backoff_multiplier: f64,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Failure kinds that trigger a retry.
    pub retryable: HashSet<FailureKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            retryable: FailureKind::transient().collect(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy retrying transport-level failures.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
            ..Self::default()
        }
    }

    /// Set the delay cap.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Replace the set of retryable failure kinds.
    #[must_use]
    pub fn with_retryable(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.retryable = kinds.into_iter().collect();
        self
    }

    /// Whether failures of `kind` are retried.
    #[must_use]
    pub fn is_retryable(&self, kind: FailureKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Check the policy values.
    pub fn validate(&self) -> Result<(), RetryConfigError> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(RetryConfigError::InvalidMultiplier(self.backoff_multiplier));
        }
        if self.max_delay < self.initial_delay {
            return Err(RetryConfigError::DelayBounds {
                initial_delay: self.initial_delay,
                max_delay: self.max_delay,
            });
        }
        Ok(())
    }
}

/// Invalid retry configuration, reported when the wrapper is built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetryConfigError {
    /// Multiplier below 1.0, NaN or infinite.
    #[error("backoff_multiplier must be a finite number >= 1.0, got {0}")]
    InvalidMultiplier(f64),

    /// Delay cap shorter than the first delay.
    #[error("max_delay ({max_delay:?}) is shorter than initial_delay ({initial_delay:?})")]
    DelayBounds {
        /// Configured first delay.
        initial_delay: Duration,
        /// Configured cap.
        max_delay: Duration,
    },
}

/// Outcome of [`Retry::run_cancellable`] when it does not succeed.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The token fired before the operation completed.
    #[error("operation cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts started before cancellation.
        attempts: u32,
    },

    /// The operation failed and was not retried further.
    #[error(transparent)]
    Failed(E),
}

impl From<RetryError<GatewayError>> for GatewayError {
    fn from(err: RetryError<GatewayError>) -> Self {
        match err {
            RetryError::Failed(err) => err,
            RetryError::Cancelled { attempts } => Self::Cancelled { attempts },
        }
    }
}

impl<E> RetryError<E> {
    /// The operation's own error, if it got that far.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(err) => Some(err),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Exponential backoff sequence: `d, d·m, d·m², …`, capped at the policy's `max_delay`.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    multiplier: f64,
    max_delay: Duration,
}

impl Backoff {
    /// Start a sequence for `policy`.
    #[must_use]
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            current: policy.initial_delay.min(policy.max_delay),
            multiplier: policy.backoff_multiplier,
            max_delay: policy.max_delay,
        }
    }

    /// Delay that the next call to [`Backoff::advance`] returns.
    #[must_use]
    pub const fn current(&self) -> Duration {
        self.current
    }

    /// Return the current delay and step to the next one.
    pub fn advance(&mut self) -> Duration {
        let delay = self.current;
        let next = (self.current.as_secs_f64() * self.multiplier).min(self.max_delay.as_secs_f64());
        self.current = Duration::from_secs_f64(next);
        delay
    }
}

/// Sink notified once per retried (non-final) failure.
pub trait RetryObserver: Send + Sync {
    /// Called before sleeping `delay` ahead of attempt `attempt + 1`.
    fn on_retry(&self, attempt: u32, max_attempts: u32, delay: Duration, error: &dyn fmt::Display);
}

/// Observer writing a `tracing` warning per retry.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRetryObserver;

impl RetryObserver for TracingRetryObserver {
    fn on_retry(&self, attempt: u32, max_attempts: u32, delay: Duration, error: &dyn fmt::Display) {
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retryable failure, retrying"
        );
    }
}

/// Retry wrapper for asynchronous operations.
#[derive(Clone)]
pub struct Retry {
    policy: RetryPolicy,
    observer: Arc<dyn RetryObserver>,
}

impl fmt::Debug for Retry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Retry {
    /// Build a wrapper, rejecting an invalid policy.
    pub fn new(policy: RetryPolicy) -> Result<Self, RetryConfigError> {
        policy.validate()?;
        Ok(Self {
            policy,
            observer: Arc::new(TracingRetryObserver),
        })
    }

    /// Replace the default tracing observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The active policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, retrying retryable failures.
    ///
    /// Returns the first success, the first non-retryable failure, or the
    /// failure of the last permitted attempt.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        // Retrying disabled: one plain call.
        if self.policy.max_attempts == 0 {
            return operation().await;
        }

        let mut backoff = Backoff::new(&self.policy);
        let mut attempt = 1;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let Some(delay) = self.schedule_retry(attempt, &err, &mut backoff) else {
                return Err(err);
            };
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Like [`Retry::run`], but stops as soon as `token` is cancelled.
    ///
    /// No attempt starts after cancellation is observed; an attempt or delay
    /// in flight is abandoned.
    pub async fn run_cancellable<T, E, F, Fut>(
        &self,
        token: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let mut backoff = Backoff::new(&self.policy);
        let mut attempt = 1;
        loop {
            if token.is_cancelled() {
                return Err(RetryError::Cancelled {
                    attempts: attempt - 1,
                });
            }

            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => return Err(RetryError::Cancelled { attempts: attempt }),
                outcome = operation() => outcome,
            };
            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let Some(delay) = self.schedule_retry(attempt, &err, &mut backoff) else {
                return Err(RetryError::Failed(err));
            };

            tokio::select! {
                biased;
                () = token.cancelled() => return Err(RetryError::Cancelled { attempts: attempt }),
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// Decide whether `attempt` failing with `err` gets another try.
    fn schedule_retry<E>(&self, attempt: u32, err: &E, backoff: &mut Backoff) -> Option<Duration>
    where
        E: Classify + fmt::Display,
    {
        if !self.policy.is_retryable(err.failure_kind()) || attempt >= self.policy.max_attempts {
            return None;
        }
        let delay = backoff.advance();
        self.observer
            .on_retry(attempt, self.policy.max_attempts, delay, err);
        Some(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestError {
        kind: FailureKind,
        attempt: u32,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?} on attempt {}", self.kind, self.attempt)
        }
    }

    impl Classify for TestError {
        fn failure_kind(&self) -> FailureKind {
            self.kind
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        entries: Mutex<Vec<(u32, u32, Duration, String)>>,
    }

    impl RecordingObserver {
        fn count(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        fn delays(&self) -> Vec<Duration> {
            self.entries.lock().unwrap().iter().map(|e| e.2).collect()
        }
    }

    impl RetryObserver for RecordingObserver {
        fn on_retry(
            &self,
            attempt: u32,
            max_attempts: u32,
            delay: Duration,
            error: &dyn fmt::Display,
        ) {
            self.entries
                .lock()
                .unwrap()
                .push((attempt, max_attempts, delay, error.to_string()));
        }
    }

    fn retry_with(policy: RetryPolicy) -> (Retry, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let retry = Retry::new(policy)
            .unwrap()
            .with_observer(Arc::clone(&observer) as Arc<dyn RetryObserver>);
        (retry, observer)
    }

    /// Fails with `kind` for the first `failures` calls, then returns the call number.
    async fn flaky(calls: &AtomicU32, failures: u32, kind: FailureKind) -> Result<u32, TestError> {
        let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= failures {
            Err(TestError { kind, attempt })
        } else {
            Ok(attempt)
        }
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert!((policy.backoff_multiplier - 2.0).abs() < f64::EPSILON);
        assert!(policy.is_retryable(FailureKind::Transport));
        assert!(policy.is_retryable(FailureKind::Timeout));
        assert!(policy.is_retryable(FailureKind::RateLimited));
        assert!(!policy.is_retryable(FailureKind::NotFound));
        assert!(!policy.is_retryable(FailureKind::Unauthorized));
    }

    #[test]
    fn backoff_sequence() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), 2.0);
        let mut backoff = Backoff::new(&policy);

        assert_eq!(backoff.current(), Duration::from_millis(100));
        assert_eq!(backoff.advance(), Duration::from_millis(100));
        assert_eq!(backoff.advance(), Duration::from_millis(200));
        assert_eq!(backoff.advance(), Duration::from_millis(400));
        assert_eq!(backoff.advance(), Duration::from_millis(800));
    }

    #[test]
    fn backoff_respects_max_delay() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), 10.0)
            .with_max_delay(Duration::from_secs(5));
        let mut backoff = Backoff::new(&policy);

        assert_eq!(backoff.advance(), Duration::from_secs(1));
        assert_eq!(backoff.advance(), Duration::from_secs(5));
        assert_eq!(backoff.advance(), Duration::from_secs(5));
    }

    #[test]
    fn backoff_multiplier_one_is_constant() {
        let policy = RetryPolicy::new(3, Duration::from_millis(250), 1.0);
        let mut backoff = Backoff::new(&policy);
        assert_eq!(backoff.advance(), Duration::from_millis(250));
        assert_eq!(backoff.advance(), Duration::from_millis(250));
    }

    #[test]
    fn rejects_invalid_multiplier() {
        for multiplier in [0.5, 0.0, -2.0, f64::NAN, f64::INFINITY] {
            let policy = RetryPolicy::new(3, Duration::from_millis(10), multiplier);
            let Err(err) = Retry::new(policy) else {
                panic!("multiplier {multiplier} should be rejected");
            };
            assert!(matches!(err, RetryConfigError::InvalidMultiplier(_)));
        }
    }

    #[test]
    fn rejects_max_delay_below_initial() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2), 2.0)
            .with_max_delay(Duration::from_secs(1));
        let Err(err) = Retry::new(policy) else {
            panic!("expected delay bounds error");
        };
        assert!(err.to_string().contains("max_delay"));
    }

    #[tokio::test(start_paused = true)]
    async fn every_attempt_failing_runs_max_attempts_times() {
        for max_attempts in 1..=5 {
            let (retry, observer) =
                retry_with(RetryPolicy::new(max_attempts, Duration::from_millis(10), 2.0));
            let calls = AtomicU32::new(0);

            let err = retry
                .run(|| flaky(&calls, u32::MAX, FailureKind::Transport))
                .await
                .unwrap_err();

            assert_eq!(calls.load(Ordering::SeqCst), max_attempts);
            assert_eq!(err.attempt, max_attempts, "last attempt's error is propagated");
            assert_eq!(observer.count(), (max_attempts - 1) as usize);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let (retry, observer) = retry_with(RetryPolicy::new(5, Duration::from_millis(10), 2.0));
        let calls = AtomicU32::new(0);

        let value = retry
            .run(|| flaky(&calls, 2, FailureKind::Timeout))
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(observer.count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_does_not_sleep() {
        let (retry, observer) = retry_with(RetryPolicy::new(5, Duration::from_secs(1), 2.0));
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        retry.run(|| flaky(&calls, 0, FailureKind::Transport)).await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(observer.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_attempts_calls_once() {
        let (retry, observer) = retry_with(RetryPolicy::new(0, Duration::from_millis(10), 2.0));

        let calls = AtomicU32::new(0);
        let err = retry
            .run(|| flaky(&calls, u32::MAX, FailureKind::Transport))
            .await
            .unwrap_err();
        assert_eq!(err, TestError { kind: FailureKind::Transport, attempt: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = AtomicU32::new(0);
        let value = retry
            .run(|| flaky(&calls, 0, FailureKind::Transport))
            .await
            .unwrap();
        assert_eq!(value, 1);

        assert_eq!(observer.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_failure_propagates_immediately() {
        for kind in [FailureKind::NotFound, FailureKind::Unauthorized, FailureKind::Upstream] {
            let (retry, observer) =
                retry_with(RetryPolicy::new(5, Duration::from_millis(10), 2.0));
            let calls = AtomicU32::new(0);

            let err = retry
                .run(|| flaky(&calls, u32::MAX, kind))
                .await
                .unwrap_err();

            assert_eq!(err.kind, kind);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(observer.count(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn custom_retryable_set() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), 2.0)
            .with_retryable([FailureKind::Upstream]);
        let (retry, _observer) = retry_with(policy);

        let calls = AtomicU32::new(0);
        retry
            .run(|| flaky(&calls, u32::MAX, FailureKind::Upstream))
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let calls = AtomicU32::new(0);
        retry
            .run(|| flaky(&calls, u32::MAX, FailureKind::Transport))
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_follow_backoff() {
        let (retry, observer) = retry_with(RetryPolicy::new(5, Duration::from_millis(100), 2.0));
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        retry
            .run(|| flaky(&calls, u32::MAX, FailureKind::Transport))
            .await
            .unwrap_err();

        assert_eq!(
            observer.delays(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn observer_receives_attempt_details() {
        let (retry, observer) = retry_with(RetryPolicy::new(3, Duration::from_millis(10), 2.0));
        let calls = AtomicU32::new(0);

        retry
            .run(|| flaky(&calls, u32::MAX, FailureKind::Transport))
            .await
            .unwrap_err();

        let entries = observer.entries.lock().unwrap().clone();
        assert_eq!(entries[0].0, 1);
        assert_eq!(entries[0].1, 3);
        assert_eq!(entries[0].3, "Transport on attempt 1");
        assert_eq!(entries[1].0, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_delay_stops_retrying() {
        let (retry, _observer) = retry_with(RetryPolicy::new(5, Duration::from_secs(10), 2.0));
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let err = retry
            .run_cancellable(&token, || flaky(&calls, u32::MAX, FailureKind::Transport))
            .await
            .unwrap_err();

        assert!(matches!(err, RetryError::Cancelled { attempts: 1 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_prevents_first_attempt() {
        let (retry, _observer) = retry_with(RetryPolicy::default());
        let token = CancellationToken::new();
        token.cancel();
        let calls = AtomicU32::new(0);

        let err = retry
            .run_cancellable(&token, || flaky(&calls, 0, FailureKind::Transport))
            .await
            .unwrap_err();

        assert!(matches!(err, RetryError::Cancelled { attempts: 0 }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellable_run_matches_plain_run_without_cancellation() {
        let (retry, observer) = retry_with(RetryPolicy::new(4, Duration::from_millis(10), 2.0));
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let err = retry
            .run_cancellable(&token, || flaky(&calls, u32::MAX, FailureKind::Timeout))
            .await
            .unwrap_err();

        let failure = err.into_failure().unwrap();
        assert_eq!(failure.attempt, 4);
        assert_eq!(observer.count(), 3);
    }

    #[test]
    fn default_retryable_set_follows_transient_kinds() {
        let policy = RetryPolicy::default();
        for kind in FailureKind::ALL {
            assert_eq!(policy.is_retryable(kind), kind.is_transient(), "{kind:?}");
        }
    }

    #[test]
    fn retry_error_converts_to_gateway_error() {
        let cancelled = GatewayError::from(RetryError::<GatewayError>::Cancelled { attempts: 1 });
        assert_eq!(cancelled, GatewayError::Cancelled { attempts: 1 });

        let failed = GatewayError::from(RetryError::Failed(GatewayError::transport("reset")));
        assert_eq!(failed, GatewayError::transport("reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn gateway_errors_are_classified() {
        let (retry, observer) = retry_with(RetryPolicy::new(3, Duration::from_millis(10), 2.0));
        let calls = AtomicU32::new(0);

        let err = retry
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(GatewayError::InstrumentNotFound {
                    isin: "RU0009029540".to_string(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(observer.count(), 0);
    }

    proptest! {
        #[test]
        fn attempts_and_warnings_are_bounded(max_attempts in 1u32..8, failures in 0u32..10) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();

            let (calls, warnings, succeeded) = runtime.block_on(async {
                let (retry, observer) =
                    retry_with(RetryPolicy::new(max_attempts, Duration::from_millis(5), 1.5));
                let calls = AtomicU32::new(0);
                let outcome = retry.run(|| flaky(&calls, failures, FailureKind::Transport)).await;
                (calls.load(Ordering::SeqCst), observer.count() as u32, outcome.is_ok())
            });

            prop_assert_eq!(calls, (failures + 1).min(max_attempts));
            prop_assert_eq!(warnings, failures.min(max_attempts - 1));
            prop_assert_eq!(succeeded, failures < max_attempts);
        }
    }
}
