//! Bounded retry with backoff, jitter, and provider wait hints.
//!
//! Every retry in the platform goes through [`with_retry`] or one of its
//! variants. The executor runs the operation, asks a predicate whether the
//! failure is worth another attempt, sleeps, and tries again — up to the
//! policy's attempt budget. Attempts are strictly sequential: between
//! attempts the task is suspended on a tokio timer, never racing a second
//! attempt against the first.
//!
//! # The Hint Rule
//!
//! > **A provider that says when to come back wins over our own backoff.**
//!
//! When a failed attempt's error carries a [`retry_after`] hint (parsed off a
//! `Retry-After` header at the HTTP boundary), that hint replaces the
//! computed backoff delay for the next sleep. [`rate_limit_predicate`]
//! builds on the same hint to refuse retries whose wait would exceed a
//! caller-chosen budget.
//!
//! [`retry_after`]: crate::error::WorkwayError::retry_after
//!
//! # Example
//!
//! ```ignore
//! use workway_core::{with_retry, RetryPolicy};
//!
//! let page = with_retry(RetryPolicy::default(), |attempt| {
//!     client.get_json::<Page>("/calendar/events", &[])
//! })
//! .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ErrorCode, Result, WorkwayError};

// =============================================================================
// Policy
// =============================================================================

/// Shape of the delay curve between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffKind {
    /// `initial · 2^(attempt-1)` — doubles every attempt.
    #[default]
    Exponential,
    /// `initial · attempt` — grows by one `initial` per attempt.
    Linear,
    /// `initial` every time.
    Constant,
}

/// Retry budget and delay curve.
///
/// Plain data, cheap to clone. The default is three attempts with
/// exponential backoff from one second, capped at thirty, with 10% jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total invocation budget, counting the first attempt. Treated as at
    /// least 1; `1` means no retries.
    pub max_attempts: u32,
    /// Delay curve between attempts.
    pub backoff: BackoffKind,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Ceiling applied to every computed delay.
    pub max_delay: Duration,
    /// Jitter fraction in `[0, 1]`: each delay is perturbed by a uniform
    /// draw in `±(delay · jitter)`. Zero makes delays exactly deterministic.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffKind::Exponential,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Default policy with a different attempt budget.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Set the delay curve.
    pub fn with_backoff(mut self, backoff: BackoffKind) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the delay before the second attempt.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay ceiling.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the jitter fraction, clamped to `[0, 1]`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Pre-jitter delay after the given attempt (counted from 1), capped at
    /// `max_delay`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff {
            BackoffKind::Exponential => {
                // 2^(attempt-1) overflows u32 past attempt 32; saturate, the
                // cap below flattens it anyway.
                let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
                self.initial_delay.saturating_mul(factor)
            }
            BackoffKind::Linear => self.initial_delay.saturating_mul(attempt),
            BackoffKind::Constant => self.initial_delay,
        };
        delay.min(self.max_delay)
    }

    /// Actual delay after the given attempt: [`base_delay`](Self::base_delay)
    /// perturbed by the jitter draw, clamped at zero.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter <= 0.0 {
            return base;
        }
        let spread = base.as_secs_f64() * self.jitter.min(1.0);
        // Uniform in [-spread, +spread].
        let offset = fastrand::f64() * 2.0 * spread - spread;
        let perturbed = base.as_secs_f64() + offset;
        if perturbed <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(perturbed)
        }
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// The platform-default retry decision.
///
/// With an HTTP status on the error, retry exactly the server-fault statuses
/// (≥ 500) and throttling (429). Without a status, retry network-class
/// failures (connection, upstream health, deadline) unconditionally; refuse
/// `Unknown` — retrying an unclassified failure just repeats it blind — and
/// fall back to the error's own retryability for everything else. Explicit
/// cancellation is never retried.
pub fn default_retry_decision(err: &WorkwayError) -> bool {
    if err.code == ErrorCode::Cancelled {
        return false;
    }
    if let Some(status) = err.status {
        return status >= 500 || status == 429;
    }
    if err.is_network_error() {
        return true;
    }
    if err.code == ErrorCode::Unknown {
        return false;
    }
    err.is_retryable()
}

/// Retry predicate that respects a wait budget on rate-limit hints.
///
/// When the error carries a `retry_after` hint longer than `max_wait`, the
/// retry is refused. Errors without a hint defer to
/// [`default_retry_decision`].
pub fn rate_limit_predicate(max_wait: Duration) -> impl FnMut(&WorkwayError) -> bool {
    rate_limit_predicate_observed(max_wait, |_| {})
}

/// [`rate_limit_predicate`] with an observer invoked with the refused wait
/// whenever a hint exceeds the budget.
pub fn rate_limit_predicate_observed<O>(
    max_wait: Duration,
    mut on_refusal: O,
) -> impl FnMut(&WorkwayError) -> bool
where
    O: FnMut(Duration),
{
    move |err: &WorkwayError| match err.retry_after {
        Some(wait) if wait > max_wait => {
            on_refusal(wait);
            false
        }
        Some(_) => true,
        None => default_retry_decision(err),
    }
}

// =============================================================================
// Execution
// =============================================================================

/// Run `op` with the default retry decision.
///
/// `op` receives the 1-based attempt number. On final failure the last
/// error is returned unchanged.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_if(policy, default_retry_decision, op).await
}

/// Run `op`, retrying only failures the predicate approves.
///
/// A predicate returning `false` stops after the current attempt regardless
/// of the remaining budget.
pub async fn with_retry_if<T, P, F, Fut>(policy: RetryPolicy, predicate: P, op: F) -> Result<T>
where
    P: FnMut(&WorkwayError) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_observed(policy, predicate, |_, _, _| {}, op).await
}

/// Full-control variant: the observer sees `(error, attempt, upcoming
/// delay)` before each sleep.
///
/// The sleep honors the error's `retry_after` hint over the computed
/// backoff delay.
pub async fn with_retry_observed<T, P, O, F, Fut>(
    policy: RetryPolicy,
    mut predicate: P,
    mut observer: O,
    mut op: F,
) -> Result<T>
where
    P: FnMut(&WorkwayError) -> bool,
    O: FnMut(&WorkwayError, u32, Duration),
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts || !predicate(&err) {
                    return Err(err);
                }
                let delay = err.retry_after.unwrap_or_else(|| policy.next_delay(attempt));
                observer(&err, attempt, delay);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    code = %err.code,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

// =============================================================================
// Retry-After parsing
// =============================================================================

/// Parse a `Retry-After` header value into a wait duration.
///
/// Accepts delta-seconds (`"60"`) or an HTTP-date. A date already in the
/// past yields a zero wait, never a negative one. Absent or unparseable
/// values yield `None`.
pub fn parse_retry_after(header: Option<&str>) -> Option<Duration> {
    let value = header?.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let date: DateTime<Utc> = DateTime::parse_from_rfc2822(value)
        .ok()?
        .with_timezone(&Utc);
    match (date - Utc::now()).to_std() {
        Ok(wait) => Some(wait),
        // Negative span: the date has passed, retry immediately.
        Err(_) => Some(Duration::ZERO),
    }
}
