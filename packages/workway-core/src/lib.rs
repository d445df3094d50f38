//! # Workway Core
//!
//! Shared failure semantics for the Workway platform: a closed error
//! taxonomy, breakdown severities, a bounded retry executor, and
//! correlation IDs.
//!
//! ## Core Concepts
//!
//! - [`WorkwayError`] — every failure, classified by a closed [`ErrorCode`]
//!   at the boundary where it occurs. Category, retryability, and user
//!   messaging all derive from the code.
//! - [`BreakdownSeverity`] — how loudly a failure surfaces, from `Silent`
//!   (retried invisibly) to `Blocking` (user must act). Derived from the
//!   code, never from message text.
//! - [`with_retry`] — the one retry loop. Sequential attempts, backoff with
//!   jitter, provider `Retry-After` hints win over computed delays.
//! - [`CorrelationId`] — one ID per request, on every error it produces,
//!   propagated in the `x-workway-correlation-id` header.
//!
//! ## Key Invariants
//!
//! 1. **Statuses become codes once** — [`WorkwayError::from_status`] is the
//!    only status→code conversion; everything above it branches on codes.
//! 2. **Code mappings are pure and total** — every code has exactly one
//!    category, default retryability, retry budget, and severity.
//! 3. **Retries are sequential** — between attempts the task sleeps on a
//!    timer; attempts never race each other.
//!
//! ## Example
//!
//! ```ignore
//! use workway_core::{with_retry, RetryPolicy, WorkwayError};
//!
//! let events = with_retry(RetryPolicy::default(), |_attempt| async {
//!     let response = fetch_calendar().await?;
//!     if response.status() == 200 {
//!         Ok(response)
//!     } else {
//!         Err(WorkwayError::from_status(response.status(), "calendar fetch failed"))
//!     }
//! })
//! .await?;
//! ```

pub mod breakdown;
pub mod correlation;
pub mod error;
pub mod retry;

// Error taxonomy
pub use error::{ErrorCategory, ErrorCode, Result, WorkwayError};

// Breakdown classification
pub use breakdown::{BreakdownKind, BreakdownSeverity};

// Retry executor
pub use retry::{
    default_retry_decision, parse_retry_after, rate_limit_predicate,
    rate_limit_predicate_observed, with_retry, with_retry_if, with_retry_observed, BackoffKind,
    RetryPolicy,
};

// Correlation
pub use correlation::{CorrelationId, CORRELATION_HEADER};
