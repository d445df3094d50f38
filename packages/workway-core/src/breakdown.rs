//! Breakdown severity: how loudly a failure surfaces to the user.
//!
//! A workflow that runs well is invisible. A *breakdown* is the moment it
//! stops being invisible — and not every breakdown deserves the same
//! visibility. A transient network blip heals itself and should never reach
//! the user; an expired credential blocks all progress until the user acts.
//!
//! Severity is derived from the error's structured [`ErrorCode`], never from
//! message text. Matching on message keywords breaks the first time a
//! provider rewords an error; codes are ours and closed.
//!
//! The ladder, quietest first:
//!
//! | Severity       | Surface                                   |
//! |----------------|-------------------------------------------|
//! | `Silent`       | nothing; retried invisibly                |
//! | `Ambient`      | health indicator only                     |
//! | `Notification` | tells the user, workflow keeps running    |
//! | `Blocking`     | workflow paused until the user acts       |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, ErrorCode, WorkwayError};

/// How visibly a breakdown surfaces.
///
/// Ordered quietest to loudest, so `severity >= BreakdownSeverity::Notification`
/// reads as "the user hears about this".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownSeverity {
    /// Transient failure, retried invisibly. The user never knows.
    Silent,
    /// Degraded but self-recovering. Shown only as a health indicator.
    Ambient,
    /// The user should know, but nothing is blocked.
    Notification,
    /// No progress until the user acts.
    Blocking,
}

impl BreakdownSeverity {
    /// Derive severity from a classified error.
    pub fn from_error(err: &WorkwayError) -> Self {
        Self::from_code(err.code)
    }

    /// Derive severity from an error code. Pure and total.
    pub fn from_code(code: ErrorCode) -> Self {
        match code {
            // Transient transport failures: the retry layer absorbs these.
            ErrorCode::Network | ErrorCode::Timeout | ErrorCode::ProviderDown => {
                BreakdownSeverity::Silent
            }
            // Degraded-but-recovering, or internal faults the user can't fix.
            ErrorCode::RateLimited
            | ErrorCode::QuotaExceeded
            | ErrorCode::Database
            | ErrorCode::Processing
            | ErrorCode::AiModel
            | ErrorCode::Api
            | ErrorCode::Conflict
            | ErrorCode::Unknown
            | ErrorCode::Cancelled
            | ErrorCode::NotFound => BreakdownSeverity::Ambient,
            // The user supplied something wrong and can correct it.
            ErrorCode::InvalidInput
            | ErrorCode::Validation
            | ErrorCode::MissingField
            | ErrorCode::Permission
            | ErrorCode::InsufficientScope => BreakdownSeverity::Notification,
            // Nothing proceeds until credentials, config, or billing are fixed.
            ErrorCode::AuthMissing
            | ErrorCode::AuthExpired
            | ErrorCode::AuthInvalid
            | ErrorCode::InvalidConfig
            | ErrorCode::Payment => BreakdownSeverity::Blocking,
        }
    }

    /// Whether breakdowns of this severity resolve themselves without user
    /// involvement.
    pub fn auto_recovers(self) -> bool {
        matches!(self, BreakdownSeverity::Silent)
    }

    /// Whether the user must act before the workflow can make progress.
    pub fn requires_action(self) -> bool {
        matches!(self, BreakdownSeverity::Blocking)
    }
}

impl fmt::Display for BreakdownSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BreakdownSeverity::Silent => "silent",
            BreakdownSeverity::Ambient => "ambient",
            BreakdownSeverity::Notification => "notification",
            BreakdownSeverity::Blocking => "blocking",
        };
        f.write_str(s)
    }
}

/// What kind of thing broke, for grouping breakdowns in health views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownKind {
    /// Workflow or integration configuration problem.
    Configuration,
    /// Credential problem on a connected integration.
    Auth,
    /// Provider throttling or quota exhaustion.
    RateLimit,
    /// An upstream dependency is unreachable or unhealthy.
    Dependency,
    /// Everything else.
    Generic,
}

impl BreakdownKind {
    /// Derive the kind from a classified error.
    pub fn from_error(err: &WorkwayError) -> Self {
        Self::from_code(err.code)
    }

    /// Derive the kind from an error code, via its category.
    pub fn from_code(code: ErrorCode) -> Self {
        match code.category() {
            ErrorCategory::Configuration => BreakdownKind::Configuration,
            ErrorCategory::Authentication => BreakdownKind::Auth,
            ErrorCategory::RateLimit => BreakdownKind::RateLimit,
            ErrorCategory::Network => BreakdownKind::Dependency,
            ErrorCategory::Api | ErrorCategory::Workflow | ErrorCategory::Unknown => {
                BreakdownKind::Generic
            }
        }
    }
}

impl fmt::Display for BreakdownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BreakdownKind::Configuration => "configuration",
            BreakdownKind::Auth => "auth",
            BreakdownKind::RateLimit => "rate_limit",
            BreakdownKind::Dependency => "dependency",
            BreakdownKind::Generic => "generic",
        };
        f.write_str(s)
    }
}
