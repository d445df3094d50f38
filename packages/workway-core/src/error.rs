//! Closed error taxonomy for the Workway platform.
//!
//! Integration-layer failures are normalized into one [`ErrorCode`] at the
//! boundary where they occur — the HTTP status conversion lives in
//! [`WorkwayError::from_status`] and happens exactly once. Code above that
//! boundary branches on [`ErrorCode`] / [`ErrorCategory`] only, never on raw
//! status codes or provider-specific shapes.
//!
//! # The Taxonomy Rule
//!
//! > **Every code maps to exactly one category, one default retryability,
//! > and one default retry budget.**
//!
//! The mappings are pure total functions over the enum; overrides are
//! per-error construction context, never mutations of the defaults.
//!
//! # Example
//!
//! ```ignore
//! use workway_core::{ErrorCode, WorkwayError};
//!
//! let err = WorkwayError::new(ErrorCode::RateLimited, "zoom: too many requests")
//!     .with_status(429)
//!     .with_retry_after(std::time::Duration::from_secs(30));
//!
//! assert!(err.is_rate_limited());
//! assert!(err.is_retryable());
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::correlation::CorrelationId;

/// Result type alias for Workway operations.
pub type Result<T> = std::result::Result<T, WorkwayError>;

// =============================================================================
// Error Codes
// =============================================================================

/// The closed set of Workway error codes.
///
/// New failure modes get a new variant here, plus rows in the category,
/// retryability, and user-message tables below. Nothing else in the platform
/// may invent codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No credentials were supplied for an integration that needs them.
    AuthMissing,
    /// Credentials were valid once but have expired.
    AuthExpired,
    /// Credentials are present but rejected by the provider.
    AuthInvalid,
    /// Credentials lack a scope the operation requires.
    InsufficientScope,
    /// Provider rate limit hit.
    RateLimited,
    /// Plan or account quota exhausted.
    QuotaExceeded,
    /// Workflow or integration configuration is invalid.
    InvalidConfig,
    /// A required configuration field is absent.
    MissingField,
    /// Caller-supplied input failed validation at the boundary.
    InvalidInput,
    /// Generic provider API failure.
    Api,
    /// Resource does not exist.
    NotFound,
    /// Authenticated but not allowed.
    Permission,
    /// Concurrent modification or uniqueness conflict.
    Conflict,
    /// Storage layer failure.
    Database,
    /// Workflow step execution failure.
    Processing,
    /// AI model invocation failure.
    AiModel,
    /// Billing or payment failure.
    Payment,
    /// Domain validation failure inside a workflow.
    Validation,
    /// Connection-level network failure.
    Network,
    /// Provider is reachable but unhealthy (5xx upstream).
    ProviderDown,
    /// Operation exceeded its deadline.
    Timeout,
    /// Operation was cancelled by the caller.
    Cancelled,
    /// Anything that could not be classified.
    Unknown,
}

impl ErrorCode {
    /// Every code, for exhaustive handling and table-driven tests.
    pub const ALL: [ErrorCode; 23] = [
        ErrorCode::AuthMissing,
        ErrorCode::AuthExpired,
        ErrorCode::AuthInvalid,
        ErrorCode::InsufficientScope,
        ErrorCode::RateLimited,
        ErrorCode::QuotaExceeded,
        ErrorCode::InvalidConfig,
        ErrorCode::MissingField,
        ErrorCode::InvalidInput,
        ErrorCode::Api,
        ErrorCode::NotFound,
        ErrorCode::Permission,
        ErrorCode::Conflict,
        ErrorCode::Database,
        ErrorCode::Processing,
        ErrorCode::AiModel,
        ErrorCode::Payment,
        ErrorCode::Validation,
        ErrorCode::Network,
        ErrorCode::ProviderDown,
        ErrorCode::Timeout,
        ErrorCode::Cancelled,
        ErrorCode::Unknown,
    ];

    /// The category this code belongs to. Pure and total.
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorCode::AuthMissing
            | ErrorCode::AuthExpired
            | ErrorCode::AuthInvalid
            | ErrorCode::InsufficientScope => ErrorCategory::Authentication,
            ErrorCode::RateLimited | ErrorCode::QuotaExceeded => ErrorCategory::RateLimit,
            ErrorCode::InvalidConfig | ErrorCode::MissingField | ErrorCode::InvalidInput => {
                ErrorCategory::Configuration
            }
            ErrorCode::Api
            | ErrorCode::NotFound
            | ErrorCode::Permission
            | ErrorCode::Conflict
            | ErrorCode::Payment => ErrorCategory::Api,
            ErrorCode::Network | ErrorCode::ProviderDown | ErrorCode::Timeout => {
                ErrorCategory::Network
            }
            ErrorCode::Database
            | ErrorCode::Processing
            | ErrorCode::AiModel
            | ErrorCode::Validation
            | ErrorCode::Cancelled => ErrorCategory::Workflow,
            ErrorCode::Unknown => ErrorCategory::Unknown,
        }
    }

    /// Whether errors with this code are retried when no explicit override
    /// was given at construction.
    pub fn default_retryable(self) -> bool {
        matches!(
            self,
            ErrorCode::AuthExpired
                | ErrorCode::RateLimited
                | ErrorCode::Network
                | ErrorCode::ProviderDown
                | ErrorCode::Timeout
        )
    }

    /// Default retry budget for this code.
    ///
    /// Rate limits get a smaller budget: each retry burns quota at the
    /// provider, and the `Retry-After` hint already tells us when to come
    /// back.
    pub fn default_max_retries(self) -> u32 {
        match self {
            ErrorCode::RateLimited => 2,
            code if code.default_retryable() => 3,
            _ => 0,
        }
    }

    /// User-facing message for this code.
    ///
    /// Blocking codes carry a recovery step; everything else states what
    /// happened without internals.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorCode::AuthMissing => {
                "This workflow needs an integration connected. Connect it to continue."
            }
            ErrorCode::AuthExpired => {
                "Your connection to this integration expired. Reconnect it to continue."
            }
            ErrorCode::AuthInvalid => {
                "This integration rejected your credentials. Reconnect it to continue."
            }
            ErrorCode::InsufficientScope => {
                "This workflow needs additional permissions. Reconnect the integration and grant them."
            }
            ErrorCode::RateLimited => "An integration is busy right now. We'll retry shortly.",
            ErrorCode::QuotaExceeded => "An integration's usage limit was reached for this period.",
            ErrorCode::InvalidConfig => {
                "This workflow's configuration is invalid. Review its settings to continue."
            }
            ErrorCode::MissingField => {
                "A required setting is missing. Fill it in to continue."
            }
            ErrorCode::InvalidInput => "Some of the provided input was invalid.",
            ErrorCode::Api => "An integration returned an unexpected response.",
            ErrorCode::NotFound => "Something this workflow depends on no longer exists.",
            ErrorCode::Permission => "You don't have permission to do that.",
            ErrorCode::Conflict => "That change conflicted with another recent change.",
            ErrorCode::Database => "We couldn't save your data. Please try again.",
            ErrorCode::Processing => "A workflow step failed while running.",
            ErrorCode::AiModel => "The AI step couldn't complete. Please try again.",
            ErrorCode::Payment => {
                "A payment problem is blocking this workflow. Update your billing details to continue."
            }
            ErrorCode::Validation => "The workflow produced data that failed validation.",
            ErrorCode::Network => "We couldn't reach an integration. We'll retry automatically.",
            ErrorCode::ProviderDown => {
                "An integration's service is having trouble. We'll retry automatically."
            }
            ErrorCode::Timeout => "An integration took too long to respond. We'll retry automatically.",
            ErrorCode::Cancelled => "The operation was cancelled.",
            ErrorCode::Unknown => "Something unexpected went wrong.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::AuthMissing => "AUTH_MISSING",
            ErrorCode::AuthExpired => "AUTH_EXPIRED",
            ErrorCode::AuthInvalid => "AUTH_INVALID",
            ErrorCode::InsufficientScope => "INSUFFICIENT_SCOPE",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::MissingField => "MISSING_FIELD",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::Api => "API",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Permission => "PERMISSION",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::Database => "DATABASE",
            ErrorCode::Processing => "PROCESSING",
            ErrorCode::AiModel => "AI_MODEL",
            ErrorCode::Payment => "PAYMENT",
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Network => "NETWORK",
            ErrorCode::ProviderDown => "PROVIDER_DOWN",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Error Categories
// =============================================================================

/// Coarse grouping of error codes, for callers that branch on failure class
/// rather than individual codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Configuration,
    Api,
    Network,
    Workflow,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Api => "api",
            ErrorCategory::Network => "network",
            ErrorCategory::Workflow => "workflow",
            ErrorCategory::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Workway Error
// =============================================================================

/// A classified platform error.
///
/// Constructed at the throw site and immutable afterwards: the `with_*`
/// methods are construction-time context, not mutation. Category is always
/// derived from the code; retryability and retry budget fall back to the
/// code's defaults unless overridden.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct WorkwayError {
    /// Classified failure code.
    pub code: ErrorCode,
    /// Developer-facing description of what failed.
    pub message: String,
    /// Explicit retryability override, when the throw site knows better
    /// than the code default.
    retryable: Option<bool>,
    /// Explicit retry budget override.
    max_retries: Option<u32>,
    /// How long the provider asked us to wait before retrying.
    pub retry_after: Option<Duration>,
    /// Originating HTTP status, when the failure came off the wire.
    pub status: Option<u16>,
    /// Provider-specific error code, verbatim.
    pub provider_code: Option<String>,
    /// Provider-specific error message, verbatim.
    pub provider_message: Option<String>,
    /// Free-form structured context for logs.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Correlation ID of the request that produced this error.
    pub correlation_id: Option<CorrelationId>,
    /// When the error was constructed.
    pub timestamp: DateTime<Utc>,
}

impl WorkwayError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: None,
            max_retries: None,
            retry_after: None,
            status: None,
            provider_code: None,
            provider_message: None,
            metadata: serde_json::Map::new(),
            correlation_id: None,
            timestamp: Utc::now(),
        }
    }

    // -------------------------------------------------------------------------
    // Shorthand constructors for the common throw sites
    // -------------------------------------------------------------------------

    /// Connection-level network failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Network, message)
    }

    /// Deadline exceeded.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Caller cancelled the operation.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cancelled, message)
    }

    /// Provider rate limit hit.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, message)
    }

    /// Expired credentials.
    pub fn auth_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthExpired, message)
    }

    /// Invalid workflow or client configuration.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, message)
    }

    /// A required field is absent.
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(ErrorCode::MissingField, format!("missing required field: {field}"))
            .with_metadata("field", serde_json::Value::String(field))
    }

    /// Resource does not exist.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, format!("not found: {}", resource.into()))
    }

    /// Unclassifiable failure.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }

    /// Convert an HTTP status into a classified error.
    ///
    /// This is the single place statuses become codes. The status is retained
    /// on the error so the retry layer can apply its ≥500/429 rule without
    /// re-deriving anything.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            400 => ErrorCode::InvalidInput,
            401 => ErrorCode::AuthInvalid,
            402 => ErrorCode::Payment,
            403 => ErrorCode::Permission,
            404 => ErrorCode::NotFound,
            408 => ErrorCode::Timeout,
            409 => ErrorCode::Conflict,
            422 => ErrorCode::Validation,
            429 => ErrorCode::RateLimited,
            500 => ErrorCode::Api,
            502 | 503 | 504 => ErrorCode::ProviderDown,
            s if (400..500).contains(&s) => ErrorCode::Api,
            s if (500..600).contains(&s) => ErrorCode::ProviderDown,
            _ => ErrorCode::Unknown,
        };
        Self::new(code, message).with_status(status)
    }

    // -------------------------------------------------------------------------
    // Construction-time context
    // -------------------------------------------------------------------------

    /// Override the code's default retryability.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    /// Override the code's default retry budget.
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// Attach a provider-supplied wait hint.
    pub fn with_retry_after(mut self, wait: Duration) -> Self {
        self.retry_after = Some(wait);
        self
    }

    /// Attach the originating HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the provider's own error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Attach the provider's own error message.
    pub fn with_provider_message(mut self, message: impl Into<String>) -> Self {
        self.provider_message = Some(message.into());
        self
    }

    /// Attach a structured metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Attach the correlation ID of the request that failed.
    pub fn with_correlation_id(mut self, cid: CorrelationId) -> Self {
        self.correlation_id = Some(cid);
        self
    }

    // -------------------------------------------------------------------------
    // Derived views
    // -------------------------------------------------------------------------

    /// The category of this error's code.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Whether this error should be retried: the explicit override when one
    /// was given, otherwise the code default.
    pub fn is_retryable(&self) -> bool {
        self.retryable.unwrap_or_else(|| self.code.default_retryable())
    }

    /// Retry budget for this error: the explicit override when one was
    /// given, otherwise the code default.
    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries.unwrap_or_else(|| self.code.default_max_retries())
    }

    /// Authentication-class failure of any kind.
    pub fn is_unauthorized(&self) -> bool {
        self.category() == ErrorCategory::Authentication
    }

    /// Rate-limit-class failure.
    pub fn is_rate_limited(&self) -> bool {
        self.category() == ErrorCategory::RateLimit
    }

    /// Network-class failure (connection, upstream health, deadline).
    pub fn is_network_error(&self) -> bool {
        self.category() == ErrorCategory::Network
    }

    /// Whether the user must re-authenticate to make progress.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::AuthMissing | ErrorCode::AuthExpired | ErrorCode::AuthInvalid
        )
    }

    /// User-facing message for this error, keyed by code.
    pub fn user_message(&self) -> &'static str {
        self.code.user_message()
    }
}

/// Serializes to the logging-pipeline shape:
/// `{name, message, code, category, context, timestamp}`.
impl Serialize for WorkwayError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut context = serde_json::Map::new();
        if let Some(status) = self.status {
            context.insert("status".into(), status.into());
        }
        if let Some(wait) = self.retry_after {
            context.insert("retry_after_ms".into(), (wait.as_millis() as u64).into());
        }
        if let Some(code) = &self.provider_code {
            context.insert("provider_code".into(), code.as_str().into());
        }
        if let Some(message) = &self.provider_message {
            context.insert("provider_message".into(), message.as_str().into());
        }
        if let Some(cid) = self.correlation_id {
            if cid.is_some() {
                context.insert("correlation_id".into(), cid.to_string().into());
            }
        }
        for (key, value) in &self.metadata {
            context.insert(key.clone(), value.clone());
        }

        let mut state = serializer.serialize_struct("WorkwayError", 6)?;
        state.serialize_field("name", "WorkwayError")?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("category", &self.category())?;
        state.serialize_field("context", &context)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.end()
    }
}
