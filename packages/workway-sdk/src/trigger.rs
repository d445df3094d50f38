//! Workflow triggers: how an installed workflow starts running.
//!
//! Constructors validate at build time so a definition that constructs is a
//! definition that runs — a workflow author finds out about an empty cron
//! expression when they write it, not when the scheduler chokes on it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for SDK authoring operations.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Validation failures raised while authoring workflow definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    #[error("webhook trigger requires a non-empty event type")]
    EmptyEventType,

    #[error("schedule trigger requires a non-empty cron expression")]
    EmptyCronExpression,

    #[error("poll trigger requires an interval of at least one second")]
    ZeroPollInterval,
}

/// How a workflow starts once installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Runs when a provider delivers a matching event.
    Webhook { event_type: String },
    /// Runs on a cron schedule.
    Schedule { cron: String },
    /// Runs only when the user asks.
    Manual,
    /// Runs on a fixed polling interval.
    Poll { interval_secs: u64 },
}

impl Trigger {
    /// Webhook trigger for the given provider event type.
    pub fn webhook(event_type: impl Into<String>) -> Result<Self> {
        let event_type = event_type.into();
        if event_type.trim().is_empty() {
            return Err(SdkError::EmptyEventType);
        }
        Ok(Trigger::Webhook { event_type })
    }

    /// Schedule trigger for the given cron expression.
    pub fn schedule(cron: impl Into<String>) -> Result<Self> {
        let cron = cron.into();
        if cron.trim().is_empty() {
            return Err(SdkError::EmptyCronExpression);
        }
        Ok(Trigger::Schedule { cron })
    }

    /// Manual trigger: the workflow runs only on explicit user request.
    pub fn manual() -> Self {
        Trigger::Manual
    }

    /// Poll trigger with the given interval. Sub-second intervals are
    /// rejected.
    pub fn poll(interval: Duration) -> Result<Self> {
        if interval.as_secs() == 0 {
            return Err(SdkError::ZeroPollInterval);
        }
        Ok(Trigger::Poll { interval_secs: interval.as_secs() })
    }

    /// Whether this trigger fires without the user doing anything.
    ///
    /// Automatic triggers are one of the frictionless indicators the
    /// discovery scorer rewards.
    pub fn is_automatic(&self) -> bool {
        !matches!(self, Trigger::Manual)
    }

    /// The event type this trigger listens for, when it listens for one.
    pub fn event_type(&self) -> Option<&str> {
        match self {
            Trigger::Webhook { event_type } => Some(event_type),
            _ => None,
        }
    }
}
