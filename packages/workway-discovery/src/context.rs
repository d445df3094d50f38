//! What the platform knows about a user at the moment of a suggestion
//! request.
//!
//! The context is assembled per request by the caller and never stored by
//! the service. Everything the matcher and scorer consult — connections,
//! the event that just happened, install state, recent history — is in
//! here, which is what keeps the service itself stateless between queries
//! and the tests deterministic.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use workway_sdk::{IntegrationId, WorkflowId};

/// A provider event observed for this user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedEvent {
    /// Provider event type, e.g. `"meeting.created"`.
    pub event_type: String,
    /// Integration that emitted it.
    pub integration: IntegrationId,
    pub occurred_at: DateTime<Utc>,
}

impl ObservedEvent {
    pub fn new(
        event_type: impl Into<String>,
        integration: impl Into<IntegrationId>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            integration: integration.into(),
            occurred_at,
        }
    }
}

/// A calendar entry the user is heading into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingEvent {
    pub title: String,
    pub starts_at: DateTime<Utc>,
}

/// Recent and upcoming activity, for pattern detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalContext {
    /// Events observed recently, newest or oldest first — order is not
    /// significant, frequency is.
    pub recent_events: Vec<ObservedEvent>,
    /// Caller-pinned "now" for reproducible matching; `None` means wall
    /// clock.
    pub reference_time: Option<DateTime<Utc>>,
    pub upcoming_events: Vec<UpcomingEvent>,
}

/// Per-request discovery context.
///
/// Built with consuming `with_*` methods:
///
/// ```ignore
/// let ctx = DiscoveryContext::new("user-1")
///     .with_connected(["gmail", "slack"])
///     .with_recent_event(ObservedEvent::new("email.received", "gmail", Utc::now()));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryContext {
    /// Whose moment this is.
    pub user_id: String,
    /// Integrations the user has connected.
    pub connected: HashSet<IntegrationId>,
    /// The event that prompted this request, if one did.
    pub recent_event: Option<ObservedEvent>,
    /// Workflows already installed; never suggested again.
    pub installed: HashSet<WorkflowId>,
    /// Workflows the user dismissed; never suggested again.
    pub dismissed: HashSet<WorkflowId>,
    /// Activity history for pattern-detected moments.
    pub temporal: Option<TemporalContext>,
}

impl DiscoveryContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Replace the connected-integration set.
    pub fn with_connected<I>(mut self, integrations: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<IntegrationId>,
    {
        self.connected = integrations.into_iter().map(Into::into).collect();
        self
    }

    /// Add one connected integration.
    pub fn connect(mut self, integration: impl Into<IntegrationId>) -> Self {
        self.connected.insert(integration.into());
        self
    }

    /// Set the event that prompted this request.
    pub fn with_recent_event(mut self, event: ObservedEvent) -> Self {
        self.recent_event = Some(event);
        self
    }

    /// Mark a workflow as already installed.
    pub fn with_installed(mut self, id: impl Into<WorkflowId>) -> Self {
        self.installed.insert(id.into());
        self
    }

    /// Mark a workflow as dismissed by the user.
    pub fn with_dismissed(mut self, id: impl Into<WorkflowId>) -> Self {
        self.dismissed.insert(id.into());
        self
    }

    /// Attach activity history.
    pub fn with_temporal(mut self, temporal: TemporalContext) -> Self {
        self.temporal = Some(temporal);
        self
    }

    /// Whether the user may be offered this workflow at all.
    pub fn eligible(&self, id: &WorkflowId) -> bool {
        !self.installed.contains(id) && !self.dismissed.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_integrations_normalize() {
        let ctx = DiscoveryContext::new("u1").with_connected(["Gmail", "SLACK"]);
        assert!(ctx.connected.contains(&IntegrationId::new("gmail")));
        assert!(ctx.connected.contains(&IntegrationId::new("slack")));
    }

    #[test]
    fn installed_and_dismissed_both_bar_eligibility() {
        let ctx = DiscoveryContext::new("u1")
            .with_installed("w-installed")
            .with_dismissed("w-dismissed");
        assert!(!ctx.eligible(&WorkflowId::new("w-installed")));
        assert!(!ctx.eligible(&WorkflowId::new("w-dismissed")));
        assert!(ctx.eligible(&WorkflowId::new("w-fresh")));
    }
}
