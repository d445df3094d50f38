//! Workflow definitions and their discovery pathway.
//!
//! A [`WorkflowDefinition`] is the complete authored description of a
//! workflow: what outcome it produces, which integrations it needs, how it
//! triggers, and — through its [`DiscoveryPathway`] — when it should be
//! offered to a user who never searched for it.
//!
//! # The Pathway Rule
//!
//! > **Workflows are discovered at the moment of need, not browsed in a
//! > directory.**
//!
//! The pathway declares the integration pairs the workflow connects, the
//! moments at which offering it makes sense, and the frictionless
//! indicators ([`Zuhandenheit`]) that predict it will work without setup
//! ceremony. The discovery service consumes these declarations; nothing
//! here executes.
//!
//! Definitions are immutable once registered. All types serialize, so a
//! catalog can live in a file or a row as easily as in code.

use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::trigger::Trigger;

// =============================================================================
// Identifiers
// =============================================================================

/// Stable identifier of a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkflowId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for WorkflowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an integration provider ("gmail", "slack", ...).
///
/// Normalized to lowercase on construction so `"Gmail"` and `"gmail"` index
/// identically. Deserialization normalizes too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct IntegrationId(String);

impl IntegrationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IntegrationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for IntegrationId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for IntegrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directed pair of integrations a workflow connects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegrationPair {
    pub from: IntegrationId,
    pub to: IntegrationId,
}

impl IntegrationPair {
    pub fn new(from: impl Into<IntegrationId>, to: impl Into<IntegrationId>) -> Self {
        Self { from: from.into(), to: to.into() }
    }

    /// Index key for this pair: `"from:to"`, already normalized.
    pub fn key(&self) -> String {
        format!("{}:{}", self.from, self.to)
    }
}

impl fmt::Display for IntegrationPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Named outcome category ("inbox-zero", "meeting-prep", ...). Workflows in
/// the same frame compete for the same user intent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeFrame(String);

impl OutcomeFrame {
    pub fn new(frame: impl Into<String>) -> Self {
        Self(frame.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OutcomeFrame {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for OutcomeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the workflow achieves, in the user's terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct OutcomeMetadata {
    /// Outcome name shown to the user.
    pub name: String,
    /// Longer description, when the name alone is not enough.
    #[builder(default)]
    pub description: Option<String>,
    /// Frame this outcome competes in.
    pub frame: OutcomeFrame,
}

// =============================================================================
// Discovery pathway
// =============================================================================

/// The kind of moment at which a workflow may be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryTrigger {
    /// A matching provider event just arrived.
    EventReceived,
    /// Any time the user is looking.
    TimeBased,
    /// The same event kind keeps recurring for this user.
    PatternDetected,
}

impl fmt::Display for DiscoveryTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiscoveryTrigger::EventReceived => "event_received",
            DiscoveryTrigger::TimeBased => "time_based",
            DiscoveryTrigger::PatternDetected => "pattern_detected",
        };
        f.write_str(s)
    }
}

/// A declared moment at which offering the workflow makes sense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct DiscoveryMoment {
    /// What kind of moment this is.
    pub trigger: DiscoveryTrigger,
    /// Integrations that must be connected for this moment to apply.
    #[builder(default, setter(into))]
    pub integrations: Vec<IntegrationId>,
    /// Editorial priority, 0–100. Values above 100 score as 100.
    pub priority: u8,
    /// Event type this moment watches for (`EventReceived` and
    /// `PatternDetected` moments).
    #[builder(default, setter(into))]
    pub event_type: Option<String>,
}

/// Pre-filled configuration value shipped with the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartDefault {
    pub field: String,
    pub value: serde_json::Value,
}

impl SmartDefault {
    pub fn new(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self { field: field.into(), value: value.into() }
    }
}

/// A field the user must fill before the workflow can run. Every essential
/// field is friction; the scorer rewards having few.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct EssentialField {
    pub key: String,
    pub label: String,
    #[builder(default)]
    pub description: Option<String>,
}

/// Frictionless indicators: how ready-to-hand the workflow is out of the
/// box. Each true indicator means one less reason for the user to hesitate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Zuhandenheit {
    /// Works immediately after install with no configuration.
    pub works_out_of_box: bool,
    /// Keeps producing partial value when a dependency degrades.
    pub graceful_degradation: bool,
    /// Triggers without the user doing anything.
    pub automatic_trigger: bool,
    /// Minutes from install to first visible value.
    pub time_to_value_minutes: Option<u32>,
}

/// When and to whom a workflow should surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct DiscoveryPathway {
    /// The integration pair this workflow primarily connects.
    pub primary: IntegrationPair,
    /// Further pairs it also serves.
    #[builder(default, setter(into))]
    pub additional: Vec<IntegrationPair>,
    /// Moments at which it may be offered.
    #[builder(default, setter(into))]
    pub moments: Vec<DiscoveryMoment>,
    /// Configuration pre-filled at install.
    #[builder(default, setter(into))]
    pub smart_defaults: Vec<SmartDefault>,
    /// Fields the user must supply.
    #[builder(default, setter(into))]
    pub essential_fields: Vec<EssentialField>,
    /// Frictionless indicators.
    #[builder(default)]
    pub zuhandenheit: Zuhandenheit,
}

impl DiscoveryPathway {
    /// Every pair this workflow serves, primary first.
    pub fn pairs(&self) -> impl Iterator<Item = &IntegrationPair> {
        std::iter::once(&self.primary).chain(self.additional.iter())
    }
}

// =============================================================================
// Workflow definition
// =============================================================================

/// The complete authored description of a workflow.
///
/// # Example
///
/// ```ignore
/// use workway_sdk::{
///     DiscoveryMoment, DiscoveryPathway, DiscoveryTrigger, IntegrationPair,
///     OutcomeFrame, OutcomeMetadata, Trigger, WorkflowDefinition,
/// };
///
/// let definition = WorkflowDefinition::builder()
///     .id("gmail-invoice-to-quickbooks")
///     .outcome(
///         OutcomeMetadata::builder()
///             .name("Invoices file themselves")
///             .frame("bookkeeping")
///             .build(),
///     )
///     .integrations(vec!["gmail".into(), "quickbooks".into()])
///     .trigger(Trigger::webhook("email.attachment.received")?)
///     .pathway(
///         DiscoveryPathway::builder()
///             .primary(IntegrationPair::new("gmail", "quickbooks"))
///             .moments(vec![DiscoveryMoment::builder()
///                 .trigger(DiscoveryTrigger::EventReceived)
///                 .priority(80)
///                 .event_type("email.attachment.received".to_owned())
///                 .build()])
///             .build(),
///     )
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct WorkflowDefinition {
    /// Stable identifier, unique within a catalog.
    pub id: WorkflowId,
    /// What this workflow achieves.
    pub outcome: OutcomeMetadata,
    /// Integrations that must be connected before install.
    pub integrations: Vec<IntegrationId>,
    /// How the workflow runs once installed.
    pub trigger: Trigger,
    /// When and to whom it should surface.
    pub pathway: DiscoveryPathway,
}

impl WorkflowDefinition {
    /// Whether the user has every integration this workflow requires.
    pub fn requirements_met<'a>(
        &self,
        connected: impl IntoIterator<Item = &'a IntegrationId> + Copy,
    ) -> bool {
        self.integrations
            .iter()
            .all(|needed| connected.into_iter().any(|have| have == needed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integration_ids_normalize_to_lowercase() {
        assert_eq!(IntegrationId::new("Gmail"), IntegrationId::new("gmail"));
        assert_eq!(IntegrationId::new("  SLACK  ").as_str(), "slack");
    }

    #[test]
    fn pair_keys_are_normalized_and_directed() {
        let pair = IntegrationPair::new("Gmail", "Slack");
        assert_eq!(pair.key(), "gmail:slack");
        // Direction matters: gmail→slack is not slack→gmail.
        assert_ne!(pair.key(), IntegrationPair::new("slack", "gmail").key());
    }

    #[test]
    fn deserialized_integration_ids_are_normalized() {
        let id: IntegrationId = serde_json::from_str(r#""HubSpot""#).unwrap();
        assert_eq!(id.as_str(), "hubspot");
    }

    #[test]
    fn pathway_pairs_yield_primary_first() {
        let pathway = DiscoveryPathway::builder()
            .primary(IntegrationPair::new("gmail", "slack"))
            .additional(vec![IntegrationPair::new("outlook", "slack")])
            .build();
        let keys: Vec<String> = pathway.pairs().map(|p| p.key()).collect();
        assert_eq!(keys, vec!["gmail:slack", "outlook:slack"]);
    }

    #[test]
    fn builder_defaults_leave_the_pathway_frictionless_fields_empty() {
        let pathway = DiscoveryPathway::builder()
            .primary(IntegrationPair::new("jira", "slack"))
            .build();
        assert!(pathway.moments.is_empty());
        assert!(pathway.essential_fields.is_empty());
        assert!(!pathway.zuhandenheit.works_out_of_box);
    }

    #[test]
    fn requirements_met_checks_every_integration() {
        let definition = WorkflowDefinition::builder()
            .id("jira-standup")
            .outcome(OutcomeMetadata::builder().name("Standup writes itself").frame("standup").build())
            .integrations(vec![IntegrationId::new("jira"), IntegrationId::new("slack")])
            .trigger(Trigger::manual())
            .pathway(
                DiscoveryPathway::builder()
                    .primary(IntegrationPair::new("jira", "slack"))
                    .build(),
            )
            .build();

        let both = [IntegrationId::new("jira"), IntegrationId::new("slack")];
        let one = [IntegrationId::new("jira")];
        assert!(definition.requirements_met(&both));
        assert!(!definition.requirements_met(&one));
    }

    #[test]
    fn definitions_round_trip_through_json() {
        let definition = WorkflowDefinition::builder()
            .id("calendar-brief")
            .outcome(
                OutcomeMetadata::builder()
                    .name("Morning brief")
                    .description(Some("Daily agenda summary".to_owned()))
                    .frame("meeting-prep")
                    .build(),
            )
            .integrations(vec![IntegrationId::new("gcal")])
            .trigger(Trigger::schedule("0 7 * * *").unwrap())
            .pathway(
                DiscoveryPathway::builder()
                    .primary(IntegrationPair::new("gcal", "slack"))
                    .build(),
            )
            .build();

        let json = serde_json::to_string(&definition).unwrap();
        let back: WorkflowDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, definition);
    }
}
