//! The discovery service: moment matching, scoring, and breakdown
//! reporting over a registered workflow catalog.
//!
//! # The Suggestion Rule
//!
//! > **One moment, one suggestion.**
//!
//! A suggestion request describes a moment in a user's day. The service
//! answers with at most one workflow — the highest scorer among those
//! whose declared moments semantically match — or nothing. Offering a list
//! would turn discovery back into a directory.
//!
//! The service is an explicit object: construct one per process (or per
//! test), register definitions into it, and share it however the caller
//! likes. Mutations take `&mut self`, queries take `&self`, and there is
//! no interior locking or global instance.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, info};
use workway_core::{BreakdownKind, BreakdownSeverity, Result, WorkwayError};
use workway_sdk::{
    DiscoveryMoment, DiscoveryTrigger, IntegrationId, IntegrationPair, OutcomeFrame,
    WorkflowDefinition, WorkflowId,
};

use crate::context::DiscoveryContext;
use crate::scoring::score_moment;
use crate::visibility::VisibilityState;

/// A pattern-detected moment needs this many occurrences of its event type
/// in the user's recent history.
const PATTERN_THRESHOLD: usize = 3;

/// A single workflow offered for the current moment.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub workflow: Arc<WorkflowDefinition>,
    /// Additive editorial score; comparable only within one request.
    pub score: u32,
    /// The declared moment that matched.
    pub moment: DiscoveryMoment,
    /// Kind of the matched moment.
    pub trigger: DiscoveryTrigger,
}

impl Suggestion {
    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow.id
    }
}

/// Workflow catalog plus per-workflow visibility state.
#[derive(Debug, Default)]
pub struct DiscoveryService {
    /// Registration order is the tie-break order, so the catalog keeps
    /// insertion order.
    workflows: IndexMap<WorkflowId, Arc<WorkflowDefinition>>,
    /// Pair key (`"from:to"`) to the workflows serving that pair.
    by_pair: HashMap<String, Vec<WorkflowId>>,
    /// Moment event type to the workflows watching for it.
    by_event: HashMap<String, Vec<WorkflowId>>,
    visibility: HashMap<WorkflowId, VisibilityState>,
}

impl DiscoveryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register workflow definitions.
    ///
    /// Re-registering an id replaces its definition and rebuilds its index
    /// entries; the first-registered position (and any breakdown history)
    /// is retained.
    pub fn register(&mut self, definitions: impl IntoIterator<Item = WorkflowDefinition>) {
        for definition in definitions {
            let id = definition.id.clone();
            if self.workflows.contains_key(&id) {
                self.unindex(&id);
            }
            self.index(&id, &definition);
            // IndexMap keeps the original position for existing keys.
            self.workflows.insert(id, Arc::new(definition));
        }
        debug!(total = self.workflows.len(), "workflow catalog updated");
    }

    /// Number of registered workflows.
    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    /// Look up a registered definition.
    pub fn get(&self, id: &WorkflowId) -> Option<&Arc<WorkflowDefinition>> {
        self.workflows.get(id)
    }

    // =========================================================================
    // Suggestions
    // =========================================================================

    /// The single best suggestion for this moment, if any workflow matches.
    pub fn suggestion(&self, ctx: &DiscoveryContext) -> Option<Suggestion> {
        let best = self.best_among(self.workflows.keys(), ctx, None);
        if let Some(s) = &best {
            debug!(workflow = %s.workflow.id, score = s.score, "suggestion selected");
        }
        best
    }

    /// Like [`suggestion`](Self::suggestion), restricted to moments of the
    /// given kind.
    pub fn suggestion_for_trigger(
        &self,
        trigger: DiscoveryTrigger,
        ctx: &DiscoveryContext,
    ) -> Option<Suggestion> {
        // Event-received moments can only match workflows watching the
        // recent event's type, so the event index narrows the scan.
        if trigger == DiscoveryTrigger::EventReceived {
            let recent = ctx.recent_event.as_ref()?;
            let bucket = self.by_event.get(&recent.event_type)?;
            return self.best_among(bucket.iter(), ctx, Some(trigger));
        }
        self.best_among(self.workflows.keys(), ctx, Some(trigger))
    }

    /// Best suggestion among workflows serving the `from → to` pair.
    ///
    /// Returns `None` when either integration is not connected or no
    /// workflow serves the pair.
    pub fn suggestion_for_pair(
        &self,
        from: impl Into<IntegrationId>,
        to: impl Into<IntegrationId>,
        ctx: &DiscoveryContext,
    ) -> Option<Suggestion> {
        let pair = IntegrationPair::new(from, to);
        if !ctx.connected.contains(&pair.from) || !ctx.connected.contains(&pair.to) {
            return None;
        }
        let bucket = self.by_pair.get(&pair.key())?;
        self.best_among(bucket.iter(), ctx, None)
    }

    /// Suggestions within an outcome frame: the best scorer per distinct
    /// primary pair, best first.
    pub fn suggestions_for_frame(
        &self,
        frame: &OutcomeFrame,
        ctx: &DiscoveryContext,
    ) -> Vec<Suggestion> {
        // (score, registration index, suggestion) per primary pair key.
        let mut per_pair: IndexMap<String, (u32, usize, Suggestion)> = IndexMap::new();

        for (position, (id, definition)) in self.workflows.iter().enumerate() {
            if definition.outcome.frame != *frame {
                continue;
            }
            let Some(candidate) = self.best_moment_for(id, definition, ctx, None) else {
                continue;
            };
            let key = definition.pathway.primary.key();
            match per_pair.get(&key) {
                Some((score, _, _)) if candidate.score <= *score => {}
                _ => {
                    per_pair.insert(key, (candidate.score, position, candidate));
                }
            }
        }

        let mut ranked: Vec<(u32, usize, Suggestion)> = per_pair.into_values().collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.into_iter().map(|(_, _, suggestion)| suggestion).collect()
    }

    /// Best (workflow, moment) over the given candidate ids, ties broken by
    /// registration order.
    fn best_among<'a>(
        &self,
        ids: impl Iterator<Item = &'a WorkflowId>,
        ctx: &DiscoveryContext,
        trigger: Option<DiscoveryTrigger>,
    ) -> Option<Suggestion> {
        let mut best: Option<(u32, usize, Suggestion)> = None;
        for id in ids {
            let Some(position) = self.workflows.get_index_of(id) else {
                continue;
            };
            let Some(definition) = self.workflows.get(id) else {
                continue;
            };
            let Some(candidate) = self.best_moment_for(id, definition, ctx, trigger) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some((score, pos, _)) => {
                    candidate.score > *score || (candidate.score == *score && position < *pos)
                }
            };
            if better {
                best = Some((candidate.score, position, candidate));
            }
        }
        best.map(|(_, _, suggestion)| suggestion)
    }

    /// The workflow's best matching moment for this context, if it is
    /// eligible at all.
    fn best_moment_for(
        &self,
        id: &WorkflowId,
        definition: &Arc<WorkflowDefinition>,
        ctx: &DiscoveryContext,
        trigger: Option<DiscoveryTrigger>,
    ) -> Option<Suggestion> {
        if !ctx.eligible(id) {
            return None;
        }
        // A blocking breakdown pulls the workflow out of discovery until
        // the user fixes it; lesser severities only dent the score.
        if self.visibility.get(id).is_some_and(VisibilityState::blocks_suggestions) {
            return None;
        }
        // The integration requirement is workflow-level: every declared
        // moment's set must be connected, or the workflow is not a
        // candidate at all.
        let connected = |moment: &DiscoveryMoment| {
            moment.integrations.iter().all(|i| ctx.connected.contains(i))
        };
        if !definition.pathway.moments.iter().all(connected) {
            return None;
        }

        let mut best: Option<(u32, &DiscoveryMoment)> = None;
        for moment in &definition.pathway.moments {
            if trigger.is_some_and(|t| t != moment.trigger) {
                continue;
            }
            if !moment_matches(moment, ctx) {
                continue;
            }
            let score = score_moment(definition, moment, ctx);
            // Strictly-greater keeps the earliest declared moment on ties.
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, moment));
            }
        }

        best.map(|(score, moment)| Suggestion {
            workflow: Arc::clone(definition),
            score,
            moment: moment.clone(),
            trigger: moment.trigger,
        })
    }

    // =========================================================================
    // Breakdown reporting
    // =========================================================================

    /// Record a breakdown against a workflow, deriving kind and severity
    /// from the error's code.
    pub fn report_breakdown(
        &mut self,
        id: &WorkflowId,
        err: &WorkwayError,
    ) -> Result<BreakdownSeverity> {
        if !self.workflows.contains_key(id) {
            return Err(WorkwayError::not_found(format!("workflow {id}")));
        }
        let kind = BreakdownKind::from_error(err);
        let severity = BreakdownSeverity::from_error(err);
        self.visibility
            .entry(id.clone())
            .or_default()
            .record_breakdown(kind, severity, Utc::now());
        info!(
            workflow = %id,
            kind = %kind,
            severity = %severity,
            code = %err.code,
            "workflow breakdown reported"
        );
        Ok(severity)
    }

    /// Resolve a workflow's active breakdown and restore normal visibility.
    ///
    /// Silent-severity breakdowns are recorded as auto-recovered. A
    /// workflow with nothing active resolves as a no-op.
    pub fn resolve_breakdown(&mut self, id: &WorkflowId) -> Result<()> {
        if !self.workflows.contains_key(id) {
            return Err(WorkwayError::not_found(format!("workflow {id}")));
        }
        if let Some(state) = self.visibility.get_mut(id) {
            state.resolve(Utc::now());
            debug!(workflow = %id, "workflow breakdown resolved");
        }
        Ok(())
    }

    /// The workflow's visibility state, when it has any breakdown history.
    pub fn visibility(&self, id: &WorkflowId) -> Option<&VisibilityState> {
        self.visibility.get(id)
    }

    /// Health score in `[0, 100]` for a registered workflow; workflows with
    /// no breakdown history score 100.
    pub fn disappearance_score(&self, id: &WorkflowId, now: DateTime<Utc>) -> Option<u8> {
        if !self.workflows.contains_key(id) {
            return None;
        }
        Some(
            self.visibility
                .get(id)
                .map_or(100, |state| state.disappearance_score(now)),
        )
    }

    // =========================================================================
    // Indexing
    // =========================================================================

    fn index(&mut self, id: &WorkflowId, definition: &WorkflowDefinition) {
        for pair in definition.pathway.pairs() {
            let bucket = self.by_pair.entry(pair.key()).or_default();
            if !bucket.contains(id) {
                bucket.push(id.clone());
            }
        }
        for moment in &definition.pathway.moments {
            if let Some(event_type) = &moment.event_type {
                let bucket = self.by_event.entry(event_type.clone()).or_default();
                if !bucket.contains(id) {
                    bucket.push(id.clone());
                }
            }
        }
    }

    fn unindex(&mut self, id: &WorkflowId) {
        for bucket in self.by_pair.values_mut() {
            bucket.retain(|candidate| candidate != id);
        }
        for bucket in self.by_event.values_mut() {
            bucket.retain(|candidate| candidate != id);
        }
    }
}

/// Whether a declared moment semantically matches the context.
fn moment_matches(moment: &DiscoveryMoment, ctx: &DiscoveryContext) -> bool {
    match moment.trigger {
        // The declared event type must have just happened.
        DiscoveryTrigger::EventReceived => match (&moment.event_type, &ctx.recent_event) {
            (Some(expected), Some(recent)) => *expected == recent.event_type,
            _ => false,
        },
        // Always applicable; priority and zuhandenheit decide.
        DiscoveryTrigger::TimeBased => true,
        // The declared event type keeps recurring for this user.
        DiscoveryTrigger::PatternDetected => {
            let (Some(expected), Some(temporal)) = (&moment.event_type, &ctx.temporal) else {
                return false;
            };
            temporal
                .recent_events
                .iter()
                .filter(|event| event.event_type == *expected)
                .count()
                >= PATTERN_THRESHOLD
        }
    }
}

#[cfg(test)]
mod tests {
    use workway_sdk::{DiscoveryPathway, OutcomeMetadata, Trigger, Zuhandenheit};

    use super::*;
    use crate::context::{ObservedEvent, TemporalContext};

    fn simple_definition(id: &str, from: &str, to: &str, priority: u8) -> WorkflowDefinition {
        WorkflowDefinition::builder()
            .id(id)
            .outcome(OutcomeMetadata::builder().name(id).frame("test-frame").build())
            .integrations(vec![IntegrationId::new(from), IntegrationId::new(to)])
            .trigger(Trigger::manual())
            .pathway(
                DiscoveryPathway::builder()
                    .primary(IntegrationPair::new(from, to))
                    .moments(vec![DiscoveryMoment::builder()
                        .trigger(DiscoveryTrigger::TimeBased)
                        .priority(priority)
                        .build()])
                    .build(),
            )
            .build()
    }

    #[test]
    fn register_is_idempotent_per_id() {
        let mut service = DiscoveryService::new();
        service.register([simple_definition("w1", "gmail", "slack", 10)]);
        service.register([simple_definition("w1", "gmail", "slack", 90)]);

        assert_eq!(service.len(), 1);
        let def = service.get(&WorkflowId::new("w1")).unwrap();
        assert_eq!(def.pathway.moments[0].priority, 90);
        // The pair index holds one entry, not a duplicate per registration.
        assert_eq!(service.by_pair["gmail:slack"], vec![WorkflowId::new("w1")]);
    }

    #[test]
    fn reregistration_moves_a_workflow_between_pair_buckets() {
        let mut service = DiscoveryService::new();
        service.register([simple_definition("w1", "gmail", "slack", 10)]);
        service.register([simple_definition("w1", "gmail", "jira", 10)]);

        assert!(service.by_pair["gmail:slack"].is_empty());
        assert_eq!(service.by_pair["gmail:jira"], vec![WorkflowId::new("w1")]);
    }

    #[test]
    fn moment_integrations_gate_that_moment() {
        let mut definition = simple_definition("w1", "gmail", "slack", 50);
        definition.pathway.moments[0].integrations =
            vec![IntegrationId::new("gmail"), IntegrationId::new("slack")];
        let mut service = DiscoveryService::new();
        service.register([definition]);

        let without = DiscoveryContext::new("u1").with_connected(["gmail"]);
        assert!(service.suggestion(&without).is_none());

        let with = DiscoveryContext::new("u1").with_connected(["gmail", "slack"]);
        assert!(service.suggestion(&with).is_some());
    }

    #[test]
    fn one_unsatisfiable_moment_disqualifies_the_whole_workflow() {
        let mut definition = simple_definition("w1", "zoom", "hubspot", 50);
        definition.pathway.moments[0].integrations = vec![IntegrationId::new("zoom")];
        definition.pathway.moments.push(
            DiscoveryMoment::builder()
                .trigger(DiscoveryTrigger::TimeBased)
                .priority(90)
                .integrations(vec![IntegrationId::new("zoom"), IntegrationId::new("hubspot")])
                .build(),
        );
        let mut service = DiscoveryService::new();
        service.register([definition]);

        // The zoom-only moment is satisfiable, but the second moment is
        // not; the workflow drops out as a whole rather than surfacing
        // through its weaker moment.
        let partial = DiscoveryContext::new("u1").with_connected(["zoom"]);
        assert!(service.suggestion(&partial).is_none());

        let full = DiscoveryContext::new("u1").with_connected(["zoom", "hubspot"]);
        let suggestion = service.suggestion(&full).unwrap();
        assert_eq!(suggestion.moment.priority, 90);
    }

    #[test]
    fn pattern_moments_need_three_occurrences() {
        let definition = WorkflowDefinition::builder()
            .id("w-pattern")
            .outcome(OutcomeMetadata::builder().name("p").frame("f").build())
            .integrations(vec![IntegrationId::new("gmail")])
            .trigger(Trigger::manual())
            .pathway(
                DiscoveryPathway::builder()
                    .primary(IntegrationPair::new("gmail", "notion"))
                    .moments(vec![DiscoveryMoment::builder()
                        .trigger(DiscoveryTrigger::PatternDetected)
                        .priority(50)
                        .event_type("email.starred".to_owned())
                        .build()])
                    .build(),
            )
            .build();
        let mut service = DiscoveryService::new();
        service.register([definition]);

        let event = |t: &str| ObservedEvent::new(t, "gmail", Utc::now());
        let ctx_with = |events: Vec<ObservedEvent>| {
            DiscoveryContext::new("u1")
                .with_connected(["gmail", "notion"])
                .with_temporal(TemporalContext { recent_events: events, ..Default::default() })
        };

        let two = ctx_with(vec![event("email.starred"), event("email.starred")]);
        assert!(service.suggestion(&two).is_none());

        let three = ctx_with(vec![
            event("email.starred"),
            event("email.archived"),
            event("email.starred"),
            event("email.starred"),
        ]);
        let suggestion = service.suggestion(&three).unwrap();
        assert_eq!(suggestion.trigger, DiscoveryTrigger::PatternDetected);

        // No temporal context means no pattern, however strong.
        let none = DiscoveryContext::new("u1").with_connected(["gmail", "notion"]);
        assert!(service.suggestion(&none).is_none());
    }

    #[test]
    fn ties_go_to_the_first_registered() {
        let mut service = DiscoveryService::new();
        service.register([
            simple_definition("first", "gmail", "slack", 40),
            simple_definition("second", "gmail", "slack", 40),
        ]);
        let ctx = DiscoveryContext::new("u1").with_connected(["gmail", "slack"]);
        let suggestion = service.suggestion(&ctx).unwrap();
        assert_eq!(suggestion.workflow_id().as_str(), "first");

        // Re-registering the winner must not forfeit its position.
        service.register([simple_definition("first", "gmail", "slack", 40)]);
        let suggestion = service.suggestion(&ctx).unwrap();
        assert_eq!(suggestion.workflow_id().as_str(), "first");
    }

    #[test]
    fn within_a_workflow_the_earliest_declared_moment_wins_ties() {
        let mut definition = simple_definition("w1", "gmail", "slack", 40);
        definition.pathway.moments.push(
            DiscoveryMoment::builder()
                .trigger(DiscoveryTrigger::TimeBased)
                .priority(40)
                .event_type("unreached.event".to_owned())
                .build(),
        );
        let mut service = DiscoveryService::new();
        service.register([definition]);

        let ctx = DiscoveryContext::new("u1").with_connected(["gmail", "slack"]);
        let suggestion = service.suggestion(&ctx).unwrap();
        assert_eq!(suggestion.moment.event_type, None);
    }

    #[test]
    fn unknown_ids_get_a_not_found_taxonomy_error() {
        let mut service = DiscoveryService::new();
        let err = service
            .report_breakdown(&WorkflowId::new("ghost"), &WorkwayError::network("down"))
            .unwrap_err();
        assert_eq!(err.code, workway_core::ErrorCode::NotFound);
        assert!(service.resolve_breakdown(&WorkflowId::new("ghost")).is_err());
        assert_eq!(service.disappearance_score(&WorkflowId::new("ghost"), Utc::now()), None);
    }

    #[test]
    fn fresh_workflows_score_a_perfect_hundred() {
        let mut service = DiscoveryService::new();
        service.register([simple_definition("w1", "gmail", "slack", 10)]);
        assert_eq!(
            service.disappearance_score(&WorkflowId::new("w1"), Utc::now()),
            Some(100)
        );
    }

    #[test]
    fn zuhandenheit_outranks_raw_priority() {
        let mut frictionless = simple_definition("frictionless", "gmail", "slack", 50);
        frictionless.pathway.zuhandenheit = Zuhandenheit {
            works_out_of_box: true,
            graceful_degradation: true,
            automatic_trigger: true,
            time_to_value_minutes: Some(3),
        };
        let heavyweight = simple_definition("heavyweight", "gmail", "slack", 80);

        let mut service = DiscoveryService::new();
        service.register([heavyweight, frictionless]);
        let ctx = DiscoveryContext::new("u1").with_connected(["gmail", "slack"]);

        // 50+20+10+10+15+20 = 125 beats 80+20 = 100.
        let suggestion = service.suggestion(&ctx).unwrap();
        assert_eq!(suggestion.workflow_id().as_str(), "frictionless");
        assert_eq!(suggestion.score, 125);
    }
}
