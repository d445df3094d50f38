//! Shared catalog fixtures for discovery integration tests.

// Each test binary uses its own subset of these.
#![allow(dead_code)]

use workway_sdk::{
    DiscoveryMoment, DiscoveryPathway, DiscoveryTrigger, EssentialField, IntegrationId,
    IntegrationPair, OutcomeMetadata, Trigger, WorkflowDefinition, Zuhandenheit,
};

/// All indicators on, three minutes to value.
pub fn frictionless() -> Zuhandenheit {
    Zuhandenheit {
        works_out_of_box: true,
        graceful_degradation: true,
        automatic_trigger: true,
        time_to_value_minutes: Some(3),
    }
}

/// A workflow watching one event type on one integration pair.
pub fn event_workflow(
    id: &str,
    frame: &str,
    from: &str,
    to: &str,
    event_type: &str,
    priority: u8,
    zuhandenheit: Zuhandenheit,
) -> WorkflowDefinition {
    WorkflowDefinition::builder()
        .id(id)
        .outcome(OutcomeMetadata::builder().name(id).frame(frame).build())
        .integrations(vec![IntegrationId::new(from), IntegrationId::new(to)])
        .trigger(Trigger::webhook(event_type).unwrap())
        .pathway(
            DiscoveryPathway::builder()
                .primary(IntegrationPair::new(from, to))
                .moments(vec![DiscoveryMoment::builder()
                    .trigger(DiscoveryTrigger::EventReceived)
                    .priority(priority)
                    .event_type(event_type.to_owned())
                    .build()])
                .zuhandenheit(zuhandenheit)
                .build(),
        )
        .build()
}

/// A workflow offered any time its pair is connected.
pub fn time_based_workflow(
    id: &str,
    frame: &str,
    from: &str,
    to: &str,
    priority: u8,
) -> WorkflowDefinition {
    WorkflowDefinition::builder()
        .id(id)
        .outcome(OutcomeMetadata::builder().name(id).frame(frame).build())
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

/// Attach required user-supplied fields to a definition.
pub fn with_essential_fields(mut definition: WorkflowDefinition, keys: &[&str]) -> WorkflowDefinition {
    definition.pathway.essential_fields = keys
        .iter()
        .map(|key| EssentialField::builder().key(*key).label(*key).build())
        .collect();
    definition
}
