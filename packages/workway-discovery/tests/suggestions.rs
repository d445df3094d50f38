//! Suggestion selection across registration, pair lookup, and frames.

mod common;

use chrono::Utc;
use common::{event_workflow, frictionless, time_based_workflow, with_essential_fields};
use workway_discovery::{DiscoveryContext, DiscoveryService, ObservedEvent};
use workway_sdk::{DiscoveryTrigger, OutcomeFrame, Zuhandenheit};

fn ctx(connected: &[&str]) -> DiscoveryContext {
    DiscoveryContext::new("u1").with_connected(connected.iter().copied())
}

#[test]
fn pair_suggestion_requires_both_integrations_connected() {
    let mut service = DiscoveryService::new();
    service.register([time_based_workflow("w1", "crm-hygiene", "zoom", "hubspot", 50)]);

    let both = ctx(&["zoom", "hubspot"]);
    let suggestion = service.suggestion_for_pair("zoom", "hubspot", &both).unwrap();
    assert_eq!(suggestion.workflow_id().as_str(), "w1");

    assert!(service.suggestion_for_pair("zoom", "hubspot", &ctx(&["zoom"])).is_none());
    assert!(service.suggestion_for_pair("zoom", "hubspot", &ctx(&["hubspot"])).is_none());
    assert!(service.suggestion_for_pair("zoom", "hubspot", &ctx(&[])).is_none());
}

#[test]
fn pair_lookup_normalizes_case() {
    let mut service = DiscoveryService::new();
    service.register([time_based_workflow("w1", "crm-hygiene", "zoom", "hubspot", 50)]);

    let suggestion = service.suggestion_for_pair("Zoom", "HubSpot", &ctx(&["zoom", "hubspot"]));
    assert!(suggestion.is_some());
}

#[test]
fn installed_and_dismissed_workflows_are_never_suggested_again() {
    let mut service = DiscoveryService::new();
    service.register([
        time_based_workflow("w-installed", "crm-hygiene", "zoom", "hubspot", 90),
        time_based_workflow("w-dismissed", "crm-hygiene", "zoom", "hubspot", 80),
        time_based_workflow("w-fresh", "crm-hygiene", "zoom", "hubspot", 10),
    ]);

    let ctx = ctx(&["zoom", "hubspot"])
        .with_installed("w-installed")
        .with_dismissed("w-dismissed");
    let suggestion = service.suggestion(&ctx).unwrap();
    assert_eq!(suggestion.workflow_id().as_str(), "w-fresh");
}

#[test]
fn event_moments_need_the_matching_recent_event() {
    let mut service = DiscoveryService::new();
    service.register([event_workflow(
        "meeting-notes",
        "crm-hygiene",
        "zoom",
        "hubspot",
        "meeting.ended",
        80,
        frictionless(),
    )]);

    // No recent event: the event-received moment never matches.
    assert!(service.suggestion(&ctx(&["zoom", "hubspot"])).is_none());

    // The wrong event is as good as none.
    let wrong = ctx(&["zoom", "hubspot"])
        .with_recent_event(ObservedEvent::new("meeting.started", "zoom", Utc::now()));
    assert!(service.suggestion(&wrong).is_none());

    let right = ctx(&["zoom", "hubspot"])
        .with_recent_event(ObservedEvent::new("meeting.ended", "zoom", Utc::now()));
    let suggestion = service.suggestion(&right).unwrap();
    assert_eq!(suggestion.workflow_id().as_str(), "meeting-notes");
    assert_eq!(suggestion.trigger, DiscoveryTrigger::EventReceived);
}

#[test]
fn trigger_restriction_filters_moment_kinds() {
    let mut service = DiscoveryService::new();
    service.register([
        event_workflow("on-event", "f", "zoom", "hubspot", "meeting.ended", 50, frictionless()),
        time_based_workflow("any-time", "f", "zoom", "hubspot", 50),
    ]);

    let ctx = ctx(&["zoom", "hubspot"])
        .with_recent_event(ObservedEvent::new("meeting.ended", "zoom", Utc::now()));

    let event = service
        .suggestion_for_trigger(DiscoveryTrigger::EventReceived, &ctx)
        .unwrap();
    assert_eq!(event.workflow_id().as_str(), "on-event");

    let timed = service
        .suggestion_for_trigger(DiscoveryTrigger::TimeBased, &ctx)
        .unwrap();
    assert_eq!(timed.workflow_id().as_str(), "any-time");

    // Nothing declares a pattern moment.
    assert!(service
        .suggestion_for_trigger(DiscoveryTrigger::PatternDetected, &ctx)
        .is_none());
}

#[test]
fn frame_suggestions_never_repeat_a_primary_pair() {
    let mut service = DiscoveryService::new();
    service.register([
        time_based_workflow("zoom-a", "crm-hygiene", "zoom", "hubspot", 40),
        time_based_workflow("zoom-b", "crm-hygiene", "zoom", "hubspot", 70),
        time_based_workflow("slack-a", "crm-hygiene", "slack", "hubspot", 50),
        time_based_workflow("other-frame", "inbox-zero", "zoom", "hubspot", 99),
    ]);

    let ctx = ctx(&["zoom", "hubspot", "slack"]);
    let frame = OutcomeFrame::new("crm-hygiene");
    let suggestions = service.suggestions_for_frame(&frame, &ctx);

    let pairs: Vec<String> = suggestions
        .iter()
        .map(|s| s.workflow.pathway.primary.key())
        .collect();
    let mut deduped = pairs.clone();
    deduped.dedup();
    assert_eq!(pairs, deduped, "duplicate primary pair in {pairs:?}");

    // The better scorer represents the contested pair, best pair first.
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].workflow_id().as_str(), "zoom-b");
    assert_eq!(suggestions[1].workflow_id().as_str(), "slack-a");
}

#[test]
fn frame_suggestions_ignore_other_frames() {
    let mut service = DiscoveryService::new();
    service.register([time_based_workflow("w1", "inbox-zero", "gmail", "notion", 50)]);

    let suggestions =
        service.suggestions_for_frame(&OutcomeFrame::new("crm-hygiene"), &ctx(&["gmail", "notion"]));
    assert!(suggestions.is_empty());
}

#[test]
fn worked_scoring_example_holds_end_to_end() {
    // Priority 80, all indicators, 3 minutes to value, zero essential
    // fields: 80+20+10+10+15+20 = 155; an exact event match adds 30.
    let definition = event_workflow(
        "meeting-notes",
        "crm-hygiene",
        "zoom",
        "hubspot",
        "meeting.ended",
        80,
        frictionless(),
    );
    let mut service = DiscoveryService::new();
    service.register([definition]);

    let matched = ctx(&["zoom", "hubspot"])
        .with_recent_event(ObservedEvent::new("meeting.ended", "zoom", Utc::now()));
    assert_eq!(service.suggestion(&matched).unwrap().score, 185);
}

#[test]
fn essential_fields_cost_points() {
    let zero = event_workflow("zero", "f", "zoom", "hubspot", "meeting.ended", 80, frictionless());
    let two = with_essential_fields(
        event_workflow("two", "f", "zoom", "hubspot", "meeting.ended", 80, frictionless()),
        &["crm_list", "owner"],
    );
    let mut service = DiscoveryService::new();
    service.register([two, zero]);

    let ctx = ctx(&["zoom", "hubspot"])
        .with_recent_event(ObservedEvent::new("meeting.ended", "zoom", Utc::now()));
    let suggestion = service.suggestion(&ctx).unwrap();
    // 185 for zero fields beats 175 for two, despite registration order.
    assert_eq!(suggestion.workflow_id().as_str(), "zero");
    assert_eq!(suggestion.score, 185);
}

#[test]
fn indicators_default_off_when_unset() {
    let plain = event_workflow(
        "plain",
        "f",
        "zoom",
        "hubspot",
        "meeting.ended",
        80,
        Zuhandenheit::default(),
    );
    let mut service = DiscoveryService::new();
    service.register([plain]);

    let ctx = ctx(&["zoom", "hubspot"])
        .with_recent_event(ObservedEvent::new("meeting.ended", "zoom", Utc::now()));
    // 80 priority + 30 event match + 20 zero fields, nothing else.
    assert_eq!(service.suggestion(&ctx).unwrap().score, 130);
}
