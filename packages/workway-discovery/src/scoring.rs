//! Editorial suggestion scoring.
//!
//! Scores are additive points over a (workflow, moment) pair. Every input
//! is authored — declared priority, frictionless indicators, field count —
//! or situational (did the moment's event just happen). There are no
//! install counts, ratings, or retention signals in here: popularity
//! feedback loops bury new workflows, and this scorer must not.

use workway_sdk::{DiscoveryMoment, WorkflowDefinition};

use crate::context::DiscoveryContext;

/// Declared priority counts at most this much.
const PRIORITY_CAP: u32 = 100;

/// Works immediately after install, no configuration.
const WORKS_OUT_OF_BOX_POINTS: u32 = 20;
/// Keeps partial value when a dependency degrades.
const GRACEFUL_DEGRADATION_POINTS: u32 = 10;
/// Fires without the user doing anything.
const AUTOMATIC_TRIGGER_POINTS: u32 = 10;

/// The moment's declared event type just happened to this user.
const EVENT_MATCH_POINTS: u32 = 30;

/// Score a moment for a user context.
///
/// Components:
///
/// - declared priority, capped at 100
/// - zuhandenheit indicators: +20 / +10 / +10
/// - time to value: ≤5 min +15, ≤1 h +10, ≤1 day +5
/// - the moment's event type matching the context's recent event: +30
/// - essential fields: none +20, one +15, two +10, three +5, more +0
pub fn score_moment(
    definition: &WorkflowDefinition,
    moment: &DiscoveryMoment,
    ctx: &DiscoveryContext,
) -> u32 {
    let mut score = u32::from(moment.priority).min(PRIORITY_CAP);

    let zu = &definition.pathway.zuhandenheit;
    if zu.works_out_of_box {
        score += WORKS_OUT_OF_BOX_POINTS;
    }
    if zu.graceful_degradation {
        score += GRACEFUL_DEGRADATION_POINTS;
    }
    if zu.automatic_trigger {
        score += AUTOMATIC_TRIGGER_POINTS;
    }
    score += time_to_value_points(zu.time_to_value_minutes);

    if let (Some(expected), Some(recent)) = (&moment.event_type, &ctx.recent_event) {
        if *expected == recent.event_type {
            score += EVENT_MATCH_POINTS;
        }
    }

    score += essential_field_points(definition.pathway.essential_fields.len());
    score
}

/// Faster first value scores higher; past a day it stops mattering.
fn time_to_value_points(minutes: Option<u32>) -> u32 {
    match minutes {
        Some(m) if m <= 5 => 15,
        Some(m) if m <= 60 => 10,
        Some(m) if m <= 1440 => 5,
        _ => 0,
    }
}

/// Fewer required fields, less friction, more points.
fn essential_field_points(count: usize) -> u32 {
    match count {
        0 => 20,
        1 => 15,
        2 => 10,
        3 => 5,
        _ => 0,
    }
}
