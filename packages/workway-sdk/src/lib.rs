//! # Workway SDK
//!
//! The workflow authoring surface: everything a workflow developer writes
//! to describe a workflow, and everything the discovery service reads to
//! decide when to offer it.
//!
//! A definition couples three declarations:
//!
//! - **Outcome** — what the workflow achieves, named in the user's terms
//!   and framed in an outcome category.
//! - **Trigger** — how it runs once installed ([`Trigger::webhook`],
//!   [`Trigger::schedule`], [`Trigger::manual`], [`Trigger::poll`]).
//! - **Pathway** — when it should surface: integration pairs, discovery
//!   moments, smart defaults, essential fields, and the [`Zuhandenheit`]
//!   indicators.
//!
//! Definitions are plain serializable data. Validation happens in the
//! builders; nothing in this crate performs IO.

pub mod trigger;
pub mod workflow;

// Triggers and authoring errors
pub use trigger::{Result, SdkError, Trigger};

// Workflow definition and pathway types
pub use workflow::{
    DiscoveryMoment, DiscoveryPathway, DiscoveryTrigger, EssentialField, IntegrationId,
    IntegrationPair, OutcomeFrame, OutcomeMetadata, SmartDefault, WorkflowDefinition, WorkflowId,
    Zuhandenheit,
};
