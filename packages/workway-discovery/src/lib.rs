//! # Workway Discovery
//!
//! Need-driven workflow discovery: given what a user is doing right now,
//! surface the one workflow that would help — and let workflows that break
//! disappear until they are healthy again.
//!
//! ## Core Concepts
//!
//! - [`DiscoveryService`] — owns the registered catalog and per-workflow
//!   visibility state. Explicit object, no global instance.
//! - [`DiscoveryContext`] — everything known about the user at the moment
//!   of the request: connections, the triggering event, install state,
//!   recent activity.
//! - [`Suggestion`] — at most one workflow per moment, chosen by additive
//!   editorial scoring with registration order as the tie-break.
//! - [`VisibilityState`] — breakdown history per workflow and the 0–100
//!   disappearance score derived from it.
//!
//! ## Example
//!
//! ```ignore
//! use workway_discovery::{DiscoveryContext, DiscoveryService, ObservedEvent};
//!
//! let mut service = DiscoveryService::new();
//! service.register(catalog());
//!
//! let ctx = DiscoveryContext::new("user-1")
//!     .with_connected(["zoom", "hubspot"])
//!     .with_recent_event(ObservedEvent::new("meeting.ended", "zoom", Utc::now()));
//!
//! if let Some(suggestion) = service.suggestion(&ctx) {
//!     offer(suggestion.workflow_id());
//! }
//! ```

pub mod context;
pub mod scoring;
pub mod service;
pub mod visibility;

// Request context
pub use context::{DiscoveryContext, ObservedEvent, TemporalContext, UpcomingEvent};

// Scoring
pub use scoring::score_moment;

// Service and suggestions
pub use service::{DiscoveryService, Suggestion};

// Visibility
pub use visibility::{BreakdownRecord, VisibilityState};
