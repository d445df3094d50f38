//! # Workway Client
//!
//! The HTTP client core every Workway service call goes through: bounded
//! timeouts, URL and query building, one status→error boundary, bearer
//! auth with deduplicated token refresh, correlation propagation, and an
//! optional outbound rate limit.
//!
//! ## Core Concepts
//!
//! - [`HttpClient`] — typed request helpers over one base URL. Every
//!   request races its send against a deadline and optional cancellation,
//!   and every failed response is classified exactly once through
//!   [`WorkwayError::from_status`](workway_core::WorkwayError::from_status).
//! - [`TokenCell`] — the current bearer token and the guarantee that
//!   however many concurrent callers notice it expiring, the
//!   [`TokenProvider`] is called once.
//! - [`RequestOptions`] — per-request correlation ID and cancellation.
//!
//! ## Key Invariants
//!
//! 1. **One refresh in flight** — concurrent refreshes serialize on the
//!    token cell; a 401 forces at most one refresh and one retry.
//! 2. **Deadlines are cooperative** — timeouts come from a raced timer
//!    that is released when the race resolves, never from preemption.
//! 3. **Secrets stay secret** — tokens live in `secrecy` wrappers and
//!    never reach Debug output or logs.
//!
//! ## Example
//!
//! ```ignore
//! use workway_client::{HttpClient, HttpClientConfig};
//!
//! let client = HttpClient::new(
//!     HttpClientConfig::new("https://api.workway.dev")
//!         .with_bearer_token(api_token),
//! )?;
//!
//! let earnings: EarningsReport = client
//!     .get_json("developer/earnings", &[("period", Some("2026-08"))])
//!     .await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;

// Bearer auth
pub use auth::{AccessToken, TokenCell, TokenProvider};

// Client and per-request options
pub use client::{HttpClient, RequestOptions};

// Configuration
pub use config::HttpClientConfig;
