//! Bearer tokens: the provider seam, proactive refresh, and refresh
//! deduplication.
//!
//! # The Refresh Rule
//!
//! > **However many callers notice an expiring token, the provider hears
//! > about it once.**
//!
//! [`TokenCell`] holds the current token behind a `tokio::sync::Mutex` that
//! stays held across the refresh await. Concurrent callers serialize on the
//! lock: the first performs the provider call, the rest wake to a fresh
//! token and reuse it. Reactive refresh (after a 401) is guarded by a
//! generation counter, so a caller holding a stale token cannot trigger a
//! second refresh for a rejection the previous refresh already fixed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::debug;
use workway_core::Result;

/// A bearer token plus its known expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The token itself; never printed.
    pub token: SecretString,
    /// When the token stops working, if the issuer said.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            expires_at: None,
        }
    }

    /// Record the issuer-declared expiry.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the token expires within `threshold` of `now`. Tokens with
    /// no known expiry never do.
    pub fn expires_within(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            // An already-expired token has no remaining std duration.
            Some(at) => (at - now).to_std().map_or(true, |remaining| remaining <= threshold),
            None => false,
        }
    }
}

/// Source of fresh bearer tokens.
///
/// Called only when the current token is absent, inside the proactive
/// refresh window, or rejected by the server.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn refresh(&self) -> Result<AccessToken>;
}

#[derive(Debug, Default)]
struct Slot {
    token: Option<AccessToken>,
    /// Bumped on every successful refresh; lets reactive callers tell a
    /// stale rejection from a current one.
    generation: u64,
}

/// The current token and the machinery to refresh it exactly once.
pub struct TokenCell {
    provider: Arc<dyn TokenProvider>,
    refresh_threshold: Duration,
    slot: Mutex<Slot>,
}

impl TokenCell {
    pub fn new(provider: Arc<dyn TokenProvider>, refresh_threshold: Duration) -> Self {
        Self {
            provider,
            refresh_threshold,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// The current token, refreshing first when it is missing or expiring
    /// within the threshold. Returns the token and the generation that
    /// produced it.
    pub async fn token(&self) -> Result<(SecretString, u64)> {
        let mut slot = self.slot.lock().await;
        if let Some(current) = &slot.token {
            if !current.expires_within(self.refresh_threshold, Utc::now()) {
                return Ok((current.token.clone(), slot.generation));
            }
            debug!("access token inside the refresh window, refreshing proactively");
        }
        self.refresh_locked(&mut slot).await
    }

    /// Force a refresh after a rejection, unless another caller already
    /// refreshed past the generation this caller observed.
    pub async fn refresh_if_stale(&self, observed_generation: u64) -> Result<(SecretString, u64)> {
        let mut slot = self.slot.lock().await;
        if slot.generation > observed_generation {
            if let Some(current) = &slot.token {
                debug!(
                    observed = observed_generation,
                    current = slot.generation,
                    "rejection predates the latest refresh, reusing it"
                );
                return Ok((current.token.clone(), slot.generation));
            }
        }
        self.refresh_locked(&mut slot).await
    }

    async fn refresh_locked(&self, slot: &mut Slot) -> Result<(SecretString, u64)> {
        let fresh = self.provider.refresh().await?;
        let token = fresh.token.clone();
        slot.token = Some(fresh);
        slot.generation = slot.generation.wrapping_add(1);
        debug!(generation = slot.generation, "access token refreshed");
        Ok((token, slot.generation))
    }
}

impl std::fmt::Debug for TokenCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCell")
            .field("refresh_threshold", &self.refresh_threshold)
            .finish_non_exhaustive()
    }
}
