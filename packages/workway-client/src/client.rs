//! The HTTP client core.
//!
//! Every Workway service call goes through here: URL and query building,
//! one bounded-deadline race per request, the single status→error boundary,
//! bearer auth with at-most-one reactive refresh, correlation propagation,
//! and an optional outbound rate limit.
//!
//! # The Boundary Rule
//!
//! > **Statuses become codes here, once.**
//!
//! Non-2xx responses are converted through
//! [`WorkwayError::from_status`] exactly once, capturing the provider's own
//! code and message from a JSON error body and any `Retry-After` header.
//! Callers branch on [`ErrorCode`](workway_core::ErrorCode), never on raw
//! statuses.

use std::fmt;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{Quota, RateLimiter};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;
use workway_core::{
    parse_retry_after, CorrelationId, ErrorCode, Result, WorkwayError, CORRELATION_HEADER,
};

use crate::auth::{TokenCell, TokenProvider};
use crate::config::HttpClientConfig;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Query pairs: `None` and empty values are omitted from the URL.
pub type QueryPairs<'a> = [(&'a str, Option<&'a str>)];

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Correlation ID to send; `None` generates a fresh one. Propagate an
    /// inbound value here to join traces across services.
    pub correlation_id: Option<CorrelationId>,
    /// External cancellation; a cancelled token fails the request with
    /// `Cancelled`.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn with_correlation_id(mut self, cid: CorrelationId) -> Self {
        self.correlation_id = Some(cid);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// HTTP client over a single base URL.
pub struct HttpClient {
    http: reqwest::Client,
    base: Url,
    config: HttpClientConfig,
    tokens: Option<TokenCell>,
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            WorkwayError::invalid_config(format!("invalid base URL {:?}: {e}", config.base_url))
        })?;
        let limiter = match config.requests_per_second {
            None => None,
            Some(rps) => {
                let quota = Quota::per_second(NonZeroU32::new(rps).ok_or_else(|| {
                    WorkwayError::invalid_config("requests_per_second must be greater than zero")
                })?);
                Some(Arc::new(RateLimiter::direct(quota)))
            }
        };
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| WorkwayError::invalid_config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base,
            config,
            tokens: None,
            limiter,
        })
    }

    /// Build from `WORKWAY_API_URL` / `WORKWAY_API_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::new(HttpClientConfig::from_env()?)
    }

    /// Attach a refresh-capable token source. Takes precedence over any
    /// static bearer token in the config.
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(TokenCell::new(provider, self.config.refresh_threshold));
        self
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &QueryPairs<'_>) -> Result<T> {
        self.get_json_with(path, query, RequestOptions::default()).await
    }

    pub async fn get_json_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryPairs<'_>,
        opts: RequestOptions,
    ) -> Result<T> {
        let (response, cid) = self.execute(Method::GET, path, query, None, &opts).await?;
        decode_json(response, cid).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryPairs<'_>,
        body: &B,
    ) -> Result<T> {
        self.post_json_with(path, query, body, RequestOptions::default()).await
    }

    pub async fn post_json_with<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &QueryPairs<'_>,
        body: &B,
        opts: RequestOptions,
    ) -> Result<T> {
        let body = serde_json::to_value(body).map_err(|e| {
            WorkwayError::new(ErrorCode::InvalidInput, format!("unserializable request body: {e}"))
        })?;
        let (response, cid) = self
            .execute(Method::POST, path, query, Some(&body), &opts)
            .await?;
        decode_json(response, cid).await
    }

    pub async fn delete(&self, path: &str, query: &QueryPairs<'_>) -> Result<()> {
        self.delete_with(path, query, RequestOptions::default()).await
    }

    pub async fn delete_with(
        &self,
        path: &str,
        query: &QueryPairs<'_>,
        opts: RequestOptions,
    ) -> Result<()> {
        self.execute(Method::DELETE, path, query, None, &opts).await?;
        Ok(())
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Send one request: rate limit, bearer auth, deadline race, boundary
    /// conversion. A 401 with a token provider configured forces one
    /// refresh and one retry; a second 401 propagates.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &QueryPairs<'_>,
        body: Option<&serde_json::Value>,
        opts: &RequestOptions,
    ) -> Result<(reqwest::Response, CorrelationId)> {
        let url = self.build_url(path, query)?;
        let cid = opts.correlation_id.unwrap_or_default();

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let mut refreshed = false;
        loop {
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .header(CORRELATION_HEADER, cid.to_string());

            let mut generation = None;
            if let Some(cell) = &self.tokens {
                let (token, observed) = cell.token().await?;
                generation = Some(observed);
                request = request.bearer_auth(token.expose_secret());
            } else if let Some(token) = &self.config.bearer_token {
                request = request.bearer_auth(token.expose_secret());
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(method = %method, url = %url, correlation_id = %cid, "sending request");
            let response = self.race(request.send(), opts, cid, &url).await?;

            if response.status() == StatusCode::UNAUTHORIZED && !refreshed {
                if let (Some(cell), Some(observed)) = (&self.tokens, generation) {
                    debug!(url = %url, "401 response, forcing one token refresh");
                    cell.refresh_if_stale(observed).await?;
                    refreshed = true;
                    continue;
                }
            }
            if response.status().is_success() {
                return Ok((response, cid));
            }
            return Err(error_from_response(response, &method, &url, cid).await);
        }
    }

    /// Race the send against the configured deadline and any caller-supplied
    /// cancellation. Losing branches are dropped, which releases the timer.
    async fn race(
        &self,
        send: impl Future<Output = reqwest::Result<reqwest::Response>>,
        opts: &RequestOptions,
        cid: CorrelationId,
        url: &Url,
    ) -> Result<reqwest::Response> {
        tokio::select! {
            result = send => result.map_err(|e| transport_error(e, url, cid)),
            _ = tokio::time::sleep(self.config.timeout) => Err(WorkwayError::timeout(format!(
                "request to {url} exceeded the {:?} deadline",
                self.config.timeout
            ))
            .with_correlation_id(cid)),
            _ = wait_cancelled(opts.cancel.as_ref()) => {
                Err(WorkwayError::cancelled(format!("request to {url} was cancelled"))
                    .with_correlation_id(cid))
            }
        }
    }

    /// Join a path onto the base URL and append the non-empty query pairs.
    fn build_url(&self, path: &str, query: &QueryPairs<'_>) -> Result<Url> {
        let mut url = self.base.join(path).map_err(|e| {
            WorkwayError::invalid_config(format!("invalid request path {path:?}: {e}"))
        })?;
        let pairs = query
            .iter()
            .filter_map(|&(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)));
        // Peek before touching the URL so a pair-free request keeps a
        // clean `?`-less form.
        let mut pairs = pairs.peekable();
        if pairs.peek().is_some() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base", &self.base.as_str())
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

/// Pending forever when no token was supplied, so the select arm never wins.
async fn wait_cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

fn transport_error(e: reqwest::Error, url: &Url, cid: CorrelationId) -> WorkwayError {
    let err = if e.is_timeout() {
        WorkwayError::timeout(format!("request to {url} timed out: {e}"))
    } else {
        WorkwayError::network(format!("request to {url} failed: {e}"))
    };
    err.with_correlation_id(cid)
}

async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
    cid: CorrelationId,
) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        WorkwayError::new(ErrorCode::Api, format!("failed to decode response body: {e}"))
            .with_correlation_id(cid)
    })
}

/// The status→error boundary: one classified error per failed response,
/// carrying provider code/message from a JSON body and any `Retry-After`.
async fn error_from_response(
    response: reqwest::Response,
    method: &Method,
    url: &Url,
    cid: CorrelationId,
) -> WorkwayError {
    let status = response.status().as_u16();
    let retry_after = parse_retry_after(
        response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok()),
    );
    let body = response.text().await.unwrap_or_default();

    let mut err = WorkwayError::from_status(status, format!("{method} {url} returned {status}"))
        .with_correlation_id(cid);
    if let Some(wait) = retry_after {
        err = err.with_retry_after(wait);
    }
    if let Some((code, message)) = provider_error(&body) {
        if let Some(code) = code {
            err = err.with_provider_code(code);
        }
        if let Some(message) = message {
            err = err.with_provider_message(message);
        }
    }
    err
}

/// Pull the provider's own code and message out of a JSON error body.
/// Accepts a top-level `{code, message}` object or the same nested under
/// `"error"`.
fn provider_error(body: &str) -> Option<(Option<String>, Option<String>)> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("error").unwrap_or(&value);
    let code = detail.get("code").map(|v| match v.as_str() {
        Some(s) => s.to_owned(),
        None => v.to_string(),
    });
    let message = detail
        .get("message")
        .and_then(|v| v.as_str())
        .map(str::to_owned);
    if code.is_none() && message.is_none() {
        return None;
    }
    Some((code, message))
}
