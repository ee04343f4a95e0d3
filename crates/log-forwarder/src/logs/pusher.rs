// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use crate::context::InvocationContext;
use crate::http;
use crate::logs::backoff::{BackoffConfig, BackoffState};

/// Time kept back from the deadline so an attempt always ends before it.
pub const DEADLINE_MARGIN: Duration = Duration::from_millis(50);

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sink returned unexpected status code: {status}{}", response_suffix(.body))]
    UnexpectedStatus { status: u16, body: Option<String> },

    #[error("push attempt timed out after {0:?}")]
    AttemptTimeout(Duration),

    #[error("push cancelled")]
    Cancelled,

    #[error("push deadline exceeded")]
    DeadlineExceeded,

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

fn response_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|body| format!(" response: {body}"))
        .unwrap_or_default()
}

/// Delivers chunks to the sink, retrying until success or the end of the
/// invocation.
#[derive(Debug, Clone)]
pub struct Pusher {
    client: reqwest::Client,
    endpoint: String,
    push_timeout: Duration,
    backoff: BackoffConfig,
}

impl Pusher {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        push_timeout: Duration,
        retry_interval: Duration,
    ) -> Result<Self, PushError> {
        let client = http::build_client().map_err(|e| PushError::Client(e.to_string()))?;
        Ok(Self::with_client(
            client,
            endpoint,
            push_timeout,
            BackoffConfig::with_initial_interval(retry_interval),
        ))
    }

    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        endpoint: &str,
        push_timeout: Duration,
        backoff: BackoffConfig,
    ) -> Self {
        Pusher {
            client,
            endpoint: endpoint.to_string(),
            push_timeout,
            backoff,
        }
    }

    /// POSTs `payload` until the sink accepts it.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt once the invocation is cancelled
    /// or past its deadline, or `Cancelled`/`DeadlineExceeded` when no attempt
    /// was made.
    pub async fn push(&self, ctx: &InvocationContext, payload: &[u8]) -> Result<(), PushError> {
        let mut backoff = BackoffState::new(self.backoff);
        let mut last_error = None;
        let mut attempt = 0u32;

        loop {
            if ctx.cancel.is_cancelled() {
                return Err(last_error.unwrap_or(PushError::Cancelled));
            }
            let Some(timeout) = attempt_timeout(self.push_timeout, ctx.remaining()) else {
                return Err(last_error.unwrap_or(PushError::DeadlineExceeded));
            };

            attempt += 1;
            let error = match self.send(ctx, payload, timeout).await {
                Ok(()) => {
                    if attempt > 1 {
                        debug!("Pushed {} bytes after {attempt} attempts", payload.len());
                    }
                    return Ok(());
                }
                Err(e) => e,
            };

            // an attempt cut short by the end of the invocation says less than
            // the failure before it
            if ctx.is_done() {
                let error = match (error, last_error) {
                    (PushError::AttemptTimeout(_) | PushError::Cancelled, Some(previous)) => {
                        previous
                    }
                    (error, _) => error,
                };
                warn!("Giving up push after {attempt} attempts: {error}");
                return Err(error);
            }

            let delay = backoff.next_delay();
            debug!("Push attempt {attempt} failed: {error}, retrying in {delay:?}");
            tokio::select! {
                biased;
                _ = ctx.done() => {
                    warn!("Giving up push after {attempt} attempts: {error}");
                    return Err(error);
                }
                () = tokio::time::sleep(delay) => {}
            }
            last_error = Some(error);
        }
    }

    async fn send(
        &self,
        ctx: &InvocationContext,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<(), PushError> {
        let attempt = async {
            let response = self
                .client
                .post(&self.endpoint)
                .header(CONTENT_TYPE, "application/json")
                .body(payload.to_vec())
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            Err(PushError::UnexpectedStatus {
                status: status.as_u16(),
                body: (!body.is_empty()).then_some(body),
            })
        };

        // the body read is bounded too, a sink may stall after the headers
        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => Err(PushError::Cancelled),
            result = tokio::time::timeout(timeout, attempt) => {
                result.unwrap_or(Err(PushError::AttemptTimeout(timeout)))
            }
        }
    }
}

/// Timeout of the next attempt: the push timeout, cut to end
/// [`DEADLINE_MARGIN`] before the deadline. `None` once that leaves no time.
fn attempt_timeout(push_timeout: Duration, remaining: Option<Duration>) -> Option<Duration> {
    let Some(remaining) = remaining else {
        return Some(push_timeout);
    };
    let left = remaining.saturating_sub(DEADLINE_MARGIN);
    (!left.is_zero()).then(|| left.min(push_timeout))
}
