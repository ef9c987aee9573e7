//! Resilient HTTP call layer with status-code-aware retry/backoff.

use crate::auth::Auth;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use gantry_types::{GantryError, Result, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Retry policy consumed per call, not a global.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum request attempts. Must be at least 1.
    pub attempts: u32,
    /// Delay between failed attempts. No delay follows the final attempt.
    pub backoff: Duration,
    /// Status codes that terminate the call immediately instead of being
    /// retried, regardless of remaining attempts.
    pub failure_codes: Vec<u16>,
    /// When set, a terminal 404 yields `Ok(None)` instead of an error.
    pub none_on_404: bool,
}

impl RetryPolicy {
    /// Policy with the given attempts and backoff, no failure codes.
    #[must_use]
    pub const fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts,
            backoff,
            failure_codes: Vec::new(),
            none_on_404: false,
        }
    }

    /// Adds status codes that short-circuit retrying.
    #[must_use]
    pub fn failure_codes(mut self, codes: &[u16]) -> Self {
        self.failure_codes.extend_from_slice(codes);
        self
    }

    /// Suppresses a terminal 404 to `Ok(None)`.
    #[must_use]
    pub fn none_on_404(mut self) -> Self {
        self.none_on_404 = true;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(5))
    }
}

/// What the last attempt produced, before terminal resolution.
#[derive(Debug)]
enum Failure {
    Response(HttpResponse),
    Transport(TransportError),
}

/// Issues logical HTTP calls with automatic retry/backoff.
///
/// A call produces exactly one of: a success response, `None` (suppressed
/// 404), a structured HTTP error, or the original transport error.
#[derive(Debug, Clone)]
pub struct RestClient {
    transport: Arc<dyn Transport>,
    auth: Auth,
}

impl RestClient {
    /// Creates a call layer over the given transport, attaching `auth` to
    /// every outgoing request.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, auth: Auth) -> Self {
        Self { transport, auth }
    }

    /// Issues one logical request, retrying per `policy`.
    ///
    /// Retry rules:
    ///
    /// - 2xx returns the response immediately.
    /// - 404 terminates immediately without consuming further attempts:
    ///   `Ok(None)` when `none_on_404`, else [`GantryError::NotFound`].
    /// - A status in `failure_codes` terminates immediately with
    ///   [`GantryError::Http`].
    /// - Any other non-2xx status is retried with backoff while attempts
    ///   remain, then yields [`GantryError::Http`] for the last status.
    /// - Transport failures consume one attempt each and are retried the same
    ///   way; on exhaustion the original [`TransportError`] is surfaced
    ///   unwrapped.
    ///
    /// # Errors
    ///
    /// See above; additionally [`GantryError::Configuration`] if
    /// `policy.attempts` is zero.
    pub async fn call(
        &self,
        request: HttpRequest,
        policy: &RetryPolicy,
    ) -> Result<Option<HttpResponse>> {
        if policy.attempts == 0 {
            return Err(GantryError::Configuration(
                "call attempts must be at least 1".to_string(),
            ));
        }

        let mut request = request;
        request.auth = self.auth.clone();

        let mut failure: Option<Failure> = None;
        for attempt in 1..=policy.attempts {
            match self.transport.send(request.clone()).await {
                Ok(response) => {
                    if response.is_success() {
                        return Ok(Some(response));
                    }
                    let status = response.status;
                    let terminal = status == 404 || policy.failure_codes.contains(&status);
                    failure = Some(Failure::Response(response));
                    if terminal {
                        break;
                    }
                    debug!(url = %request.url, status, attempt, "retrying after HTTP failure");
                }
                Err(err) => {
                    debug!(url = %request.url, error = %err, attempt, "retrying after transport failure");
                    failure = Some(Failure::Transport(err));
                }
            }
            if attempt < policy.attempts {
                tokio::time::sleep(policy.backoff).await;
            }
        }

        let Some(failure) = failure else {
            // attempts >= 1, so the loop always records a failure before
            // falling through.
            return Err(GantryError::Configuration(
                "call loop terminated without an attempt".to_string(),
            ));
        };

        match failure {
            Failure::Response(response) if response.status == 404 => {
                if policy.none_on_404 {
                    Ok(None)
                } else {
                    Err(GantryError::NotFound(request.url))
                }
            }
            Failure::Response(response) => Err(GantryError::Http {
                status: response.status,
                url: request.url,
            }),
            Failure::Transport(err) => Err(err.into()),
        }
    }
}
