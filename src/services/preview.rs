//! Link preview bookkeeping.
//!
//! Fetching happens outside the core. Every request takes a fresh token from
//! [`PreviewTracker`]; results carrying an older token are dropped, so a slow
//! response can never overwrite the preview of a newer selection.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::types::errors::PreviewError;
use crate::types::preview::{PreviewPayload, PreviewState};

pub const NO_PREVIEW: &str = "No preview available";

/// Source of preview payloads, typically an HTTP endpoint.
pub trait PreviewService {
    fn fetch_preview(&self, url: &str) -> impl Future<Output = Result<PreviewPayload, PreviewError>> + Send;
}

/// Attempt count and timing for [`fetch_payload_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            attempt_timeout: Duration::from_millis(6500),
            retry_delay: Duration::from_millis(220),
        }
    }
}

/// Fetches a payload, retrying plain failures after a short delay.
///
/// A timed out attempt is not retried. `still_current` is checked before each
/// attempt and a superseded request ends with [`PreviewError::Stale`].
pub async fn fetch_payload_with_retry<S, F>(
    service: &S,
    url: &str,
    policy: RetryPolicy,
    still_current: F,
) -> Result<PreviewPayload, PreviewError>
where
    S: PreviewService,
    F: Fn() -> bool,
{
    let mut last_error = PreviewError::Failed("Preview request failed.".to_string());
    for attempt in 1..=policy.max_attempts {
        if !still_current() {
            return Err(PreviewError::Stale);
        }
        match tokio::time::timeout(policy.attempt_timeout, service.fetch_preview(url)).await {
            Ok(Ok(payload)) => return Ok(payload),
            Ok(Err(PreviewError::Stale)) => return Err(PreviewError::Stale),
            Ok(Err(e)) => {
                warn!(url, attempt, error = %e, "preview attempt failed");
                last_error = e;
            }
            Err(_) => {
                warn!(url, attempt, "preview attempt timed out");
                return Err(PreviewError::Timeout);
            }
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.retry_delay).await;
        }
    }
    Err(last_error)
}

/// Token and candidate bookkeeping for the preview pane.
#[derive(Debug, Clone, Default)]
pub struct PreviewTracker {
    token: u64,
    state: PreviewState,
    candidates: Vec<String>,
    candidate_index: usize,
}

impl PreviewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a request for `url` and returns its token.
    pub fn begin(&mut self, url: &str) -> u64 {
        self.token += 1;
        self.state = PreviewState {
            url: url.to_string(),
            image_url: String::new(),
            loading: true,
            error: String::new(),
        };
        self.candidates.clear();
        self.candidate_index = 0;
        self.token
    }

    pub fn current_token(&self) -> u64 {
        self.token
    }

    pub fn is_current(&self, token: u64) -> bool {
        token == self.token
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    /// Applies a finished request. Returns `false` when the result was stale
    /// and therefore ignored.
    pub fn complete(&mut self, token: u64, result: Result<PreviewPayload, PreviewError>) -> bool {
        if !self.is_current(token) {
            debug!(token, current = self.token, "dropping stale preview result");
            return false;
        }
        let candidates = match result {
            Ok(payload) => payload.candidates(),
            Err(PreviewError::Stale) => return false,
            Err(_) => Vec::new(),
        };
        if candidates.is_empty() {
            self.fail();
            return true;
        }
        self.state.image_url = candidates[0].clone();
        self.state.error.clear();
        self.candidates = candidates;
        self.candidate_index = 0;
        true
    }

    /// The current image rendered.
    pub fn on_image_loaded(&mut self) {
        self.state.loading = false;
        self.state.error.clear();
    }

    /// The current image failed to render; advance to the next candidate.
    pub fn on_image_error(&mut self) {
        let next = self.candidate_index + 1;
        if next < self.candidates.len() {
            self.candidate_index = next;
            self.state.image_url = self.candidates[next].clone();
            self.state.loading = true;
            return;
        }
        self.fail();
    }

    /// Resets the pane and invalidates any request in flight.
    pub fn clear(&mut self) {
        self.token += 1;
        self.state = PreviewState::default();
        self.candidates.clear();
        self.candidate_index = 0;
    }

    fn fail(&mut self) {
        self.state.loading = false;
        self.state.image_url.clear();
        self.state.error = NO_PREVIEW.to_string();
    }
}
