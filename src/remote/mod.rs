//! Remote backend adapters.
//!
//! Two mutually exclusive backends, selected once at boot via
//! `BackendConfig`:
//! - `relational`: Supabase/PostgREST row CRUD with server-side visibility
//!   filtering and schema-mismatch recovery
//! - `document`: Firestore REST document CRUD for a narrower entity set
//!
//! `realtime` forwards the relational backend's server-pushed change events
//! into the in-process `ChangeNotifier`.
//!
//! Shared here: the error type, the retry policy for transient HTTP
//! failures, and the undefined-column classification behind the relational
//! adapter's degrade path.

pub mod document;
pub mod realtime;
pub mod relational;

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("request exhausted retries")]
    RetriesExhausted,
}

impl RemoteError {
    /// True for failures a caller may retry: transport trouble, rate
    /// limits, and server errors. 4xx rejections are not transient.
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Http(err) => err.is_timeout() || err.is_connect(),
            RemoteError::Api { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            RemoteError::RetriesExhausted => true,
            _ => false,
        }
    }
}

// ============================================================================
// Retry policy
// ============================================================================

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Single-attempt policy for tests and fire-and-forget paths.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }
}

fn status_is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn backoff_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    let base = policy
        .initial_backoff_ms
        .saturating_mul(exponent)
        .min(policy.max_backoff_ms);
    let jitter = rand::random::<u64>() % 150;
    Duration::from_millis(base.saturating_add(jitter))
}

/// Send a request, retrying transient failures (connect/timeout errors,
/// 408/429/5xx responses) with exponential backoff. Non-retryable responses
/// are returned as-is for the caller to interpret.
pub(crate) async fn send_with_retry(
    request: reqwest::RequestBuilder,
    policy: &RetryPolicy,
) -> Result<reqwest::Response, RemoteError> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        let Some(cloned) = request.try_clone() else {
            return request.send().await.map_err(RemoteError::Http);
        };

        match cloned.send().await {
            Ok(response) => {
                let status = response.status();
                if status_is_retryable(status) && attempt < attempts {
                    let delay = backoff_delay(attempt, policy);
                    log::warn!(
                        "remote: retry {}/{} after status {} (sleep {:?})",
                        attempt,
                        attempts,
                        status,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Ok(response);
            }
            Err(err) => {
                if (err.is_timeout() || err.is_connect()) && attempt < attempts {
                    let delay = backoff_delay(attempt, policy);
                    log::warn!(
                        "remote: retry {}/{} after transport error: {} (sleep {:?})",
                        attempt,
                        attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(RemoteError::Http(err));
            }
        }
    }

    Err(RemoteError::RetriesExhausted)
}

// ============================================================================
// Schema-mismatch classification
// ============================================================================

/// Columns added by the v2 sharing migration. A backend still on the v1
/// schema lacks them; queries and payloads retry once without them.
pub(crate) const SCOPE_COLUMNS: &[&str] = &[
    "visibility",
    "ownerId",
    "owner_id",
    "sharedWith",
    "shared_with",
];

/// Whether a failed response indicates the table lacks a column we asked
/// for. Matches Postgres `42703` (undefined column), PostgREST `PGRST204`
/// (column not found in schema cache), and the corresponding message text.
pub(crate) fn is_undefined_column(status: reqwest::StatusCode, body: &str) -> bool {
    if !status.is_client_error() {
        return false;
    }
    if let Ok(err) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(code) = err.get("code").and_then(|c| c.as_str()) {
            if code == "42703" || code == "PGRST204" {
                return true;
            }
        }
        if let Some(message) = err.get("message").and_then(|m| m.as_str()) {
            let lowered = message.to_lowercase();
            if lowered.contains("column") && lowered.contains("does not exist") {
                return true;
            }
        }
    }
    false
}

/// Strip the sharing columns from a write payload, for the schema-mismatch
/// retry. Leaves every other field intact.
pub(crate) fn strip_scope_columns(payload: &mut serde_json::Value) {
    if let Some(map) = payload.as_object_mut() {
        for column in SCOPE_COLUMNS {
            map.remove(*column);
        }
    }
}
