//! Retry policy and the backoff request executor

use std::fmt;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Result, WsloadError};
use crate::request::RequestDescriptor;
use crate::transport::{Transport, TransportError, TransportResponse};

/// Retry policy configuration
///
/// `delay_for_attempt(k)` grows as `base * 2^k` plus uniform jitter. There is
/// no cap unless `max_delay_ms` is set: at attempt 5 with the default base
/// the delay already exceeds 32 seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts per request (>= 1; 1 disables retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in milliseconds, doubled for every retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of the uniform jitter added to every delay, in milliseconds
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Optional cap on the total delay, in milliseconds
    #[serde(default)]
    pub max_delay_ms: Option<u64>,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_jitter_ms() -> u64 {
    1_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_delay_ms: None,
        }
    }
}

impl RetryPolicy {
    /// Single-attempt policy: any failure is immediately terminal
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to sleep after the failed attempt with 0-based index `attempt`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // 2^20 base units is already past any realistic run duration
        let shift = attempt.min(20);
        let exponential_ms = self.base_delay_ms.saturating_mul(1u64 << shift);
        let jitter_ms = (rand::thread_rng().gen::<f64>() * self.jitter_ms as f64) as u64;

        let mut total_ms = exponential_ms.saturating_add(jitter_ms);
        if let Some(cap) = self.max_delay_ms {
            total_ms = total_ms.min(cap);
        }

        Duration::from_millis(total_ms)
    }
}

/// Why a single attempt did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The server answered with a non-200 status
    Status(u16),

    /// The request never completed: connect, TLS, or timeout failure
    Transport(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "status {}", status),
            Self::Transport(message) => write!(f, "transport error: {}", message),
        }
    }
}

/// Classified result of one attempt; never outlives the invocation
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(TransportResponse),
    Failure(FailureReason),
}

impl AttemptOutcome {
    /// Classify a raw transport result. Only an exact 200 is a success.
    pub fn classify(result: std::result::Result<TransportResponse, TransportError>) -> Self {
        match result {
            Ok(response) if response.is_success() => Self::Success(response),
            Ok(response) => Self::Failure(FailureReason::Status(response.status)),
            Err(TransportError(message)) => Self::Failure(FailureReason::Transport(message)),
        }
    }
}

/// Issues requests through a transport, retrying recoverable failures with
/// exponential backoff and jitter.
pub struct BackoffExecutor<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> BackoffExecutor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute one request, retrying until success or attempts are exhausted.
    ///
    /// Returns the response on the first attempt that comes back with status
    /// 200; fails with `ExhaustedRetries` once `max_attempts` attempts have
    /// been observed. N attempts sleep exactly N-1 backoff delays.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<TransportResponse> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last = FailureReason::Transport("no attempt completed".to_string());
        let mut attempt = 0;

        while attempt < max_attempts {
            match AttemptOutcome::classify(self.transport.send(request).await) {
                AttemptOutcome::Success(response) => {
                    if attempt > 0 {
                        debug!(
                            url = %request.url,
                            attempts = attempt + 1,
                            "request succeeded after retries"
                        );
                    }
                    return Ok(response);
                }
                AttemptOutcome::Failure(reason) => {
                    warn!(
                        url = %request.url,
                        attempt = attempt + 1,
                        max_attempts,
                        %reason,
                        "request attempt failed"
                    );
                    last = reason;
                }
            }

            attempt += 1;
            if attempt < max_attempts {
                sleep(self.policy.delay_for_attempt(attempt - 1)).await;
            }
        }

        Err(WsloadError::ExhaustedRetries {
            url: request.url.clone(),
            attempts: max_attempts,
            last,
        })
    }
}
