//! Request descriptors and common header assembly

use std::collections::BTreeMap;
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// One outbound POST: target, serialized payload, headers, and timeout.
///
/// Immutable once constructed; the scenario driver builds a fresh descriptor
/// for every call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Target endpoint
    pub url: String,

    /// Serialized request body
    pub body: String,

    /// Header name to value mapping
    pub headers: BTreeMap<String, String>,

    /// Timeout for a single attempt
    pub timeout: Duration,
}

impl RequestDescriptor {
    pub fn new(
        url: impl Into<String>,
        body: impl Into<String>,
        headers: BTreeMap<String, String>,
    ) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            headers,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Build the header map shared by every call against the target backend.
///
/// The bearer token and the workspace (space) identifier are the only values
/// that vary between calls; everything else is fixed by the backend's
/// gateway.
pub fn common_headers(token: &str, space_id: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers.insert("Authorization".to_string(), format!("Bearer {}", token));
    headers.insert("x-tenant".to_string(), "organization".to_string());
    headers.insert("x-fastn-space-id".to_string(), space_id.to_string());
    headers.insert("realm".to_string(), "fastn".to_string());
    headers.insert("accept".to_string(), "*/*".to_string());
    headers
}
