//! Transport seam between the executor and the network
//!
//! `Transport` is the only place network I/O happens. The production
//! implementation wraps a reqwest client; tests substitute scripted fakes.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::error::{Result, WsloadError};
use crate::request::RequestDescriptor;

/// Raw outcome of one completed HTTP exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// Status is the sole success discriminant for this backend
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Extract a string field from the JSON body by pointer,
    /// e.g. `/data/createProject/id`.
    pub fn json_str(&self, pointer: &str) -> Result<String> {
        serde_json::from_str::<Value>(&self.body)
            .ok()
            .and_then(|value| value.pointer(pointer).cloned())
            .and_then(|field| field.as_str().map(str::to_string))
            .ok_or_else(|| WsloadError::InvalidResponse {
                pointer: pointer.to_string(),
            })
    }
}

/// A request that never produced a response (connect, TLS, or timeout failure)
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Issues a single request and reports the raw outcome. No retry logic here.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Connection behavior for the real transport
#[derive(Debug, Clone)]
pub struct HttpTransportOptions {
    /// Skip TLS certificate validation (test environments only)
    pub accept_invalid_certs: bool,

    /// Keep idle connections around between requests
    pub reuse_connections: bool,
}

impl Default for HttpTransportOptions {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            reuse_connections: true,
        }
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(options: &HttpTransportOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if options.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if !options.reuse_connections {
            builder = builder.pool_max_idle_per_host(0);
        }

        let client = builder
            .build()
            .map_err(|e| WsloadError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .body(request.body.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_str_extracts_nested_field() {
        let response = TransportResponse {
            status: 200,
            body: r#"{"data":{"createProject":{"id":"ws-1","name":"demo"}}}"#.to_string(),
        };

        let id = response.json_str("/data/createProject/id").unwrap();
        assert_eq!(id, "ws-1");
    }

    #[test]
    fn test_json_str_missing_field_is_invalid_response() {
        let response = TransportResponse {
            status: 200,
            body: r#"{"data":{"createProject":null}}"#.to_string(),
        };

        let err = response.json_str("/data/createProject/id").unwrap_err();
        assert!(matches!(err, WsloadError::InvalidResponse { .. }));
    }

    #[test]
    fn test_json_str_rejects_non_json_body() {
        let response = TransportResponse {
            status: 200,
            body: "<html>gateway error</html>".to_string(),
        };

        assert!(response.json_str("/data").is_err());
    }

    #[test]
    fn test_success_is_exactly_200() {
        for status in [200u16] {
            assert!(TransportResponse {
                status,
                body: String::new()
            }
            .is_success());
        }
        for status in [201u16, 204, 301, 400, 401, 500, 503] {
            assert!(!TransportResponse {
                status,
                body: String::new()
            }
            .is_success());
        }
    }
}
