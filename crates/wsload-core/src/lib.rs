//! # wsload core
//!
//! The request-execution core of the wsload load tester:
//!
//! - `RequestDescriptor` - one immutable outbound POST (target, body, headers, timeout)
//! - `Transport` - the seam between the executor and the network; the real
//!   implementation wraps reqwest, tests substitute fakes
//! - `BackoffExecutor` - issues a request through a transport and retries
//!   recoverable failures with exponential backoff and jitter
//!
//! Success is discriminated on HTTP status alone: the backends this tool
//! targets report business errors inside a 200-status GraphQL envelope, so
//! anything other than a 200 is a recoverable failure.

pub mod error;
pub mod request;
pub mod retry;
pub mod transport;

pub use error::{Result, WsloadError};
pub use request::{common_headers, RequestDescriptor};
pub use retry::{AttemptOutcome, BackoffExecutor, FailureReason, RetryPolicy};
pub use transport::{
    HttpTransport, HttpTransportOptions, Transport, TransportError, TransportResponse,
};
