//! # wsload runner
//!
//! Load profile interpretation and scheduling for wsload: spins up virtual
//! users (each running independent workspace lifecycle journeys), collects
//! run metrics, and prints the end-of-run report.
//!
//! Profiles are declarative configuration, not runtime logic: either a
//! stepped ramping concurrency profile or a fixed iteration count per
//! virtual user.

pub mod config;
pub mod metrics;
pub mod runner;

pub use config::{auth_token_from_env, LoadTestConfig, Profile, Stage, AUTH_TOKEN_ENV};
pub use metrics::{RunMetrics, RunSummary};
pub use runner::LoadTestRunner;
