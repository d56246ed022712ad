//! # wsload journey
//!
//! One synthetic user journey against the target backend: create a
//! workspace, promote it to enterprise, create a table, add and read
//! records, remove the table, enable deletion, and delete the workspace.
//!
//! The sequence is fixed and strictly ordered; the workspace identifier
//! returned by the first step is threaded into every later call. Each
//! journey generates its own workspace and table names from its virtual-user
//! and iteration indices, so concurrent journeys never touch each other's
//! entities.

pub mod graphql;
pub mod journey;

pub use journey::{Journey, JourneyConfig, JourneyReport, Step, StepRecord};
