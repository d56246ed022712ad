//! The fixed-order user journey and its per-step failure policy

use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use wsload_core::{common_headers, BackoffExecutor, RequestDescriptor, Transport};

use crate::graphql;

/// Everything a journey needs besides the executor; built once at startup
/// from validated configuration, never from ambient environment state.
#[derive(Debug, Clone)]
pub struct JourneyConfig {
    /// GraphQL endpoint URL
    pub endpoint: String,

    /// Bearer token, validated before any journey starts
    pub auth_token: String,

    /// Space id used for the create-workspace call, before the journey has
    /// a workspace of its own
    pub bootstrap_space_id: String,

    /// Prefix for generated workspace and table names
    pub name_prefix: String,

    /// Timeout for a single request attempt
    pub request_timeout: Duration,

    /// Pause inserted after every step (pacing, not correctness)
    pub step_pause: Duration,

    /// Sleep a random sub-second interval before the first request
    pub stagger_start: bool,
}

/// The eight steps of one journey, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateWorkspace,
    PromoteToEnterprise,
    CreateTable,
    AddRecords,
    GetRecords,
    RemoveTable,
    EnableDeletion,
    DeleteWorkspace,
}

impl Step {
    pub const ALL: [Step; 8] = [
        Step::CreateWorkspace,
        Step::PromoteToEnterprise,
        Step::CreateTable,
        Step::AddRecords,
        Step::GetRecords,
        Step::RemoveTable,
        Step::EnableDeletion,
        Step::DeleteWorkspace,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Step::CreateWorkspace => "create_workspace",
            Step::PromoteToEnterprise => "promote_to_enterprise",
            Step::CreateTable => "create_table",
            Step::AddRecords => "add_records",
            Step::GetRecords => "get_records",
            Step::RemoveTable => "remove_table",
            Step::EnableDeletion => "enable_deletion",
            Step::DeleteWorkspace => "delete_workspace",
        }
    }

    /// Whether an exhausted step ends the iteration. Promotion is best-effort:
    /// the rest of the lifecycle works on a non-enterprise workspace too.
    pub fn aborts_journey(&self) -> bool {
        !matches!(self, Step::PromoteToEnterprise)
    }
}

/// Outcome of one executed step
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step: Step,
    pub latency: Duration,
    pub error: Option<String>,
}

impl StepRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// What one journey did: which steps ran, how long they took, and whether
/// the sequence ran to the end.
#[derive(Debug, Clone)]
pub struct JourneyReport {
    pub workspace_name: String,
    pub table_name: String,
    pub steps: Vec<StepRecord>,
    pub completed: bool,
}

impl JourneyReport {
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.succeeded()).count()
    }
}

/// One synthetic user journey. Strictly sequential: no step starts before
/// the previous step's full request/retry cycle has finished.
pub struct Journey<'a, T> {
    executor: &'a BackoffExecutor<T>,
    config: &'a JourneyConfig,
    workspace_name: String,
    table_name: String,
}

impl<'a, T: Transport> Journey<'a, T> {
    /// Names derive from the (virtual user, iteration) pair, so concurrent
    /// journeys are isolated by construction.
    pub fn new(
        executor: &'a BackoffExecutor<T>,
        config: &'a JourneyConfig,
        vu: u32,
        iteration: u64,
    ) -> Self {
        let workspace_name = format!("{}-workspace-{}-{}", config.name_prefix, vu, iteration);
        let table_name = format!("{}-table-{}-{}", config.name_prefix, vu, iteration);
        Self {
            executor,
            config,
            workspace_name,
            table_name,
        }
    }

    pub fn workspace_name(&self) -> &str {
        &self.workspace_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn descriptor(&self, space_id: &str, body: String) -> RequestDescriptor {
        RequestDescriptor::new(
            self.config.endpoint.clone(),
            body,
            common_headers(&self.config.auth_token, space_id),
        )
        .with_timeout(self.config.request_timeout)
    }

    async fn pace(&self, pause: Duration) {
        if !pause.is_zero() {
            sleep(pause).await;
        }
    }

    /// Run the full lifecycle. Failures never cross journey boundaries: the
    /// report carries everything the caller needs.
    pub async fn run(&self) -> JourneyReport {
        let mut report = JourneyReport {
            workspace_name: self.workspace_name.clone(),
            table_name: self.table_name.clone(),
            steps: Vec::with_capacity(Step::ALL.len()),
            completed: false,
        };

        if self.config.stagger_start {
            let stagger = Duration::from_millis(rand::thread_rng().gen_range(0..1_000));
            sleep(stagger).await;
        }

        info!(workspace = %self.workspace_name, "creating workspace");

        let descriptor = self.descriptor(
            &self.config.bootstrap_space_id,
            graphql::create_project(&self.workspace_name),
        );
        let started = Instant::now();
        let created = match self.executor.execute(&descriptor).await {
            Ok(response) => response.json_str(graphql::CREATED_PROJECT_ID),
            Err(err) => Err(err),
        };
        let latency = started.elapsed();

        let workspace_id = match created {
            Ok(id) => {
                report.steps.push(StepRecord {
                    step: Step::CreateWorkspace,
                    latency,
                    error: None,
                });
                id
            }
            Err(err) => {
                error!(
                    workspace = %self.workspace_name,
                    error = %err,
                    "journey aborted: workspace was never created"
                );
                report.steps.push(StepRecord {
                    step: Step::CreateWorkspace,
                    latency,
                    error: Some(err.to_string()),
                });
                return report;
            }
        };
        self.pace(self.config.step_pause).await;

        // Remaining steps are uniform: a body, a shared header set keyed on
        // the created workspace id, and a pause. Removing the table gets a
        // longer pause so the backend settles before deletion is enabled.
        let steps: [(Step, String, u32); 7] = [
            (
                Step::PromoteToEnterprise,
                graphql::promote_to_enterprise(&workspace_id),
                1,
            ),
            (
                Step::CreateTable,
                graphql::create_table(&workspace_id, &self.table_name),
                1,
            ),
            (
                Step::AddRecords,
                graphql::add_records(&workspace_id, &self.table_name, &graphql::default_records()),
                1,
            ),
            (
                Step::GetRecords,
                graphql::get_records(&workspace_id, &self.table_name),
                1,
            ),
            (
                Step::RemoveTable,
                graphql::remove_table(&workspace_id, &self.table_name),
                2,
            ),
            (
                Step::EnableDeletion,
                graphql::enable_trash_feature(&workspace_id),
                1,
            ),
            (
                Step::DeleteWorkspace,
                graphql::delete_project(&workspace_id),
                1,
            ),
        ];

        for (step, body, pause_units) in steps {
            let descriptor = self.descriptor(&workspace_id, body);
            let started = Instant::now();
            let result = self.executor.execute(&descriptor).await;
            let latency = started.elapsed();

            match result {
                Ok(_) => report.steps.push(StepRecord {
                    step,
                    latency,
                    error: None,
                }),
                Err(err) => {
                    if step.aborts_journey() {
                        error!(
                            workspace = %self.workspace_name,
                            table = %self.table_name,
                            step = step.name(),
                            error = %err,
                            "journey aborted"
                        );
                        report.steps.push(StepRecord {
                            step,
                            latency,
                            error: Some(err.to_string()),
                        });
                        return report;
                    }
                    warn!(
                        workspace = %self.workspace_name,
                        step = step.name(),
                        error = %err,
                        "step failed, continuing"
                    );
                    report.steps.push(StepRecord {
                        step,
                        latency,
                        error: Some(err.to_string()),
                    });
                }
            }

            self.pace(self.config.step_pause * pause_units).await;
        }

        report.completed = true;
        report
    }
}
