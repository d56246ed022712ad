//! Worker scheduling for the two load profiles
//!
//! Iterations are isolated: every worker drives its own journeys, with no
//! shared mutable state beyond the metrics sink. Within a worker, execution
//! is strictly sequential; a stop signal is observed only at iteration
//! boundaries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use wsload_core::{BackoffExecutor, HttpTransport, Result, Transport};
use wsload_journey::{Journey, JourneyConfig};

use crate::config::{LoadTestConfig, Profile, Stage};
use crate::metrics::{RunMetrics, RunSummary};

/// Main load test runner
pub struct LoadTestRunner<T = HttpTransport> {
    config: LoadTestConfig,
    journey_config: JourneyConfig,
    transport: Arc<T>,
    metrics: Arc<RunMetrics>,
}

impl LoadTestRunner<HttpTransport> {
    /// Build a runner with the real HTTP transport. The bearer token is
    /// passed in explicitly, already validated at startup.
    pub fn new(config: LoadTestConfig, auth_token: String) -> Result<Self> {
        let transport = HttpTransport::new(&config.transport_options())?;
        Ok(Self::with_transport(config, auth_token, transport))
    }
}

impl<T: Transport + 'static> LoadTestRunner<T> {
    pub fn with_transport(config: LoadTestConfig, auth_token: String, transport: T) -> Self {
        let journey_config = config.journey_config(auth_token);
        Self {
            config,
            journey_config,
            transport: Arc::new(transport),
            metrics: Arc::new(RunMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<RunMetrics> {
        self.metrics.clone()
    }

    /// Run the configured profile to completion and summarize the results
    pub async fn run(&self) -> RunSummary {
        self.metrics.mark_start();
        info!(target = %self.config.target_url, "starting load test");

        match self.config.profile.clone() {
            Profile::Fixed {
                vus,
                iterations_per_vu,
            } => self.run_fixed(vus, iterations_per_vu).await,
            Profile::Ramping {
                stages,
                graceful_stop_secs,
            } => self.run_ramping(&stages, graceful_stop_secs).await,
        }

        info!("load test complete");
        self.metrics.summary()
    }

    async fn run_fixed(&self, vus: u32, iterations_per_vu: u64) {
        info!(vus, iterations_per_vu, "running fixed-iteration profile");

        let mut handles = Vec::with_capacity(vus as usize);
        for vu in 0..vus {
            handles.push(self.spawn_fixed_worker(vu, iterations_per_vu));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("worker panicked: {e}");
            }
        }
    }

    fn spawn_fixed_worker(&self, vu: u32, iterations: u64) -> JoinHandle<()> {
        let transport = self.transport.clone();
        let policy = self.config.retry.clone();
        let journey_config = self.journey_config.clone();
        let metrics = self.metrics.clone();

        tokio::spawn(async move {
            let executor = BackoffExecutor::new(transport, policy);
            for iteration in 0..iterations {
                metrics.record_iteration_started();
                let report = Journey::new(&executor, &journey_config, vu, iteration)
                    .run()
                    .await;
                metrics.record_report(&report);
            }
        })
    }

    async fn run_ramping(&self, stages: &[Stage], graceful_stop_secs: u64) {
        info!(stages = stages.len(), "running ramping profile");

        let (target_tx, target_rx) = watch::channel(0u32);
        // One slot per concurrency level; a worker exits once the target
        // drops to or below its slot index.
        let mut slots: Vec<JoinHandle<()>> = Vec::new();
        let mut next_vu = 0u32;

        for (index, stage) in stages.iter().enumerate() {
            info!(
                stage = index + 1,
                total = stages.len(),
                target_vus = stage.target_vus,
                duration_secs = stage.duration_secs,
                "entering stage"
            );
            target_tx.send_replace(stage.target_vus);

            for slot in 0..stage.target_vus as usize {
                let vacant = slots.get(slot).map_or(true, |handle| handle.is_finished());
                if vacant {
                    let handle =
                        self.spawn_ramping_worker(slot as u32, next_vu, target_rx.clone());
                    next_vu += 1;
                    if slot < slots.len() {
                        slots[slot] = handle;
                    } else {
                        slots.push(handle);
                    }
                }
            }

            sleep(Duration::from_secs(stage.duration_secs)).await;
        }

        // Ramp-down: let in-flight iterations drain, then cut them off
        target_tx.send_replace(0);
        let drain = async {
            for handle in slots.iter_mut() {
                if let Err(e) = handle.await {
                    if !e.is_cancelled() {
                        warn!("worker panicked: {e}");
                    }
                }
            }
        };

        if timeout(Duration::from_secs(graceful_stop_secs), drain)
            .await
            .is_err()
        {
            warn!("graceful stop window elapsed, aborting in-flight iterations");
            for handle in &slots {
                handle.abort();
            }
        }
    }

    fn spawn_ramping_worker(
        &self,
        slot: u32,
        vu: u32,
        target: watch::Receiver<u32>,
    ) -> JoinHandle<()> {
        let transport = self.transport.clone();
        let policy = self.config.retry.clone();
        let journey_config = self.journey_config.clone();
        let metrics = self.metrics.clone();

        tokio::spawn(async move {
            let executor = BackoffExecutor::new(transport, policy);
            let mut iteration = 0u64;
            while *target.borrow() > slot {
                metrics.record_iteration_started();
                let report = Journey::new(&executor, &journey_config, vu, iteration)
                    .run()
                    .await;
                metrics.record_report(&report);
                iteration += 1;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use wsload_core::{RequestDescriptor, RetryPolicy, TransportError, TransportResponse};

    /// Always succeeds; remembers every workspace name it saw created
    struct CountingTransport {
        created_workspaces: Mutex<HashSet<String>>,
        calls: Mutex<u64>,
    }

    impl CountingTransport {
        fn new() -> Self {
            Self {
                created_workspaces: Mutex::new(HashSet::new()),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn send(
            &self,
            request: &RequestDescriptor,
        ) -> std::result::Result<TransportResponse, TransportError> {
            *self.calls.lock().unwrap() += 1;

            let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
            if body["query"]
                .as_str()
                .unwrap()
                .starts_with("mutation CreateProject")
            {
                let name = body["variables"]["input"]["name"].as_str().unwrap();
                self.created_workspaces
                    .lock()
                    .unwrap()
                    .insert(name.to_string());
            }

            Ok(TransportResponse {
                status: 200,
                body: r#"{"data":{"createProject":{"id":"ws-id-1"}}}"#.to_string(),
            })
        }
    }

    fn test_config(profile: Profile, step_pause_ms: u64) -> LoadTestConfig {
        LoadTestConfig {
            stagger_start: false,
            step_pause_ms,
            retry: RetryPolicy::no_retry(),
            profile,
            ..LoadTestConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_profile_runs_every_iteration() {
        let config = test_config(
            Profile::Fixed {
                vus: 3,
                iterations_per_vu: 2,
            },
            0,
        );
        let runner =
            LoadTestRunner::with_transport(config, "token".to_string(), CountingTransport::new());

        let summary = runner.run().await;

        assert_eq!(summary.iterations_started, 6);
        assert_eq!(summary.iterations_completed, 6);
        assert_eq!(summary.iterations_aborted, 0);
        assert_eq!(summary.steps_succeeded, 48);

        // Six iterations, six distinct workspaces
        let names = runner
            .transport
            .created_workspaces
            .lock()
            .unwrap()
            .clone();
        assert_eq!(names.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ramping_profile_stops_at_ramp_down() {
        let config = test_config(
            Profile::Ramping {
                stages: vec![
                    Stage {
                        duration_secs: 2,
                        target_vus: 2,
                    },
                    Stage {
                        duration_secs: 1,
                        target_vus: 0,
                    },
                ],
                graceful_stop_secs: 60,
            },
            100,
        );
        let runner =
            LoadTestRunner::with_transport(config, "token".to_string(), CountingTransport::new());

        let summary = runner.run().await;

        // Two workers each complete at least one full journey before the
        // target drops, and nothing is left half-finished
        assert!(summary.iterations_started >= 2);
        assert_eq!(summary.iterations_completed, summary.iterations_started);
        assert_eq!(summary.iterations_aborted, 0);
    }
}
