//! Run metrics: counters, step latency distribution, and the final report

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use wsload_journey::JourneyReport;

/// Shared, lock-light metrics updated by every worker
#[derive(Debug)]
pub struct RunMetrics {
    iterations_started: AtomicU64,
    iterations_completed: AtomicU64,
    iterations_aborted: AtomicU64,
    steps_succeeded: AtomicU64,
    steps_failed: AtomicU64,

    /// Step latency in microseconds
    latency_histogram: RwLock<Histogram<u64>>,

    /// Failure counts keyed by step name
    failures_by_step: RwLock<HashMap<String, u64>>,

    start_time: RwLock<Option<Instant>>,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            iterations_started: AtomicU64::new(0),
            iterations_completed: AtomicU64::new(0),
            iterations_aborted: AtomicU64::new(0),
            steps_succeeded: AtomicU64::new(0),
            steps_failed: AtomicU64::new(0),
            latency_histogram: RwLock::new(
                // 1µs to 10min covers a full retry cycle with uncapped backoff
                Histogram::new_with_bounds(1, 600_000_000, 3)
                    .unwrap_or_else(|_| Histogram::new(3).unwrap()),
            ),
            failures_by_step: RwLock::new(HashMap::new()),
            start_time: RwLock::new(None),
        }
    }

    pub fn mark_start(&self) {
        *self.start_time.write() = Some(Instant::now());
    }

    pub fn record_iteration_started(&self) {
        self.iterations_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold one finished journey into the run totals
    pub fn record_report(&self, report: &JourneyReport) {
        if report.completed {
            self.iterations_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.iterations_aborted.fetch_add(1, Ordering::Relaxed);
        }

        let mut histogram = self.latency_histogram.write();
        for step in &report.steps {
            if step.succeeded() {
                self.steps_succeeded.fetch_add(1, Ordering::Relaxed);
            } else {
                self.steps_failed.fetch_add(1, Ordering::Relaxed);
                *self
                    .failures_by_step
                    .write()
                    .entry(step.step.name().to_string())
                    .or_insert(0) += 1;
            }

            let latency_us = step.latency.as_micros() as u64;
            if let Err(e) = histogram.record(latency_us.max(1)) {
                warn!("failed to record latency: {}", e);
            }
        }
    }

    /// Get summary statistics
    pub fn summary(&self) -> RunSummary {
        let histogram = self.latency_histogram.read();
        let duration = self
            .start_time
            .read()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        let started = self.iterations_started.load(Ordering::Relaxed);
        let completed = self.iterations_completed.load(Ordering::Relaxed);
        let aborted = self.iterations_aborted.load(Ordering::Relaxed);
        let steps_succeeded = self.steps_succeeded.load(Ordering::Relaxed);
        let steps_failed = self.steps_failed.load(Ordering::Relaxed);
        let steps_total = steps_succeeded + steps_failed;

        RunSummary {
            iterations_started: started,
            iterations_completed: completed,
            iterations_aborted: aborted,
            steps_succeeded,
            steps_failed,
            step_success_rate: if steps_total > 0 {
                (steps_succeeded as f64 / steps_total as f64) * 100.0
            } else {
                0.0
            },
            latency_p50_us: histogram.value_at_quantile(0.50),
            latency_p90_us: histogram.value_at_quantile(0.90),
            latency_p99_us: histogram.value_at_quantile(0.99),
            latency_max_us: histogram.max(),
            latency_mean_us: histogram.mean() as u64,
            duration_secs: duration,
            failures_by_step: self.failures_by_step.read().clone(),
        }
    }
}

/// Immutable end-of-run summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub iterations_started: u64,
    pub iterations_completed: u64,
    pub iterations_aborted: u64,
    pub steps_succeeded: u64,
    pub steps_failed: u64,
    pub step_success_rate: f64,
    pub latency_p50_us: u64,
    pub latency_p90_us: u64,
    pub latency_p99_us: u64,
    pub latency_max_us: u64,
    pub latency_mean_us: u64,
    pub duration_secs: f64,
    pub failures_by_step: HashMap<String, u64>,
}

impl RunSummary {
    /// Print formatted report
    pub fn print_report(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              WORKSPACE LIFECYCLE LOAD TEST RESULTS            ║");
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!(
            "║ Duration:             {:>10.2} seconds                     ║",
            self.duration_secs
        );
        println!(
            "║ Iterations started:   {:>10}                              ║",
            self.iterations_started
        );
        println!(
            "║ Iterations completed: {:>10}                              ║",
            self.iterations_completed
        );
        println!(
            "║ Iterations aborted:   {:>10}                              ║",
            self.iterations_aborted
        );
        println!(
            "║ Steps succeeded:      {:>10}                              ║",
            self.steps_succeeded
        );
        println!(
            "║ Steps failed:         {:>10}                              ║",
            self.steps_failed
        );
        println!(
            "║ Step success rate:    {:>10.2}%                             ║",
            self.step_success_rate
        );
        println!("╠══════════════════════════════════════════════════════════════╣");
        println!("║ STEP LATENCY (microseconds)                                  ║");
        println!(
            "║   p50:                {:>10}                              ║",
            self.latency_p50_us
        );
        println!(
            "║   p90:                {:>10}                              ║",
            self.latency_p90_us
        );
        println!(
            "║   p99:                {:>10}                              ║",
            self.latency_p99_us
        );
        println!(
            "║   max:                {:>10}                              ║",
            self.latency_max_us
        );
        println!(
            "║   mean:               {:>10}                              ║",
            self.latency_mean_us
        );

        if !self.failures_by_step.is_empty() {
            println!("╠══════════════════════════════════════════════════════════════╣");
            println!("║ FAILURES BY STEP                                             ║");
            for (step, count) in &self.failures_by_step {
                println!("║   {:22}: {:>10}                       ║", step, count);
            }
        }

        println!("╚══════════════════════════════════════════════════════════════╝\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wsload_journey::{Step, StepRecord};

    fn report(completed: bool, failed_step: Option<Step>) -> JourneyReport {
        let mut steps = vec![
            StepRecord {
                step: Step::CreateWorkspace,
                latency: Duration::from_millis(120),
                error: None,
            },
            StepRecord {
                step: Step::PromoteToEnterprise,
                latency: Duration::from_millis(80),
                error: None,
            },
        ];
        if let Some(step) = failed_step {
            steps.push(StepRecord {
                step,
                latency: Duration::from_millis(300),
                error: Some("all 5 attempts failed".to_string()),
            });
        }
        JourneyReport {
            workspace_name: "wsload-workspace-0-0".to_string(),
            table_name: "wsload-table-0-0".to_string(),
            steps,
            completed,
        }
    }

    #[test]
    fn test_reports_aggregate_into_summary() {
        let metrics = RunMetrics::new();
        metrics.mark_start();

        metrics.record_iteration_started();
        metrics.record_report(&report(true, None));
        metrics.record_iteration_started();
        metrics.record_report(&report(false, Some(Step::CreateTable)));

        let summary = metrics.summary();
        assert_eq!(summary.iterations_started, 2);
        assert_eq!(summary.iterations_completed, 1);
        assert_eq!(summary.iterations_aborted, 1);
        assert_eq!(summary.steps_succeeded, 4);
        assert_eq!(summary.steps_failed, 1);
        assert_eq!(summary.failures_by_step.get("create_table"), Some(&1));
        assert!(summary.step_success_rate > 79.0 && summary.step_success_rate < 81.0);
    }

    #[test]
    fn test_empty_run_has_zero_rate() {
        let summary = RunMetrics::new().summary();
        assert_eq!(summary.iterations_started, 0);
        assert_eq!(summary.step_success_rate, 0.0);
    }

    #[test]
    fn test_latency_lands_in_histogram() {
        let metrics = RunMetrics::new();
        metrics.record_report(&report(true, None));

        let summary = metrics.summary();
        assert!(summary.latency_max_us >= 100_000);
        assert!(summary.latency_p50_us >= 1);
    }
}
