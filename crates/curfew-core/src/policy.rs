//! Process policy enforcement loop

use crate::{
    alert::AlertSender,
    categories::{CategoryOperator, NoCategories},
    monitor::ProcessMonitor,
    types::{AppPolicy, EnforcementReport},
    window::{self, Clock},
    Result,
};
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pause between enforcement ticks
pub const ENFORCEMENT_INTERVAL: Duration = Duration::from_secs(5);

/// Kills governed processes that run outside their allowed hours
///
/// A process is governed by a policy when its name equals the policy name,
/// or when one of its categories does.
pub struct ProcessPolicy {
    monitor: Arc<dyn ProcessMonitor>,
    categories: Arc<dyn CategoryOperator>,
    clock: Clock,
    alerts: Option<AlertSender>,
}

impl ProcessPolicy {
    pub fn new(monitor: Arc<dyn ProcessMonitor>, categories: Arc<dyn CategoryOperator>) -> Self {
        Self {
            monitor,
            categories,
            clock: window::system_clock(),
            alerts: None,
        }
    }

    /// Policy that matches on process names only
    pub fn without_categories(monitor: Arc<dyn ProcessMonitor>) -> Self {
        Self::new(monitor, Arc::new(NoCategories))
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_alerts(mut self, alerts: AlertSender) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Run enforcement ticks until `cancel` fires
    ///
    /// Per-process and enumeration failures are logged and never end the
    /// loop; cancellation is a clean stop.
    pub async fn apply(&self, cancel: CancellationToken, policies: &[AppPolicy]) -> Result<()> {
        info!(
            policies = policies.len(),
            interval = ?ENFORCEMENT_INTERVAL,
            "Process policy started"
        );

        loop {
            if cancel.is_cancelled() {
                info!("Cancellation requested, stopping process policy");
                return Ok(());
            }

            let report = self.enforce(policies);
            debug!(
                inspected = report.inspected,
                blocked = report.blocked,
                killed = report.killed,
                kill_failures = report.kill_failures,
                "Enforcement tick complete"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cancellation requested, stopping process policy");
                    return Ok(());
                }
                _ = sleep(ENFORCEMENT_INTERVAL) => {}
            }
        }
    }

    /// Single enforcement pass over the running processes
    pub fn enforce(&self, policies: &[AppPolicy]) -> EnforcementReport {
        let mut report = EnforcementReport::new();

        let processes = match self.monitor.running_processes() {
            Ok(processes) => processes,
            Err(e) => {
                error!("Error getting running processes: {}", e);
                return report;
            }
        };

        let now = (self.clock)();

        for process in processes {
            report.inspected += 1;

            let info = match process.info() {
                Ok(info) => info,
                Err(e) => {
                    report.info_failures += 1;
                    debug!("Error getting process info: {}", e);
                    continue;
                }
            };

            let categories = self.categories.categories_of(&info.name);
            let Some(policy) = self.violated_policy(policies, &info.name, &categories, now) else {
                continue;
            };
            report.blocked += 1;

            let message = format!("Killing process: {}, PID: {}", info.name, info.pid);
            if let Some(alerts) = &self.alerts {
                alerts.send(message.clone());
            }
            warn!(policy = %policy.name, pid = info.pid, "{}", message);

            match process.kill() {
                Ok(()) => report.record_kill(),
                Err(e) => {
                    report.record_kill_failure();
                    error!("Error killing process {}: {}", info.name, e);
                }
            }
        }

        report
    }

    /// Whether `policy` allows its targets to run right now
    pub fn is_allowed_to_run(&self, policy: &AppPolicy) -> bool {
        window::is_allowed_to_run(policy, (self.clock)())
    }

    /// First governing policy whose window excludes `now`
    fn violated_policy<'a>(
        &self,
        policies: &'a [AppPolicy],
        name: &str,
        categories: &[String],
        now: NaiveDateTime,
    ) -> Option<&'a AppPolicy> {
        policies
            .iter()
            .filter(|policy| policy.governs(name, categories))
            .find(|policy| !window::is_allowed_to_run(policy, now))
    }
}
