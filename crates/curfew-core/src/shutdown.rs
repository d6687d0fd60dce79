//! Scheduled machine shutdown with pre-alerts

use crate::{
    alert::AlertSender,
    window::{self, Clock},
    Error, Result,
};
use chrono::NaiveTime;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Minutes before shutdown at which an alert is raised
pub const DEFAULT_ALERT_MINUTES: [u32; 3] = [10, 3, 1];

/// Something able to power the machine off
pub trait ShutdownInvoker: Send + Sync {
    fn shutdown(&self) -> Result<()>;
}

/// Invokes the platform shutdown command
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdown;

impl SystemShutdown {
    /// Program and arguments used on this platform, if any
    pub fn command() -> Option<(&'static str, &'static [&'static str])> {
        if cfg!(target_os = "linux") {
            Some(("shutdown", &["-h", "now"]))
        } else if cfg!(target_os = "macos") {
            Some(("sudo", &["shutdown", "-h", "now"]))
        } else if cfg!(target_os = "windows") {
            Some(("shutdown", &["/s", "/f", "/t", "0"]))
        } else {
            None
        }
    }
}

impl ShutdownInvoker for SystemShutdown {
    fn shutdown(&self) -> Result<()> {
        let (program, args) = Self::command()
            .ok_or_else(|| Error::Shutdown("unsupported operating system".to_string()))?;

        info!("Executing: {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| Error::Shutdown(format!("Failed to execute {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Shutdown(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Shuts the machine down at a wall-clock time
pub struct ShutdownPolicy {
    invoker: Arc<dyn ShutdownInvoker>,
    alert_minutes: Vec<u32>,
    alerts: Option<AlertSender>,
    clock: Clock,
}

impl ShutdownPolicy {
    pub fn new(invoker: Arc<dyn ShutdownInvoker>, alert_minutes: Vec<u32>) -> Self {
        Self {
            invoker,
            alert_minutes,
            alerts: None,
            clock: window::system_clock(),
        }
    }

    pub fn with_alerts(mut self, alerts: AlertSender) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Wait for the next occurrence of `target`, then shut down
    ///
    /// Returns `Error::Cancelled` if `cancel` fires first. Pre-alert tasks are
    /// bound to this call and never outlive it.
    pub async fn apply(&self, cancel: CancellationToken, target: NaiveTime) -> Result<()> {
        let now = (self.clock)();
        let shutdown_at = window::next_occurrence(target, now);

        let delay = match (shutdown_at - now).to_std() {
            Ok(delay) if !delay.is_zero() => delay,
            _ => {
                info!("Shutdown time reached, shutting down now");
                return self.invoke().await;
            }
        };

        info!(
            at = %shutdown_at.format("%Y-%m-%d %H:%M"),
            "Shutdown scheduled in {}",
            humantime::format_duration(delay)
        );

        let alerts_token = cancel.child_token();
        let _alerts_guard = alerts_token.clone().drop_guard();
        let mut pre_alerts = JoinSet::new();

        for &minutes in &self.alert_minutes {
            let lead = Duration::from_secs(u64::from(minutes) * 60);
            let wait = match delay.checked_sub(lead) {
                Some(wait) if !wait.is_zero() => wait,
                _ => {
                    debug!(minutes, "Pre-alert offset already reached, skipping");
                    continue;
                }
            };

            let token = alerts_token.clone();
            let alerts = self.alerts.clone();
            pre_alerts.spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = sleep(wait) => {
                        let message = format!("Shutting down in {} minutes", minutes);
                        info!("{}", message);
                        if let Some(alerts) = alerts {
                            alerts.send(message);
                        }
                    }
                }
            });
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Shutdown cancelled");
                Err(Error::Cancelled)
            }
            _ = sleep(delay) => {
                info!("Shutdown time reached, shutting down now");
                self.invoke().await
            }
        }
    }

    /// Run the invoker on the blocking pool; it may wait on a child process
    async fn invoke(&self) -> Result<()> {
        let invoker = self.invoker.clone();
        let result = tokio::task::spawn_blocking(move || invoker.shutdown())
            .await
            .unwrap_or_else(|e| Err(Error::Shutdown(format!("Shutdown task failed: {}", e))));

        if let Err(e) = &result {
            error!("Shutdown failed: {}", e);
        }
        result
    }
}
