use crate::{config::Config, notifier::Notifier};
use anyhow::Result;
use curfew_core::{
    alert_channel, window, AlertSender, CategoryIndex, Clock, EnforcementReport, ProcessMonitor,
    ProcessPolicy, ShutdownInvoker, ShutdownPolicy, SystemMonitor, SystemShutdown,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Wires the configured policies to the system
///
/// The process policy always runs; the shutdown policy only when a shutdown
/// time is configured. Both share one cancellation token and one alert
/// channel drained by a [`Notifier`].
pub struct Daemon {
    config: Config,
    monitor: Arc<dyn ProcessMonitor>,
    invoker: Arc<dyn ShutdownInvoker>,
    categories: Arc<CategoryIndex>,
    clock: Clock,
}

impl Daemon {
    /// Create daemon backed by the real process table and shutdown command
    pub fn new(config: Config) -> Self {
        let categories = Arc::new(CategoryIndex::from_map(&config.categories));

        Self {
            config,
            monitor: Arc::new(SystemMonitor::new()),
            invoker: Arc::new(SystemShutdown),
            categories,
            clock: window::system_clock(),
        }
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn ProcessMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_invoker(mut self, invoker: Arc<dyn ShutdownInvoker>) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Single enforcement pass, no alerts
    pub fn check_once(&self) -> EnforcementReport {
        self.process_policy(None).enforce(&self.config.apps)
    }

    /// Run both policies until `cancel` fires
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let shutdown_time = self.config.shutdown_time().map_err(anyhow::Error::msg)?;

        let (alerts, rx) = alert_channel(self.config.alerts.channel_capacity);
        let notifier = tokio::spawn(
            Notifier::new(self.config.alerts.desktop_notifications).run(cancel.clone(), rx),
        );

        let mut policies = JoinSet::new();

        let process_policy = self.process_policy(Some(alerts.clone()));
        let apps = self.config.apps.clone();
        let token = cancel.clone();
        info!("Starting process policy with {} app rules", apps.len());
        policies.spawn(async move { ("process", process_policy.apply(token, &apps).await) });

        match shutdown_time {
            Some(target) => {
                let shutdown_policy = ShutdownPolicy::new(
                    self.invoker.clone(),
                    self.config.alerts.shutdown_minutes.clone(),
                )
                .with_alerts(alerts.clone())
                .with_clock(self.clock.clone());
                let token = cancel.clone();
                info!("Starting shutdown policy for {}", target.format("%H:%M"));
                policies.spawn(async move {
                    ("shutdown", shutdown_policy.apply(token, target).await)
                });
            }
            None => info!("No shutdown time configured, shutdown policy disabled"),
        }

        // The notifier stops once both policies are gone
        drop(alerts);

        while let Some(joined) = policies.join_next().await {
            match joined {
                Ok((name, Ok(()))) => info!("{} policy finished", name),
                Ok((name, Err(e))) if e.is_cancelled() => info!("{} policy cancelled", name),
                Ok((name, Err(e))) => error!("{} policy failed: {}", name, e),
                Err(e) => error!("Policy task failed: {}", e),
            }
        }

        let delivered = notifier.await?;
        info!("Daemon stopped ({} alerts delivered)", delivered);
        Ok(())
    }

    fn process_policy(&self, alerts: Option<AlertSender>) -> ProcessPolicy {
        let policy = ProcessPolicy::new(self.monitor.clone(), self.categories.clone())
            .with_clock(self.clock.clone());

        match alerts {
            Some(alerts) => policy.with_alerts(alerts),
            None => policy,
        }
    }
}

/// Log validation warnings once at startup
pub fn log_config_warnings(config: &Config) {
    for warning in config.warnings() {
        warn!("{}", warning);
    }
}
