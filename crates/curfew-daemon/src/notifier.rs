//! Alert consumer
//!
//! Every alert is logged; with the `desktop-notify` feature it can also be
//! shown as a desktop notification.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[cfg(feature = "desktop-notify")]
use notify_rust::{Notification, Timeout};
#[cfg(feature = "desktop-notify")]
use tracing::error;

/// Drains the alert channel
pub struct Notifier {
    #[cfg_attr(not(feature = "desktop-notify"), allow(dead_code))]
    desktop: bool,
}

impl Notifier {
    pub fn new(desktop: bool) -> Self {
        #[cfg(not(feature = "desktop-notify"))]
        if desktop {
            warn!("Desktop notifications enabled but feature 'desktop-notify' not compiled in");
        }

        Self { desktop }
    }

    /// Deliver alerts until cancelled or every sender is gone
    ///
    /// Alerts already buffered at cancellation are still delivered.
    /// Returns the number of alerts delivered.
    pub async fn run(self, cancel: CancellationToken, mut alerts: mpsc::Receiver<String>) -> usize {
        let mut delivered = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    alerts.close();
                    while let Ok(message) = alerts.try_recv() {
                        self.deliver(&message);
                        delivered += 1;
                    }
                    break;
                }
                message = alerts.recv() => match message {
                    Some(message) => {
                        self.deliver(&message);
                        delivered += 1;
                    }
                    None => break,
                }
            }
        }

        info!("Notifier stopped after {} alerts", delivered);
        delivered
    }

    fn deliver(&self, message: &str) {
        warn!(alert = %message, "ALERT");

        #[cfg(feature = "desktop-notify")]
        if self.desktop {
            if let Err(e) = show_desktop_notification(message) {
                error!("Failed to show desktop notification: {}", e);
            }
        }
    }
}

#[cfg(feature = "desktop-notify")]
fn show_desktop_notification(message: &str) -> anyhow::Result<()> {
    Notification::new()
        .summary("curfew")
        .body(message)
        .icon("dialog-warning")
        .timeout(Timeout::Milliseconds(6000))
        .show()?;
    Ok(())
}
