//! Alert messages for the user-facing notifier
//!
//! Alerts are plain strings. Sending never blocks: when the buffer is full
//! or the receiver is gone the message is dropped and logged.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Default buffer size for alert channels
pub const DEFAULT_ALERT_CAPACITY: usize = 64;

/// Sending half of an alert channel
#[derive(Debug, Clone)]
pub struct AlertSender {
    tx: mpsc::Sender<String>,
}

/// Create a bounded alert channel
pub fn alert_channel(capacity: usize) -> (AlertSender, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (AlertSender { tx }, rx)
}

impl AlertSender {
    /// Push an alert without waiting. Returns whether it was queued.
    pub fn send(&self, message: impl Into<String>) -> bool {
        match self.tx.try_send(message.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                warn!(alert = %message, "Alert channel full, dropping alert");
                false
            }
            Err(TrySendError::Closed(message)) => {
                debug!(alert = %message, "Alert receiver closed, dropping alert");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_receive() {
        let (alerts, mut rx) = alert_channel(4);

        assert!(alerts.send("Killing process: Notepad, PID: 1234"));
        assert_eq!(
            rx.recv().await.as_deref(),
            Some("Killing process: Notepad, PID: 1234")
        );
    }

    #[tokio::test]
    async fn test_full_channel_drops_instead_of_blocking() {
        let (alerts, mut rx) = alert_channel(1);

        assert!(alerts.send("first"));
        assert!(!alerts.send("second"));

        assert_eq!(rx.recv().await.as_deref(), Some("first"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (alerts, rx) = alert_channel(1);
        drop(rx);

        assert!(alerts.is_closed());
        assert!(!alerts.send("nobody listening"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (alerts, _rx) = alert_channel(0);
        assert!(alerts.send("still buffered"));
    }
}
