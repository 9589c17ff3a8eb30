//! Operator notification
//!
//! Delivers the pairing code to the configured operator channel. Delivery is
//! best-effort: failures are logged and reported as a boolean, never
//! propagated into the recovery success path.

use crate::supervisor::traits::NotificationChannel;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Sends pairing-code alerts to a single operator channel
pub struct PairingNotifier {
    channel: Arc<dyn NotificationChannel>,
}

impl PairingNotifier {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self { channel }
    }

    /// Post the pairing code and instructions to the operator.
    ///
    /// Returns whether delivery succeeded.
    pub async fn notify(&self, target: &str, code: &str, wait_window: Duration) -> bool {
        let text = format_pairing_message(code, wait_window);

        let handle = match self.channel.open_conversation(target).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Failed to open operator conversation with {}: {}", target, e);
                return false;
            }
        };

        match self.channel.post_message(&handle, &text).await {
            Ok(()) => {
                info!("Pairing code delivered to operator {}", target);
                true
            }
            Err(e) => {
                warn!("Failed to deliver pairing code to {}: {}", target, e);
                false
            }
        }
    }
}

fn format_pairing_message(code: &str, wait_window: Duration) -> String {
    format!(
        "\u{1f511} New pairing code: {}\n\n\
         The messaging link dropped and was reconnected. To re-pair, open the app \
         on the linked phone, choose \"Link a device\", then \"Link with phone number \
         instead\" and enter the code.\n\n\
         You have about {} before a fresh code is requested.",
        code,
        format_wait_window(wait_window)
    )
}

// "8h", "1h 30m", "45m". Seconds are below operator resolution.
fn format_wait_window(window: Duration) -> String {
    let total_mins = window.as_secs() / 60;
    let hours = total_mins / 60;
    let mins = total_mins % 60;
    match (hours, mins) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkwatchError;
    use crate::supervisor::traits::MockNotificationChannel;

    #[test]
    fn test_format_wait_window() {
        assert_eq!(format_wait_window(Duration::from_secs(8 * 3600)), "8h");
        assert_eq!(format_wait_window(Duration::from_secs(90 * 60)), "1h 30m");
        assert_eq!(format_wait_window(Duration::from_secs(45 * 60)), "45m");
        assert_eq!(format_wait_window(Duration::from_secs(30)), "0m");
    }

    #[test]
    fn test_message_contains_code_and_window() {
        let text = format_pairing_message("ABCD-1234", Duration::from_secs(8 * 3600));
        assert!(text.contains("ABCD-1234"));
        assert!(text.contains("8h"));
        assert!(text.contains("Link a device"));
    }

    #[tokio::test]
    async fn test_notify_posts_to_opened_conversation() {
        let mut mock = MockNotificationChannel::new();
        mock.expect_open_conversation()
            .withf(|target| target == "ops-channel")
            .times(1)
            .returning(|_| Ok("conv-42".to_string()));
        mock.expect_post_message()
            .withf(|handle, text| handle == "conv-42" && text.contains("ABCD-1234"))
            .times(1)
            .returning(|_, _| Ok(()));

        let notifier = PairingNotifier::new(Arc::new(mock));
        assert!(
            notifier
                .notify("ops-channel", "ABCD-1234", Duration::from_secs(3600))
                .await
        );
    }

    #[tokio::test]
    async fn test_notify_reports_failure_without_panicking() {
        let mut mock = MockNotificationChannel::new();
        mock.expect_open_conversation()
            .returning(|_| Err(LinkwatchError::Notification("unreachable".to_string())));

        let notifier = PairingNotifier::new(Arc::new(mock));
        assert!(
            !notifier
                .notify("ops-channel", "ABCD-1234", Duration::from_secs(3600))
                .await
        );
    }

    #[tokio::test]
    async fn test_notify_reports_post_failure() {
        let mut mock = MockNotificationChannel::new();
        mock.expect_open_conversation()
            .returning(|_| Ok("conv-42".to_string()));
        mock.expect_post_message()
            .returning(|_, _| Err(LinkwatchError::Notification("rate limited".to_string())));

        let notifier = PairingNotifier::new(Arc::new(mock));
        assert!(
            !notifier
                .notify("ops-channel", "ABCD-1234", Duration::from_secs(3600))
                .await
        );
    }
}
