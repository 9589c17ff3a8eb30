//! Recovery orchestration
//!
//! Drives the watched connection through disconnect → reconnect → request a
//! new pairing code. The sequence is atomic from the scheduler's point of
//! view: it is invoked at most once at a time, and the scheduler applies the
//! resulting state transition.

use crate::error::{LinkwatchError, Result};
use crate::supervisor::traits::WatchedConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Wait after disconnect for teardown to settle
const TEARDOWN_GRACE: Duration = Duration::from_secs(2);
/// Wait after reconnect for the socket to initialize
const REINIT_GRACE: Duration = Duration::from_secs(2);

/// Executes the disconnect → reconnect → request-credential sequence
pub struct RecoveryOrchestrator {
    connection: Arc<dyn WatchedConnection>,
    identity: String,
    teardown_grace: Duration,
    reinit_grace: Duration,
}

impl RecoveryOrchestrator {
    pub fn new(connection: Arc<dyn WatchedConnection>, identity: impl Into<String>) -> Self {
        Self {
            connection,
            identity: identity.into(),
            teardown_grace: TEARDOWN_GRACE,
            reinit_grace: REINIT_GRACE,
        }
    }

    /// Override the settle waits between steps.
    pub fn with_grace_periods(mut self, teardown: Duration, reinit: Duration) -> Self {
        self.teardown_grace = teardown;
        self.reinit_grace = reinit;
        self
    }

    /// Run the full recovery sequence, returning the formatted pairing code.
    ///
    /// Any step failure aborts the sequence; the caller decides the state
    /// transition for both outcomes.
    pub async fn run(&self) -> Result<String> {
        info!("Starting connection recovery for {}", self.identity);

        self.connection
            .disconnect()
            .await
            .map_err(|e| step_failed("disconnect", e))?;
        debug!("Connection torn down, settling for {:?}", self.teardown_grace);
        sleep(self.teardown_grace).await;

        self.connection
            .connect()
            .await
            .map_err(|e| step_failed("reconnect", e))?;
        debug!("Connection re-established, settling for {:?}", self.reinit_grace);
        sleep(self.reinit_grace).await;

        let code = self
            .connection
            .request_pairing_code(&self.identity)
            .await
            .map_err(|e| step_failed("request_pairing_code", e))?;

        let formatted = format_pairing_code(&code);
        info!("Pairing code issued for {}", self.identity);
        Ok(formatted)
    }
}

fn step_failed(step: &'static str, err: LinkwatchError) -> LinkwatchError {
    LinkwatchError::RecoveryStep {
        step,
        reason: err.to_string(),
    }
}

/// Group an 8-character pairing code as `XXXX-XXXX` for human readability.
///
/// Codes of any other length pass through untouched.
pub fn format_pairing_code(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase();
    if cleaned.len() == 8 {
        format!("{}-{}", &cleaned[..4], &cleaned[4..])
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::traits::MockWatchedConnection;

    fn fast(orchestrator: RecoveryOrchestrator) -> RecoveryOrchestrator {
        orchestrator.with_grace_periods(Duration::from_millis(0), Duration::from_millis(0))
    }

    #[test]
    fn test_format_pairing_code_groups_digits() {
        assert_eq!(format_pairing_code("ABCD1234"), "ABCD-1234");
        assert_eq!(format_pairing_code("abcd1234"), "ABCD-1234");
        assert_eq!(format_pairing_code("AB-CD-12-34"), "ABCD-1234");
    }

    #[test]
    fn test_format_pairing_code_passes_odd_lengths_through() {
        assert_eq!(format_pairing_code("123456"), "123456");
        assert_eq!(format_pairing_code(""), "");
    }

    #[tokio::test]
    async fn test_run_executes_steps_in_order() {
        let mut mock = MockWatchedConnection::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_disconnect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        mock.expect_connect()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        mock.expect_request_pairing_code()
            .withf(|identity| identity == "15551234567")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok("ABCD1234".to_string()));

        let orchestrator = fast(RecoveryOrchestrator::new(Arc::new(mock), "15551234567"));
        let code = orchestrator.run().await.unwrap();
        assert_eq!(code, "ABCD-1234");
    }

    #[tokio::test]
    async fn test_disconnect_failure_aborts_sequence() {
        let mut mock = MockWatchedConnection::new();
        mock.expect_disconnect()
            .times(1)
            .returning(|| Err(LinkwatchError::Connection("socket stuck".to_string())));
        mock.expect_connect().times(0);
        mock.expect_request_pairing_code().times(0);

        let orchestrator = fast(RecoveryOrchestrator::new(Arc::new(mock), "15551234567"));
        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(
            err,
            LinkwatchError::RecoveryStep { step: "disconnect", .. }
        ));
    }

    #[tokio::test]
    async fn test_code_request_failure_surfaces_step() {
        let mut mock = MockWatchedConnection::new();
        mock.expect_disconnect().returning(|| Ok(()));
        mock.expect_connect().returning(|| Ok(()));
        mock.expect_request_pairing_code()
            .returning(|_| Err(LinkwatchError::Connection("not registered".to_string())));

        let orchestrator = fast(RecoveryOrchestrator::new(Arc::new(mock), "15551234567"));
        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(
            err,
            LinkwatchError::RecoveryStep {
                step: "request_pairing_code",
                ..
            }
        ));
    }
}
