//! Observable supervisor signals
//!
//! Broadcast to subscribers for logging and dashboards; the decision logic
//! never depends on them.

use crate::supervisor::machine::SkipReason;
use crate::supervisor::state::HealthStatus;

/// Event emitted by the supervisor
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// A tick completed, with the resulting status snapshot
    HealthCheck { status: HealthStatus },
    /// The liveness read came back healthy
    Healthy,
    /// The liveness read came back unhealthy
    Unhealthy { consecutive_failures: u32 },
    /// Recovery succeeded and a pairing code is waiting for the operator
    PairingRequested { code: String },
    /// The operator notification was delivered
    PairingNotificationSent { target: String },
    /// A tick declined to start recovery
    PairingSkipped { reason: SkipReason },
    /// A recovery attempt failed
    Error { message: String },
}
