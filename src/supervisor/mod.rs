//! Connection Health Supervision
//!
//! Watches the liveness of a long-lived, device-paired messaging connection
//! and drives it through a bounded, rate-limited recovery procedure when
//! liveness degrades:
//! - Pure decision logic deciding the next state per health check
//! - Scheduler owning the tick loop and the persisted state
//! - Recovery orchestration (disconnect, reconnect, request pairing code)
//! - Operator notification with the fresh pairing code

pub mod events;
pub mod machine;
pub mod notifier;
pub mod recovery;
pub mod scheduler;
pub mod state;
pub mod traits;

pub use events::SupervisorEvent;
pub use machine::{decide, Decision, SkipReason, TickAction};
pub use notifier::PairingNotifier;
pub use recovery::{format_pairing_code, RecoveryOrchestrator};
pub use scheduler::ConnectionSupervisor;
pub use state::{HealthStatus, PairingState, StateStore, SupervisorState};
pub use traits::{KeyValueStore, NotificationChannel, WatchedConnection};
