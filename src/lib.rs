pub mod adapters;
pub mod config;
pub mod error;
pub mod supervisor;

pub use adapters::{MemoryKv, PostgresKv, WebhookChannel};
pub use config::{
    AppConfig, DatabaseConfig, LoggingConfig, NotificationConfig, SupervisorConfig,
};
pub use error::{LinkwatchError, Result};
pub use supervisor::{
    ConnectionSupervisor, HealthStatus, KeyValueStore, NotificationChannel, PairingNotifier,
    PairingState, RecoveryOrchestrator, SkipReason, StateStore, SupervisorEvent, SupervisorState,
    TickAction, WatchedConnection,
};
