//! Health check scheduler
//!
//! Owns the supervisor state (single writer), drives the periodic tick loop,
//! and wires the decision function to the recovery orchestrator and the
//! operator notifier. All public entry points catch internal errors and
//! convert them into logged events plus returned status values; nothing
//! escapes as a panic.

use crate::config::SupervisorConfig;
use crate::supervisor::events::SupervisorEvent;
use crate::supervisor::machine::{self, TickAction};
use crate::supervisor::notifier::PairingNotifier;
use crate::supervisor::recovery::RecoveryOrchestrator;
use crate::supervisor::state::{HealthStatus, PairingState, StateStore, SupervisorState};
use crate::supervisor::traits::{KeyValueStore, NotificationChannel, WatchedConnection};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

struct Inner {
    config: SupervisorConfig,
    connection: Arc<dyn WatchedConnection>,
    store: StateStore,
    recovery: RecoveryOrchestrator,
    notifier: PairingNotifier,
    state: RwLock<SupervisorState>,
    // Non-overlap guard: periodic ticks try_lock and skip, administrative
    // calls lock and wait.
    tick_gate: Mutex<()>,
    event_tx: broadcast::Sender<SupervisorEvent>,
}

/// Supervises the liveness of a device-paired messaging connection
#[derive(Clone)]
pub struct ConnectionSupervisor {
    inner: Arc<Inner>,
    running: Arc<AtomicBool>,
}

impl ConnectionSupervisor {
    /// Create a supervisor with injected collaborators.
    pub fn new(
        config: SupervisorConfig,
        connection: Arc<dyn WatchedConnection>,
        store: Arc<dyn KeyValueStore>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        let recovery =
            RecoveryOrchestrator::new(connection.clone(), config.recovery_identity.clone());

        Self {
            inner: Arc::new(Inner {
                config,
                connection,
                store: StateStore::new(store),
                recovery,
                notifier: PairingNotifier::new(channel),
                state: RwLock::new(SupervisorState::default()),
                tick_gate: Mutex::new(()),
                event_tx,
            }),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to supervisor events.
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Hydrate persisted state and start the periodic tick loop.
    ///
    /// No-op when disabled or already running. A store read failure falls
    /// back to defaults and never fails startup.
    pub async fn start(&self) {
        if !self.inner.config.enabled {
            info!("Connection supervisor disabled, not starting");
            return;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Connection supervisor already running");
            return;
        }

        let hydrated = self.inner.store.load().await;
        {
            let mut state = self.inner.state.write().await;
            *state = hydrated;
            if state.pairing_state != PairingState::Idle {
                info!(
                    "Resuming supervision in state '{}' ({} consecutive failures)",
                    state.pairing_state, state.consecutive_failures
                );
            }
        }

        info!(
            "Connection supervisor started (interval: {}s, threshold: {})",
            self.inner.config.check_interval_secs, self.inner.config.failure_threshold
        );

        let inner = self.inner.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            tokio::time::sleep(inner.config.startup_grace()).await;

            let mut ticker = tokio::time::interval(inner.config.check_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                match inner.tick_gate.try_lock() {
                    Ok(_guard) => {
                        inner.run_tick().await;
                    }
                    Err(_) => {
                        debug!("Previous health check still in flight, skipping tick");
                    }
                }
            }

            info!("Connection supervisor stopped");
        });
    }

    /// Cancel future ticks. Idempotent; an in-flight tick finishes on its own.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Run one health check synchronously and return the resulting status.
    ///
    /// Shares the non-overlap guard with the periodic loop: blocks until any
    /// in-flight tick completes.
    pub async fn force_check(&self) -> HealthStatus {
        let _guard = self.inner.tick_gate.lock().await;
        self.inner.run_tick().await
    }

    /// Reset pairing bookkeeping and run a recovery attempt immediately,
    /// bypassing the failure threshold.
    ///
    /// Returns whether the recovery sequence produced a pairing code.
    pub async fn force_pairing(&self) -> bool {
        let _guard = self.inner.tick_gate.lock().await;

        let snapshot = {
            let mut state = self.inner.state.write().await;
            state.pairing_state = PairingState::Idle;
            state.last_pairing_request = None;
            state.clone()
        };
        self.inner.store.save(&snapshot).await;

        info!("Operator requested re-pairing, starting recovery");
        self.inner.run_recovery().await
    }

    /// Reset all counters and state to defaults without running recovery.
    pub async fn reset(&self) {
        let _guard = self.inner.tick_gate.lock().await;

        let snapshot = {
            let mut state = self.inner.state.write().await;
            *state = SupervisorState::default();
            state.clone()
        };
        self.inner.store.save(&snapshot).await;
        info!("Supervisor state reset to defaults");
    }

    /// Snapshot the last-settled state.
    ///
    /// Pure projection: no liveness read, no persistence, no mutation.
    pub async fn get_status(&self) -> HealthStatus {
        let state = self.inner.state.read().await;
        state.snapshot(Utc::now(), &self.inner.config)
    }

    /// Whether the periodic loop is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Inner {
    // Callers must hold the tick gate.
    async fn run_tick(&self) -> HealthStatus {
        let now = Utc::now();
        let is_live = self.connection.is_ready().await;

        let decision = {
            let state = self.state.read().await;
            machine::decide(&state, is_live, now, &self.config)
        };

        {
            let mut state = self.state.write().await;
            *state = decision.state.clone();
        }
        self.store.save(&decision.state).await;

        if is_live {
            self.emit(SupervisorEvent::Healthy);
        } else {
            warn!(
                "Connection unhealthy ({} consecutive failures, state: {})",
                decision.state.consecutive_failures, decision.state.pairing_state
            );
            self.emit(SupervisorEvent::Unhealthy {
                consecutive_failures: decision.state.consecutive_failures,
            });
        }

        match decision.action {
            TickAction::None => {}
            TickAction::Skip(reason) => {
                debug!("Recovery skipped: {}", reason);
                self.emit(SupervisorEvent::PairingSkipped { reason });
            }
            TickAction::TriggerRecovery => {
                self.run_recovery().await;
            }
        }

        let status = {
            let state = self.state.read().await;
            state.snapshot(Utc::now(), &self.config)
        };
        self.emit(SupervisorEvent::HealthCheck {
            status: status.clone(),
        });
        status
    }

    // Runs the recovery sequence and applies the resulting transition.
    // Single-flight is guaranteed by the callers holding the tick gate.
    async fn run_recovery(&self) -> bool {
        match self.recovery.run().await {
            Ok(code) => {
                let snapshot = {
                    let mut state = self.state.write().await;
                    state.pairing_state = PairingState::PairingRequested;
                    state.last_pairing_request = Some(Utc::now());
                    state.clone()
                };
                self.store.save(&snapshot).await;
                self.emit(SupervisorEvent::PairingRequested { code: code.clone() });

                let wait_window = Duration::from_secs(self.config.max_pairing_wait_secs);
                let delivered = self
                    .notifier
                    .notify(&self.config.notify_target, &code, wait_window)
                    .await;
                if delivered {
                    self.emit(SupervisorEvent::PairingNotificationSent {
                        target: self.config.notify_target.clone(),
                    });
                } else {
                    // Notification failure never rolls back the transition.
                    warn!("Pairing code issued but the operator could not be notified");
                }
                true
            }
            Err(e) => {
                error!("Recovery attempt failed, entering cooldown: {}", e);
                let snapshot = {
                    let mut state = self.state.write().await;
                    state.pairing_state = PairingState::Cooldown;
                    state.last_pairing_request = Some(Utc::now());
                    state.clone()
                };
                self.store.save(&snapshot).await;
                self.emit(SupervisorEvent::Error {
                    message: e.to_string(),
                });
                false
            }
        }
    }

    fn emit(&self, event: SupervisorEvent) {
        let _ = self.event_tx.send(event);
    }
}
