//! Supervisor state, status snapshots and the persistence gateway
//!
//! `SupervisorState` is the single unit of mutable state. It is owned by the
//! scheduler (single writer), persisted after every transition, and hydrated
//! from the store on startup. Persistence is best-effort in both directions:
//! the in-memory state stays authoritative when the store misbehaves.

use crate::config::SupervisorConfig;
use crate::supervisor::traits::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Pairing lifecycle of the watched connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingState {
    /// No recovery in flight and not in a cooldown window
    #[default]
    Idle,
    /// A pairing code has been issued; waiting for the operator to enter it
    PairingRequested,
    /// Last recovery attempt failed; holding off until the window elapses
    Cooldown,
}

impl PairingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairingState::Idle => "idle",
            PairingState::PairingRequested => "pairing_requested",
            PairingState::Cooldown => "cooldown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(PairingState::Idle),
            "pairing_requested" => Some(PairingState::PairingRequested),
            "cooldown" => Some(PairingState::Cooldown),
            _ => None,
        }
    }
}

impl std::fmt::Display for PairingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable supervisor state
///
/// Only `pairing_state`, `consecutive_failures` and `last_pairing_request`
/// survive a restart; the remaining fields are runtime bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorState {
    pub pairing_state: PairingState,
    pub consecutive_failures: u32,
    pub last_pairing_request: Option<DateTime<Utc>>,
    pub is_healthy: bool,
    pub last_check: Option<DateTime<Utc>>,
    pub last_healthy: Option<DateTime<Utc>>,
}

impl Default for SupervisorState {
    fn default() -> Self {
        Self {
            pairing_state: PairingState::Idle,
            consecutive_failures: 0,
            last_pairing_request: None,
            is_healthy: false,
            last_check: None,
            last_healthy: None,
        }
    }
}

impl SupervisorState {
    /// Project the settled state into a read-only status snapshot.
    ///
    /// Pure computation: no liveness read, no persistence, no mutation.
    pub fn snapshot(&self, now: DateTime<Utc>, config: &SupervisorConfig) -> HealthStatus {
        let cooldown_remaining_secs = match (self.pairing_state, self.last_pairing_request) {
            (PairingState::Cooldown, Some(since)) => {
                let elapsed = now.signed_duration_since(since).num_seconds().max(0);
                (config.cooldown_secs as i64 - elapsed).max(0) as u64
            }
            _ => 0,
        };

        HealthStatus {
            is_healthy: self.is_healthy,
            consecutive_failures: self.consecutive_failures,
            pairing_state: self.pairing_state,
            last_check: self.last_check,
            last_healthy: self.last_healthy,
            last_pairing_request: self.last_pairing_request,
            cooldown_remaining_secs,
        }
    }
}

/// Read-only health snapshot returned by status queries
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub is_healthy: bool,
    pub consecutive_failures: u32,
    pub pairing_state: PairingState,
    pub last_check: Option<DateTime<Utc>>,
    pub last_healthy: Option<DateTime<Utc>>,
    pub last_pairing_request: Option<DateTime<Utc>>,
    pub cooldown_remaining_secs: u64,
}

const KEY_PAIRING_STATE: &str = "pairing_state";
const KEY_LAST_PAIRING_REQUEST: &str = "last_pairing_request_time";
const KEY_CONSECUTIVE_FAILURES: &str = "consecutive_failures";

/// Best-effort persistence gateway for `SupervisorState`
///
/// Read failures fall back to defaults with a warning; write failures are
/// logged and never roll back the in-memory transition.
#[derive(Clone)]
pub struct StateStore {
    store: Arc<dyn KeyValueStore>,
}

impl StateStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Hydrate state from the store, field by field.
    ///
    /// Missing or unparseable values leave the field at its default; this
    /// never fails.
    pub async fn load(&self) -> SupervisorState {
        let mut state = SupervisorState::default();

        match self.store.get(KEY_PAIRING_STATE).await {
            Ok(Some(raw)) => match PairingState::parse(&raw) {
                Some(parsed) => state.pairing_state = parsed,
                None => warn!("Unrecognized persisted pairing state '{}', using default", raw),
            },
            Ok(None) => {}
            Err(e) => warn!("Failed to read persisted pairing state, using default: {}", e),
        }

        match self.store.get(KEY_CONSECUTIVE_FAILURES).await {
            Ok(Some(raw)) => match raw.parse::<u32>() {
                Ok(count) => state.consecutive_failures = count,
                Err(_) => warn!("Unparseable failure count '{}', using default", raw),
            },
            Ok(None) => {}
            Err(e) => warn!("Failed to read persisted failure count, using default: {}", e),
        }

        match self.store.get(KEY_LAST_PAIRING_REQUEST).await {
            Ok(Some(raw)) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(ts) => state.last_pairing_request = Some(ts.with_timezone(&Utc)),
                Err(_) => warn!("Unparseable pairing timestamp '{}', using default", raw),
            },
            Ok(None) => {}
            Err(e) => warn!("Failed to read persisted pairing timestamp, using default: {}", e),
        }

        state
    }

    /// Write the durable fields back to the store.
    pub async fn save(&self, state: &SupervisorState) {
        if let Err(e) = self
            .store
            .set(KEY_PAIRING_STATE, state.pairing_state.as_str())
            .await
        {
            warn!("Failed to persist pairing state: {}", e);
        }

        if let Err(e) = self
            .store
            .set(
                KEY_CONSECUTIVE_FAILURES,
                &state.consecutive_failures.to_string(),
            )
            .await
        {
            warn!("Failed to persist failure count: {}", e);
        }

        let result = match state.last_pairing_request {
            Some(ts) => self.store.set(KEY_LAST_PAIRING_REQUEST, &ts.to_rfc3339()).await,
            None => self.store.delete(KEY_LAST_PAIRING_REQUEST).await,
        };
        if let Err(e) = result {
            warn!("Failed to persist pairing timestamp: {}", e);
        }
    }
}
