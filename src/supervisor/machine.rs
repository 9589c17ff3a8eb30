//! Pairing decision logic
//!
//! Pure function over (state, liveness, clock, config). No I/O and no clock
//! reads happen here; the scheduler supplies `now` and acts on the returned
//! decision. Liveness always wins: a healthy read resets to idle from any
//! state, overriding cooldown or pending-pairing bookkeeping.

use crate::config::SupervisorConfig;
use crate::supervisor::state::{PairingState, SupervisorState};
use chrono::{DateTime, Utc};

/// What the scheduler should do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Nothing beyond persisting the new state
    None,
    /// Start the recovery orchestration
    TriggerRecovery,
    /// Deliberately do nothing, with a reason worth surfacing
    Skip(SkipReason),
}

/// Why a tick declined to act on an unhealthy connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A pairing code is out; waiting for the operator to enter it
    WaitingForUser,
    /// Last attempt failed recently; respecting the cooldown window
    Cooldown,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::WaitingForUser => "waiting_for_user",
            SkipReason::Cooldown => "cooldown",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a single decision
#[derive(Debug, Clone)]
pub struct Decision {
    pub state: SupervisorState,
    pub action: TickAction,
}

/// Compute the next state and action for one health check.
pub fn decide(
    state: &SupervisorState,
    is_live: bool,
    now: DateTime<Utc>,
    config: &SupervisorConfig,
) -> Decision {
    let mut next = state.clone();
    next.is_healthy = is_live;
    next.last_check = Some(now);

    if is_live {
        next.pairing_state = PairingState::Idle;
        next.consecutive_failures = 0;
        next.last_pairing_request = None;
        next.last_healthy = Some(now);
        return Decision {
            state: next,
            action: TickAction::None,
        };
    }

    match state.pairing_state {
        PairingState::Idle => {
            next.consecutive_failures = state.consecutive_failures.saturating_add(1);
            if next.consecutive_failures >= config.failure_threshold {
                next.pairing_state = PairingState::PairingRequested;
                next.last_pairing_request = Some(now);
                Decision {
                    state: next,
                    action: TickAction::TriggerRecovery,
                }
            } else {
                Decision {
                    state: next,
                    action: TickAction::None,
                }
            }
        }
        PairingState::PairingRequested => {
            if window_elapsed(state.last_pairing_request, now, config.pairing_wait_window()) {
                // Pairing wait exhausted; back to idle so the next tick can retry.
                // Failures are preserved, only a healthy read resets them.
                next.pairing_state = PairingState::Idle;
                next.last_pairing_request = None;
                Decision {
                    state: next,
                    action: TickAction::None,
                }
            } else {
                Decision {
                    state: next,
                    action: TickAction::Skip(SkipReason::WaitingForUser),
                }
            }
        }
        PairingState::Cooldown => {
            if window_elapsed(state.last_pairing_request, now, config.cooldown_window()) {
                next.pairing_state = PairingState::Idle;
                next.last_pairing_request = None;
                Decision {
                    state: next,
                    action: TickAction::None,
                }
            } else {
                Decision {
                    state: next,
                    action: TickAction::Skip(SkipReason::Cooldown),
                }
            }
        }
    }
}

// A missing anchor timestamp counts as elapsed, so the state cannot wedge.
fn window_elapsed(
    since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: chrono::Duration,
) -> bool {
    match since {
        Some(since) => now.signed_duration_since(since) > window,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SupervisorConfig {
        SupervisorConfig {
            failure_threshold: 2,
            cooldown_secs: 4 * 3600,
            max_pairing_wait_secs: 8 * 3600,
            ..Default::default()
        }
    }

    fn unhealthy_for(state: PairingState, failures: u32, request_age_secs: i64) -> SupervisorState {
        SupervisorState {
            pairing_state: state,
            consecutive_failures: failures,
            last_pairing_request: Some(Utc::now() - chrono::Duration::seconds(request_age_secs)),
            ..Default::default()
        }
    }

    #[test]
    fn test_healthy_idle_resets_failures() {
        let state = SupervisorState {
            consecutive_failures: 1,
            ..Default::default()
        };
        let decision = decide(&state, true, Utc::now(), &config());

        assert_eq!(decision.state.pairing_state, PairingState::Idle);
        assert_eq!(decision.state.consecutive_failures, 0);
        assert!(decision.state.is_healthy);
        assert!(decision.state.last_healthy.is_some());
        assert_eq!(decision.action, TickAction::None);
    }

    #[test]
    fn test_unhealthy_below_threshold_counts_up() {
        let state = SupervisorState::default();
        let decision = decide(&state, false, Utc::now(), &config());

        assert_eq!(decision.state.pairing_state, PairingState::Idle);
        assert_eq!(decision.state.consecutive_failures, 1);
        assert_eq!(decision.action, TickAction::None);
    }

    #[test]
    fn test_unhealthy_at_threshold_triggers_recovery() {
        let state = SupervisorState {
            consecutive_failures: 1,
            ..Default::default()
        };
        let now = Utc::now();
        let decision = decide(&state, false, now, &config());

        assert_eq!(decision.state.pairing_state, PairingState::PairingRequested);
        assert_eq!(decision.state.consecutive_failures, 2);
        assert_eq!(decision.state.last_pairing_request, Some(now));
        assert_eq!(decision.action, TickAction::TriggerRecovery);
    }

    #[test]
    fn test_threshold_one_triggers_on_first_failure() {
        let config = SupervisorConfig {
            failure_threshold: 1,
            ..config()
        };
        let decision = decide(&SupervisorState::default(), false, Utc::now(), &config);
        assert_eq!(decision.action, TickAction::TriggerRecovery);
    }

    #[test]
    fn test_liveness_wins_over_pending_pairing() {
        let state = unhealthy_for(PairingState::PairingRequested, 2, 60);
        let decision = decide(&state, true, Utc::now(), &config());

        assert_eq!(decision.state.pairing_state, PairingState::Idle);
        assert_eq!(decision.state.consecutive_failures, 0);
        assert!(decision.state.last_pairing_request.is_none());
        assert_eq!(decision.action, TickAction::None);
    }

    #[test]
    fn test_liveness_wins_over_cooldown() {
        let state = unhealthy_for(PairingState::Cooldown, 2, 60);
        let decision = decide(&state, true, Utc::now(), &config());

        assert_eq!(decision.state.pairing_state, PairingState::Idle);
        assert_eq!(decision.action, TickAction::None);
    }

    #[test]
    fn test_pending_pairing_skips_without_counting() {
        let state = unhealthy_for(PairingState::PairingRequested, 2, 60);
        let decision = decide(&state, false, Utc::now(), &config());

        assert_eq!(decision.state.pairing_state, PairingState::PairingRequested);
        assert_eq!(decision.state.consecutive_failures, 2);
        assert_eq!(
            decision.action,
            TickAction::Skip(SkipReason::WaitingForUser)
        );
    }

    #[test]
    fn test_pairing_wait_timeout_returns_to_idle() {
        let state = unhealthy_for(PairingState::PairingRequested, 2, 9 * 3600);
        let decision = decide(&state, false, Utc::now(), &config());

        assert_eq!(decision.state.pairing_state, PairingState::Idle);
        assert!(decision.state.last_pairing_request.is_none());
        // Failures are kept so the next unhealthy tick can re-trigger.
        assert_eq!(decision.state.consecutive_failures, 2);
        assert_eq!(decision.action, TickAction::None);
    }

    #[test]
    fn test_cooldown_skips_until_elapsed() {
        let state = unhealthy_for(PairingState::Cooldown, 2, 60);
        let decision = decide(&state, false, Utc::now(), &config());

        assert_eq!(decision.state.pairing_state, PairingState::Cooldown);
        assert_eq!(decision.action, TickAction::Skip(SkipReason::Cooldown));
    }

    #[test]
    fn test_cooldown_elapsed_returns_to_idle() {
        let state = unhealthy_for(PairingState::Cooldown, 2, 5 * 3600);
        let decision = decide(&state, false, Utc::now(), &config());

        assert_eq!(decision.state.pairing_state, PairingState::Idle);
        assert!(decision.state.last_pairing_request.is_none());
        assert_eq!(decision.action, TickAction::None);
    }

    #[test]
    fn test_missing_anchor_timestamp_unwedges() {
        let state = SupervisorState {
            pairing_state: PairingState::Cooldown,
            consecutive_failures: 2,
            last_pairing_request: None,
            ..Default::default()
        };
        let decision = decide(&state, false, Utc::now(), &config());
        assert_eq!(decision.state.pairing_state, PairingState::Idle);
    }

    #[test]
    fn test_every_tick_stamps_last_check() {
        let now = Utc::now();
        let decision = decide(&SupervisorState::default(), false, now, &config());
        assert_eq!(decision.state.last_check, Some(now));
        assert!(!decision.state.is_healthy);
    }
}
