//! Reconnection supervisor.
//!
//! Watches for closes of the current connection and decides whether to try
//! again. Attempt N waits `base_delay * N`; after `max_attempts` failed
//! attempts the supervisor stops for good until [`ReconnectSupervisor::reset`]
//! (a fresh room create/join).
//!
//! ```text
//!           on_close (attempts < max)           backoff elapsed
//! ┌──────┐ ─────────────────────────> ┌────────────┐ ──────────> ┌────────────┐
//! │ Idle │                            │ BackingOff │             │ Attempting │
//! └──────┘ <───────────────────────── └────────────┘             └────────────┘
//!     ▲            on_open                                   │        │
//!     └──────────────────────────────────────────────────────┘        │
//!                                      on_close (attempts == max)     ▼
//!                                                             ┌───────────┐
//!                                                             │ Exhausted │
//!                                                             └───────────┘
//! ```
//!
//! Backoff timers are not cancelled. Each carries a [`BackoffToken`] and only
//! the token of the pending backoff is honored when it fires.

use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default delay unit between attempts.
pub const DEFAULT_RECONNECT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Default number of attempts before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Identifies one scheduled backoff timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("backoff#{_0}")]
pub struct BackoffToken(u64);

/// Delay schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay unit; attempt N waits N units.
    pub base_delay: Duration,
    /// Attempts before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_RECONNECT_BASE_DELAY,
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Connected, or never connected.
    Idle,
    /// Waiting out the delay before `attempt`.
    BackingOff {
        /// Attempt number being waited for.
        attempt: u32,
        /// Token of the pending timer.
        token: BackoffToken,
    },
    /// Connection `attempt` is in flight.
    Attempting {
        /// Attempt number in flight.
        attempt: u32,
    },
    /// Gave up; no further automatic attempts.
    Exhausted,
}

/// What to do about a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Schedule a reconnect after `delay`.
    Retry {
        /// Attempt number (1-based).
        attempt: u32,
        /// Configured maximum.
        max_attempts: u32,
        /// Time to wait.
        delay: Duration,
        /// Token to report back when the delay elapses.
        token: BackoffToken,
    },
    /// All attempts used up. Returned once.
    GiveUp {
        /// Configured maximum.
        max_attempts: u32,
    },
    /// Nothing to do.
    Ignore,
}

/// Close-triggered reconnection with linear backoff.
#[derive(Debug, Clone)]
pub struct ReconnectSupervisor {
    policy: ReconnectPolicy,
    attempts: u32,
    state: SupervisorState,
    next_token: u64,
}

impl Default for ReconnectSupervisor {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

impl ReconnectSupervisor {
    /// Creates an idle supervisor.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            state: SupervisorState::Idle,
            next_token: 0,
        }
    }

    /// The delay schedule.
    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// Attempts made since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Current state.
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Whether the supervisor has given up.
    pub fn is_exhausted(&self) -> bool {
        self.state == SupervisorState::Exhausted
    }

    /// The current connection closed.
    #[instrument(skip(self), fields(attempts = self.attempts, max = self.policy.max_attempts))]
    pub fn on_close(&mut self) -> ReconnectDecision {
        match self.state {
            SupervisorState::Exhausted => {
                debug!("Already gave up, ignoring close");
                ReconnectDecision::Ignore
            }
            SupervisorState::BackingOff { .. } => {
                debug!("Close while backing off, ignoring");
                ReconnectDecision::Ignore
            }
            SupervisorState::Idle | SupervisorState::Attempting { .. } => {
                if self.attempts < self.policy.max_attempts {
                    self.attempts += 1;
                    self.next_token += 1;
                    let token = BackoffToken(self.next_token);
                    let delay = self.policy.delay_for(self.attempts);
                    self.state = SupervisorState::BackingOff {
                        attempt: self.attempts,
                        token,
                    };
                    info!(attempt = self.attempts, ?delay, "Scheduling reconnect");
                    ReconnectDecision::Retry {
                        attempt: self.attempts,
                        max_attempts: self.policy.max_attempts,
                        delay,
                        token,
                    }
                } else {
                    self.state = SupervisorState::Exhausted;
                    warn!("Reconnect attempts exhausted");
                    ReconnectDecision::GiveUp {
                        max_attempts: self.policy.max_attempts,
                    }
                }
            }
        }
    }

    /// A backoff timer fired.
    ///
    /// Returns `true` when `token` is the pending backoff; the caller should
    /// then open a new connection.
    #[instrument(skip(self))]
    pub fn on_backoff_elapsed(&mut self, token: BackoffToken) -> bool {
        match self.state {
            SupervisorState::BackingOff {
                attempt,
                token: pending,
            } if pending == token => {
                self.state = SupervisorState::Attempting { attempt };
                info!(attempt, "Reconnecting");
                true
            }
            _ => {
                debug!(%token, "Ignoring stale backoff timer");
                false
            }
        }
    }

    /// A connection opened successfully.
    #[instrument(skip(self))]
    pub fn on_open(&mut self) {
        if self.attempts > 0 {
            info!(attempts = self.attempts, "Reconnected");
        }
        self.attempts = 0;
        self.state = SupervisorState::Idle;
    }

    /// Forgets all history and invalidates any pending backoff.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.state = SupervisorState::Idle;
        // Outstanding timers hold older tokens and will no longer match.
        self.next_token += 1;
    }
}
