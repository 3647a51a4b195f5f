//! Collision and reconnection classification.
//!
//! Two superficially similar anomalies need opposite treatment:
//!
//! - a tab that reloads mid-game reconnects under its old session id. The
//!   view mounts with no navigation config but finds a persisted room
//!   footprint, and the first snapshot says the game is running. That is a
//!   *reconnect*: show a short "restoring session" affordance, then carry on.
//! - the server reports the same session id already live in the room (another
//!   tab or device). That is a *collision*: no automatic resolution is
//!   correct, a human chooses to exit or stay.
//!
//! The settle delay exists purely so the UI can present the restoring
//! affordance instead of flashing game content instantaneously.

use geoclash_protocol::GameStatus;

/// How long the "restoring session" affordance stays up.
pub const RECONNECT_SETTLE_MS: u64 = 500;

/// Classification state for the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryState {
    Normal,
    /// Restoring a prior session; exits back to Normal at `until_ms`.
    Reconnecting { until_ms: u64 },
    /// A duplicate session was reported; waiting on a human decision.
    CollisionPending { message: String },
}

/// State machine deciding between reconnect and collision handling.
#[derive(Debug, Clone)]
pub struct RecoveryDetector {
    state: RecoveryState,
    /// True when the view mounted with no explicit config but found a
    /// persisted room footprint (the reload signature).
    resumed_from_footprint: bool,
    /// The reconnect affordance is shown at most once per mount.
    settled: bool,
}

impl RecoveryDetector {
    pub fn new(resumed_from_footprint: bool) -> Self {
        Self {
            state: RecoveryState::Normal,
            resumed_from_footprint,
            settled: false,
        }
    }

    pub fn state(&self) -> &RecoveryState {
        &self.state
    }

    /// Feed the status of a freshly merged snapshot.
    ///
    /// Enters `Reconnecting` only for the reload signature combined with an
    /// in-progress game; a fresh mount (explicit navigation) never does.
    pub fn on_snapshot(&mut self, status: GameStatus, now_ms: u64) {
        if self.settled
            || !self.resumed_from_footprint
            || status != GameStatus::InProgress
            || self.state != RecoveryState::Normal
        {
            return;
        }
        self.state = RecoveryState::Reconnecting {
            until_ms: now_ms + RECONNECT_SETTLE_MS,
        };
    }

    /// Advance time-based transitions. Returns true if the state changed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if let RecoveryState::Reconnecting { until_ms } = self.state {
            if now_ms >= until_ms {
                self.state = RecoveryState::Normal;
                self.settled = true;
                return true;
            }
        }
        false
    }

    /// Deadline of the pending settle timer, if one is running.
    pub fn settle_deadline(&self) -> Option<u64> {
        match self.state {
            RecoveryState::Reconnecting { until_ms } => Some(until_ms),
            _ => None,
        }
    }

    /// An explicit `session_collision` notice arrived. Enters
    /// `CollisionPending` regardless of snapshot status or current state.
    pub fn on_collision(&mut self, message: String) {
        self.state = RecoveryState::CollisionPending { message };
    }

    /// Human chose to stay: dismiss the notice, this tab keeps its claim.
    pub fn resolve_stay(&mut self) {
        if matches!(self.state, RecoveryState::CollisionPending { .. }) {
            self.state = RecoveryState::Normal;
        }
    }

    /// Human chose to exit: the caller clears persisted room/session state
    /// and navigates away; the detector just returns to Normal.
    pub fn resolve_exit(&mut self) {
        if matches!(self.state, RecoveryState::CollisionPending { .. }) {
            self.state = RecoveryState::Normal;
        }
    }
}
