//! Chat abuse throttle.
//!
//! A sliding-window rate limiter with escalating penalties, evaluated once
//! per attempted outgoing chat send. Pure state machine: the caller supplies
//! "now" and performs whatever the returned decision implies (send, show a
//! warning, disable the input). Independent of the socket entirely.
//!
//! Rules, in evaluation order:
//! 1. an active mute rejects immediately; an expired mute clears all state
//!    and evaluation continues as if the sender had no history
//! 2. more than [`MAX_MESSAGES_PER_WINDOW`] sends inside the sliding
//!    [`WINDOW_MS`] window rejects with a transient warning, and starts (or
//!    continues) tracking a violation streak
//! 3. a violation streak sustained longer than [`SPAM_ESCALATION_MS`]
//!    escalates to a [`MUTE_DURATION_MS`] mute
//! 4. an allowed send while tracking a streak forgives the streak once the
//!    window has drained below [`CALM_THRESHOLD`] sends

/// Maximum sends allowed inside the sliding window.
pub const MAX_MESSAGES_PER_WINDOW: usize = 8;
/// Sliding window length.
pub const WINDOW_MS: u64 = 10_000;
/// How long a violation streak must last before it escalates to a mute.
pub const SPAM_ESCALATION_MS: u64 = 120_000;
/// Mute length once escalated.
pub const MUTE_DURATION_MS: u64 = 300_000;
/// Recent-send count under which a tracked violation streak is forgiven.
pub const CALM_THRESHOLD: usize = 5;
/// How long the "slow down" warning stays up.
pub const WARNING_DURATION_MS: u64 = 3_000;

/// Outcome of evaluating one attempted send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendDecision {
    /// Send it.
    Allowed,
    /// Too many recent sends; drop this one and show a transient warning
    /// until `warn_until_ms`.
    RateLimited { warn_until_ms: u64 },
    /// Sender is muted until `until_ms`; drop silently (the UI reflects the
    /// mute by disabling input, not by re-warning on every keystroke).
    Muted { until_ms: u64 },
}

/// Per-view throttle state.
#[derive(Debug, Clone, Default)]
pub struct ChatThrottle {
    /// Timestamps of allowed sends, pruned to the sliding window.
    recent_send_times: Vec<u64>,
    /// When the current violation streak began, if one is being tracked.
    spam_window_started_at: Option<u64>,
    muted_until: Option<u64>,
}

impl ChatThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one attempted send at `now_ms`.
    pub fn evaluate(&mut self, now_ms: u64) -> SendDecision {
        if let Some(until) = self.muted_until {
            if now_ms < until {
                return SendDecision::Muted { until_ms: until };
            }
            // Mute served; the sender starts over with a clean slate.
            self.reset();
        }

        let recent = self.recent_count(now_ms);

        if recent >= MAX_MESSAGES_PER_WINDOW {
            match self.spam_window_started_at {
                None => self.spam_window_started_at = Some(now_ms),
                Some(started) if now_ms.saturating_sub(started) > SPAM_ESCALATION_MS => {
                    let until = now_ms + MUTE_DURATION_MS;
                    self.muted_until = Some(until);
                    self.spam_window_started_at = None;
                    self.recent_send_times.clear();
                    return SendDecision::Muted { until_ms: until };
                }
                Some(_) => {}
            }
            return SendDecision::RateLimited {
                warn_until_ms: now_ms + WARNING_DURATION_MS,
            };
        }

        // Forgiveness: the sender has slowed down enough that the streak no
        // longer counts toward escalation.
        if self.spam_window_started_at.is_some() && recent < CALM_THRESHOLD {
            self.spam_window_started_at = None;
        }

        self.recent_send_times
            .retain(|&t| now_ms.saturating_sub(t) < WINDOW_MS);
        self.recent_send_times.push(now_ms);
        SendDecision::Allowed
    }

    /// Whether the sender is muted at `now_ms`.
    pub fn is_muted(&self, now_ms: u64) -> bool {
        self.muted_until.is_some_and(|until| now_ms < until)
    }

    pub fn muted_until(&self) -> Option<u64> {
        self.muted_until
    }

    fn recent_count(&self, now_ms: u64) -> usize {
        self.recent_send_times
            .iter()
            .filter(|&&t| now_ms.saturating_sub(t) < WINDOW_MS)
            .count()
    }

    fn reset(&mut self) {
        self.muted_until = None;
        self.spam_window_started_at = None;
        self.recent_send_times.clear();
    }
}
