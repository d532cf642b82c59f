use serde::{Deserialize, Serialize};

/// Polling urgency tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollMode {
    Fast,
    Slow,
}

impl PollMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PollMode::Fast => "fast",
            PollMode::Slow => "slow",
        }
    }
}

/// Quiet-confirmation state machine.
///
/// `Ongoing` (streak 0) -> `Verifying` (streak 1) -> `Dormant` (streak 2).
/// Only `Dormant` polls in slow mode, so one empty poll never parks a
/// tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollPhase {
    Ongoing,
    Verifying,
    Dormant,
}

impl PollPhase {
    /// Phase after observing fresh data
    pub fn next(self, pending_today: bool) -> PollPhase {
        if pending_today {
            return PollPhase::Ongoing;
        }
        match self {
            PollPhase::Ongoing => PollPhase::Verifying,
            PollPhase::Verifying | PollPhase::Dormant => PollPhase::Dormant,
        }
    }

    pub fn streak(self) -> u8 {
        match self {
            PollPhase::Ongoing => 0,
            PollPhase::Verifying => 1,
            PollPhase::Dormant => 2,
        }
    }

    pub fn from_streak(streak: u8) -> PollPhase {
        match streak {
            0 => PollPhase::Ongoing,
            1 => PollPhase::Verifying,
            _ => PollPhase::Dormant,
        }
    }

    pub fn mode(self) -> PollMode {
        if self.streak() >= 2 {
            PollMode::Slow
        } else {
            PollMode::Fast
        }
    }
}

/// Persisted per-tournament polling state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    /// Epoch milliseconds of the last successful fetch; 0 = never
    pub last_success_ms: i64,
    pub phase: PollPhase,
}

impl PollState {
    pub fn new(last_success_ms: i64, phase: PollPhase) -> Self {
        Self {
            last_success_ms,
            phase,
        }
    }

    pub fn never_polled() -> Self {
        Self::new(0, PollPhase::Ongoing)
    }

    pub fn mode(&self) -> PollMode {
        self.phase.mode()
    }

    pub fn streak(&self) -> u8 {
        self.phase.streak()
    }

    pub fn has_succeeded(&self) -> bool {
        self.last_success_ms > 0
    }

    pub fn with_success_at(self, millis: i64) -> Self {
        Self {
            last_success_ms: millis,
            ..self
        }
    }

    /// Next state after an aggregation pass. Only refreshed tournaments move.
    pub fn advance(self, refreshed: bool, pending_today: bool) -> Self {
        if !refreshed {
            return self;
        }
        Self {
            phase: self.phase.next(pending_today),
            ..self
        }
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::never_polled()
    }
}
