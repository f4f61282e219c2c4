//! # Turn decision policies
//!
//! Policies turn front/left/right distances into a steering decision. Both
//! implementations keep internal state between calls so that single noisy
//! samples do not flip the decision.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod sticky;
mod trend;

pub use params::{PolicyKind, StickyPolicyParams, TrendPolicyParams};
pub use sticky::StickyTurnPolicy;
pub use trend::TrendTurnPolicy;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::cmd_exec::TurnDir;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A steering decision policy.
pub trait TurnPolicy {
    /// Decide what to do this frame from the front, left and right distances.
    fn decide(&mut self, d_front: f64, d_left: f64, d_right: f64, dt: f64) -> TurnDecision;

    /// Must be called once, right after a turn maneuver completes, with the
    /// side distances of the new corridor.
    fn on_turn_committed(&mut self, d_left: f64, d_right: f64);

    /// Called when a turn maneuver is started from a decision.
    fn on_turn_started(&mut self) {}
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TurnDecision {
    Straight,
    TurnLeft,
    TurnRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TurnDecision {
    /// Direction of the turn, `None` for straight.
    pub fn turn_dir(&self) -> Option<TurnDir> {
        match self {
            TurnDecision::Straight => None,
            TurnDecision::TurnLeft => Some(TurnDir::Left),
            TurnDecision::TurnRight => Some(TurnDir::Right),
        }
    }

    pub fn from_dir(dir: TurnDir) -> Self {
        match dir {
            TurnDir::Left => TurnDecision::TurnLeft,
            TurnDir::Right => TurnDecision::TurnRight,
        }
    }
}

/// Build the policy selected in the parameters.
pub fn build_policy(
    kind: PolicyKind,
    sticky: &StickyPolicyParams,
    trend: &TrendPolicyParams,
) -> Box<dyn TurnPolicy> {
    match kind {
        PolicyKind::Sticky => Box::new(StickyTurnPolicy::new(sticky.clone())),
        PolicyKind::Trend => Box::new(TrendTurnPolicy::new(trend.clone())),
    }
}
