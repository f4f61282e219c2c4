//! Lateral trend policy
//!
//! Projects the side distances onto the lateral axis and smooths their
//! difference with an EMA. While the front is clear it goes straight, else a
//! large smoothed difference or a steep change in it triggers a turn, after
//! which further turns are locked out for a while.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;

use super::{TrendPolicyParams, TurnDecision, TurnPolicy};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TrendTurnPolicy {
    params: TrendPolicyParams,

    /// Projection of the side rays onto the lateral axis.
    side_cos: f64,

    /// EMA of `d_right - d_left`, positive when the right is clearer.
    ema_delta: f64,

    /// Units: seconds
    lock_left_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrendTurnPolicy {
    pub fn new(params: TrendPolicyParams) -> Self {
        Self {
            side_cos: params.side_angle_deg.to_radians().cos(),
            params,
            ema_delta: 0.0,
            lock_left_s: 0.0,
        }
    }

    pub fn ema_delta(&self) -> f64 {
        self.ema_delta
    }

    pub fn is_locked(&self) -> bool {
        self.lock_left_s > 0.0
    }

    fn update_ema(&mut self, delta: f64) {
        let a = self.params.ema_alpha;
        self.ema_delta = a * delta + (1.0 - a) * self.ema_delta;
    }

    fn lock(&mut self, time_s: f64) {
        self.lock_left_s = time_s.max(0.0);
    }
}

impl TurnPolicy for TrendTurnPolicy {
    fn decide(&mut self, d_front: f64, d_left: f64, d_right: f64, dt: f64) -> TurnDecision {
        if self.lock_left_s > 0.0 {
            self.lock_left_s = (self.lock_left_s - dt.max(0.0)).max(0.0);
        }

        let delta = (d_right - d_left) * self.side_cos;

        // Clear ahead, keep tracking the trend but go straight
        if d_front >= self.params.straight_min && !self.is_locked() {
            self.update_ema(delta);
            return TurnDecision::Straight;
        }

        let prev = self.ema_delta;
        self.update_ema(delta);
        let slope = self.ema_delta - prev;

        if self.is_locked() {
            return TurnDecision::Straight;
        }

        let thresh = self.params.delta_thresh + self.params.hyst;
        let decision = if self.ema_delta > thresh || slope > self.params.trend_thresh {
            TurnDecision::TurnRight
        } else if self.ema_delta < -thresh || slope < -self.params.trend_thresh {
            TurnDecision::TurnLeft
        } else {
            TurnDecision::Straight
        };

        if decision != TurnDecision::Straight {
            debug!(
                "Trend policy triggered {:?} (ema {:.3}, slope {:.3})",
                decision, self.ema_delta, slope
            );
            self.lock(self.params.lock_time_s);
        }

        decision
    }

    fn on_turn_committed(&mut self, _d_left: f64, _d_right: f64) {
        self.lock(self.params.finish_lock_s);
    }

    fn on_turn_started(&mut self) {
        self.lock(self.params.lock_time_s);
    }
}
