//! Baseline ratio policy with hysteresis
//!
//! After each turn the ratio `d_left / (d_left + d_right)` of the new corridor
//! is stored as the baseline. A new turn is only decided once the ratio has
//! drifted past the upper band, to the same side, for `k_stable` calls in a
//! row.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;

use super::{StickyPolicyParams, TurnDecision, TurnPolicy};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StickyTurnPolicy {
    params: StickyPolicyParams,

    /// Ratio locked in after the last turn, `None` until first set.
    baseline: Option<f64>,

    last_ratio: Option<f64>,

    /// Consecutive calls deviating to the same side.
    drift_count: u32,

    /// Side of the current drift, -1 below the baseline and +1 above, 0 for
    /// none.
    drift_sign: i8,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StickyTurnPolicy {
    pub fn new(params: StickyPolicyParams) -> Self {
        Self {
            params,
            baseline: None,
            last_ratio: None,
            drift_count: 0,
            drift_sign: 0,
        }
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn last_ratio(&self) -> Option<f64> {
        self.last_ratio
    }

    pub fn drift_count(&self) -> u32 {
        self.drift_count
    }

    /// Set the baseline if it has never been set.
    pub fn maybe_init_baseline(&mut self, d_left: f64, d_right: f64) {
        if self.baseline.is_none() {
            self.on_turn_committed(d_left, d_right);
        }
    }

    fn reset_drift(&mut self) {
        self.drift_count = 0;
        self.drift_sign = 0;
    }

    fn track_drift(&mut self, sign: i8) {
        if self.drift_sign == sign {
            self.drift_count = self.drift_count.saturating_add(1);
        } else {
            self.drift_sign = sign;
            self.drift_count = 1;
        }
    }

    fn drift_decision(sign: i8) -> TurnDecision {
        if sign < 0 {
            TurnDecision::TurnLeft
        } else {
            TurnDecision::TurnRight
        }
    }
}

impl TurnPolicy for StickyTurnPolicy {
    fn decide(&mut self, d_front: f64, d_left: f64, d_right: f64, _dt: f64) -> TurnDecision {
        self.maybe_init_baseline(d_left, d_right);

        // Too close ahead, turn toward the clearer side at once
        if d_front <= self.params.front_hard {
            return if d_left >= d_right {
                TurnDecision::TurnLeft
            } else {
                TurnDecision::TurnRight
            };
        }

        let (ratio, baseline) = match (ratio(d_left, d_right), self.baseline) {
            (Some(r), Some(b)) => (r, b),
            _ => return TurnDecision::Straight,
        };

        let diff = ratio - baseline;
        let sign = if diff < 0.0 { -1 } else { 1 };
        self.last_ratio = Some(ratio);

        if d_front >= self.params.front_safe {
            if diff.abs() <= self.params.band_low {
                self.reset_drift();
                return TurnDecision::Straight;
            }

            self.track_drift(sign);

            if diff.abs() >= self.params.band_high && self.drift_count >= self.params.k_stable {
                return Self::drift_decision(sign);
            }

            return TurnDecision::Straight;
        }

        // Between the hard and safe distances only a sustained deviation past
        // the upper band turns
        if diff.abs() >= self.params.band_high {
            self.track_drift(sign);
            if self.drift_count >= self.params.k_stable {
                return Self::drift_decision(sign);
            }
        } else {
            self.reset_drift();
        }

        TurnDecision::Straight
    }

    fn on_turn_committed(&mut self, d_left: f64, d_right: f64) {
        if let Some(r) = ratio(d_left, d_right) {
            self.baseline = Some(r);
            self.last_ratio = Some(r);
            self.reset_drift();
            debug!("Sticky policy baseline set to {:.3}", r);
        }
    }
}

/// Left share of the side clearance, `None` if both sides are blocked.
fn ratio(d_left: f64, d_right: f64) -> Option<f64> {
    let sum = d_left + d_right;
    if sum <= 1e-6 {
        None
    } else {
        Some(d_left / sum)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    fn policy() -> StickyTurnPolicy {
        let mut p = StickyTurnPolicy::new(StickyPolicyParams::default());
        p.on_turn_committed(5.0, 5.0);
        assert_eq!(p.baseline(), Some(0.5));
        p
    }

    /// Side distances summing to 10 with the given ratio.
    fn sides(ratio: f64) -> (f64, f64) {
        (10.0 * ratio, 10.0 * (1.0 - ratio))
    }

    #[test]
    fn test_noise_within_band_never_turns() {
        let mut p = policy();
        let band = StickyPolicyParams::default().band_low;

        for i in 0..500 {
            let offset = if i % 2 == 0 { 0.99 * band } else { -0.99 * band };
            let (l, r) = sides(0.5 + offset * ((i % 7) as f64 / 6.0));
            assert_eq!(p.decide(10.0, l, r, DT), TurnDecision::Straight);
        }
    }

    #[test]
    fn test_turns_on_kth_frame() {
        let params = StickyPolicyParams::default();
        let mut p = policy();
        let (l, r) = sides(0.5 + params.band_high + 0.01);

        for _ in 1..params.k_stable {
            assert_eq!(p.decide(10.0, l, r, DT), TurnDecision::Straight);
        }
        assert_eq!(p.decide(10.0, l, r, DT), TurnDecision::TurnRight);

        let mut p = policy();
        let (l, r) = sides(0.5 - params.band_high - 0.01);
        for _ in 1..params.k_stable {
            assert_eq!(p.decide(10.0, l, r, DT), TurnDecision::Straight);
        }
        assert_eq!(p.decide(10.0, l, r, DT), TurnDecision::TurnLeft);
    }

    #[test]
    fn test_side_switch_restarts_count() {
        let params = StickyPolicyParams::default();
        let mut p = policy();
        let high = sides(0.5 + params.band_high + 0.01);
        let low = sides(0.5 - params.band_high - 0.01);

        for _ in 1..params.k_stable {
            p.decide(10.0, high.0, high.1, DT);
        }
        assert_eq!(p.decide(10.0, low.0, low.1, DT), TurnDecision::Straight);
        assert_eq!(p.drift_count(), 1);
    }

    #[test]
    fn test_front_hard_override() {
        let mut p = policy();
        assert_eq!(p.decide(0.5, 2.0, 8.0, DT), TurnDecision::TurnRight);
        assert_eq!(p.decide(1.0, 8.0, 2.0, DT), TurnDecision::TurnLeft);
    }

    #[test]
    fn test_baseline_lazy_init_and_degenerate() {
        let mut p = StickyTurnPolicy::new(StickyPolicyParams::default());
        assert_eq!(p.decide(10.0, 0.0, 0.0, DT), TurnDecision::Straight);
        assert_eq!(p.baseline(), None);

        assert_eq!(p.decide(10.0, 3.0, 1.0, DT), TurnDecision::Straight);
        assert_eq!(p.baseline(), Some(0.75));
    }
}
