//! Emergency brake guard
//!
//! Outside a lane change any alerting front reading latches the brake. While
//! a lane change runs, and for a short grace period after it, the front
//! sensor sweeps across the neighbouring lanes, so the sensor heading is
//! frozen and the brake needs several consecutive close readings.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::Deserialize;
use util::maths::ang_dist;

use crate::per::SensorReading;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SafetyParams {
    /// Distance at or below which a reading counts during a lane change.
    ///
    /// Units: world units
    pub emergency_dist: f64,

    /// Units: seconds
    pub grace_after_lc_s: f64,

    /// Heading error to the frozen heading which ends the grace period early.
    ///
    /// Units: degrees
    pub heading_deadband_deg: f64,

    /// Consecutive close readings needed to brake during a lane change.
    pub required_trigger_frames: u32,
}

#[derive(Debug, Clone)]
pub struct SafetyGuard {
    params: SafetyParams,

    braked: bool,
    lane_changing: bool,

    /// Units: seconds
    grace_left_s: f64,

    /// Units: radians
    frozen_heading: f64,

    trigger_frames: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SafetyParams {
    fn default() -> Self {
        Self {
            emergency_dist: 2.0,
            grace_after_lc_s: 0.25,
            heading_deadband_deg: 5.0,
            required_trigger_frames: 3,
        }
    }
}

impl SafetyGuard {
    pub fn new(params: SafetyParams) -> Self {
        Self {
            params,
            braked: false,
            lane_changing: false,
            grace_left_s: 0.0,
            frozen_heading: 0.0,
            trigger_frames: 0,
        }
    }

    /// The brake is latched.
    pub fn is_braked(&self) -> bool {
        self.braked
    }

    pub fn is_lane_changing(&self) -> bool {
        self.lane_changing
    }

    /// A lane change or its grace period is in progress.
    pub fn in_transient(&self) -> bool {
        self.lane_changing || self.grace_left_s > 0.0
    }

    /// Freeze the sensor heading at the start of a lane change.
    pub fn on_lane_change_start(&mut self, heading: f64) {
        self.lane_changing = true;
        self.frozen_heading = heading;
        self.trigger_frames = 0;
    }

    /// Start the grace period once a lane change completes.
    pub fn on_lane_change_end(&mut self) {
        if self.lane_changing {
            self.lane_changing = false;
            self.grace_left_s = self.params.grace_after_lc_s;
        }
    }

    /// Drop any lane change state without a grace period, for when the lane
    /// change is cut short by a turn or the brake.
    pub fn abort_lane_change(&mut self) {
        if self.in_transient() {
            debug!("Lane change aborted");
        }
        self.lane_changing = false;
        self.grace_left_s = 0.0;
        self.trigger_frames = 0;
    }

    /// Count down the grace period, ending it early once the vehicle heading
    /// is back within the deadband of the frozen heading.
    pub fn tick(&mut self, dt: f64, vehicle_heading: f64) {
        if self.grace_left_s <= 0.0 {
            return;
        }

        self.grace_left_s -= dt.max(0.0);

        let err = ang_dist(self.frozen_heading, vehicle_heading).abs();
        if self.grace_left_s > 0.0 && err <= self.params.heading_deadband_deg.to_radians() {
            self.grace_left_s = 0.0;
        }
    }

    /// Heading the front sensors should use this frame.
    pub fn sensor_heading(&self, vehicle_heading: f64) -> f64 {
        if self.in_transient() {
            self.frozen_heading
        } else {
            vehicle_heading
        }
    }

    /// Check a front reading, returning `true` if it newly latched the brake.
    pub fn check(&mut self, reading: &SensorReading) -> bool {
        if !reading.triggered {
            self.trigger_frames = 0;
            return false;
        }

        if self.in_transient() {
            if reading.distance <= self.params.emergency_dist {
                self.trigger_frames = self.trigger_frames.saturating_add(1);
            } else {
                self.trigger_frames = 0;
            }

            if self.trigger_frames >= self.params.required_trigger_frames && !self.braked {
                warn!(
                    "Emergency brake during lane change, obstacle at {:.2}",
                    reading.distance
                );
                self.braked = true;
                return true;
            }
        } else if !self.braked {
            warn!("Emergency brake, obstacle at {:.2}", reading.distance);
            self.braked = true;
            return true;
        }

        false
    }

    /// Release the brake and forget any lane change state.
    pub fn reset(&mut self) {
        info!("Emergency brake reset");
        self.braked = false;
        self.lane_changing = false;
        self.grace_left_s = 0.0;
        self.trigger_frames = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reading(distance: f64) -> SensorReading {
        SensorReading {
            triggered: distance <= 5.0,
            distance,
            angle: 0.0,
            label: "",
        }
    }

    #[test]
    fn test_immediate_brake_when_straight() {
        let mut g = SafetyGuard::new(SafetyParams::default());
        assert!(!g.check(&reading(10.0)));
        assert!(g.check(&reading(4.0)));
        assert!(g.is_braked());

        // Latched, not re-triggered
        assert!(!g.check(&reading(4.0)));
        g.reset();
        assert!(!g.is_braked());
    }

    #[test]
    fn test_lane_change_needs_consecutive_frames() {
        let mut g = SafetyGuard::new(SafetyParams::default());
        g.on_lane_change_start(0.3);
        assert_eq!(g.sensor_heading(1.0), 0.3);

        // Alerting but further than the emergency distance
        for _ in 0..10 {
            assert!(!g.check(&reading(4.0)));
        }

        assert!(!g.check(&reading(1.5)));
        assert!(!g.check(&reading(1.5)));
        assert!(!g.check(&reading(6.0)));
        assert!(!g.check(&reading(1.5)));
        assert!(!g.check(&reading(1.5)));
        assert!(g.check(&reading(1.5)));
    }

    #[test]
    fn test_abort_skips_grace() {
        let mut g = SafetyGuard::new(SafetyParams::default());
        g.on_lane_change_start(0.3);
        assert!(!g.check(&reading(1.5)));

        g.abort_lane_change();
        assert!(!g.in_transient());
        assert_eq!(g.sensor_heading(1.2), 1.2);

        // Back to braking on the first alert
        assert!(g.check(&reading(4.0)));
    }

    #[test]
    fn test_grace_period() {
        let mut g = SafetyGuard::new(SafetyParams::default());
        g.on_lane_change_start(0.0);
        g.on_lane_change_end();
        assert!(g.in_transient());

        // Heading off by 10 degrees, grace runs its course
        g.tick(0.1, 10f64.to_radians());
        assert!(g.in_transient());
        g.tick(0.2, 10f64.to_radians());
        assert!(!g.in_transient());
        assert_eq!(g.sensor_heading(1.0), 1.0);

        // Heading within the deadband ends it early
        g.on_lane_change_start(0.0);
        g.on_lane_change_end();
        g.tick(0.01, 2f64.to_radians());
        assert!(!g.in_transient());
    }
}
