//! Straight line move of a fixed distance

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;

use super::Maneuver;
use crate::veh_ctx::VehicleContext;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Move forward along the current heading by a fixed distance.
///
/// Each update moves `min(remaining, speed * dt)`, so the final position
/// only depends on the total elapsed time and not on how it is split up.
#[derive(Debug, Clone)]
pub struct MoveForward {
    /// Units: world units
    distance: f64,

    /// Units: world units/second
    speed: f64,

    remaining: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MoveForward {
    pub fn new(distance: f64, speed: f64) -> Self {
        Self {
            distance,
            speed,
            remaining: distance,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }
}

impl Maneuver for MoveForward {
    fn on_start(&mut self, _ctx: &mut dyn VehicleContext) {
        self.remaining = self.distance.max(0.0);
        if self.speed <= 0.0 {
            warn!("MoveForward with non-positive speed {}, skipping", self.speed);
            self.remaining = 0.0;
        }
    }

    fn execute(&mut self, dt: f64, ctx: &mut dyn VehicleContext) -> bool {
        if self.remaining <= 0.0 {
            return true;
        }

        let step = self.remaining.min(self.speed * dt.max(0.0));
        ctx.apply(0.0, step, 0.0);
        self.remaining -= step;

        self.remaining <= 0.0
    }

    fn on_end(&mut self, ctx: &mut dyn VehicleContext) {
        ctx.apply(0.0, 0.0, 0.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loc::Pose;
    use crate::veh_ctx::KinematicCtx;

    fn run(steps: usize, dt: f64) -> KinematicCtx {
        let mut ctx = KinematicCtx::new(Pose::new(1.0, 2.0, 0.5));
        let mut cmd = MoveForward::new(3.0, 2.0);
        cmd.on_start(&mut ctx);
        for _ in 0..steps {
            if cmd.execute(dt, &mut ctx) {
                break;
            }
        }
        ctx
    }

    #[test]
    fn test_granularity_independent() {
        // 1 second in 10, 100 and 1000 steps
        let a = run(10, 0.1);
        let b = run(100, 0.01);
        let c = run(1000, 0.001);

        assert!((a.x() - b.x()).abs() < 1e-9 && (a.y() - b.y()).abs() < 1e-9);
        assert!((a.x() - c.x()).abs() < 1e-9 && (a.y() - c.y()).abs() < 1e-9);

        let travelled = ((a.x() - 1.0).powi(2) + (a.y() - 2.0).powi(2)).sqrt();
        assert!((travelled - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_stops_at_distance() {
        let ctx = run(1000, 0.1);
        let travelled = ((ctx.x() - 1.0).powi(2) + (ctx.y() - 2.0).powi(2)).sqrt();
        assert!((travelled - 3.0).abs() < 1e-9);
    }
}
