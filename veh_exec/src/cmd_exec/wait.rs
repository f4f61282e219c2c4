//! Hold still for a fixed time

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::Maneuver;
use crate::veh_ctx::VehicleContext;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Apply zero control for a fixed duration.
#[derive(Debug, Clone)]
pub struct Wait {
    /// Units: seconds
    duration_s: f64,

    /// Units: seconds
    elapsed_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Wait {
    pub fn new(duration_s: f64) -> Self {
        Self {
            duration_s,
            elapsed_s: 0.0,
        }
    }
}

impl Maneuver for Wait {
    fn on_start(&mut self, _ctx: &mut dyn VehicleContext) {
        self.elapsed_s = 0.0;
    }

    fn execute(&mut self, dt: f64, ctx: &mut dyn VehicleContext) -> bool {
        self.elapsed_s += dt.max(0.0);
        ctx.apply(0.0, 0.0, 0.0);
        self.elapsed_s >= self.duration_s
    }

    fn on_end(&mut self, ctx: &mut dyn VehicleContext) {
        ctx.apply(0.0, 0.0, 0.0);
    }
}
