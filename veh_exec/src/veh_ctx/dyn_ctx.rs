//! Force based vehicle context

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::VehicleContext;
use crate::dyn_model::{DynamicsIntegrator, StepReport, VehicleParams};
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vehicle context whose motion comes from the dynamics integrator.
///
/// `apply` only writes the control bus, the vehicle moves when [`step`] is
/// called.
///
/// [`step`]: DynamicsCtx::step
#[derive(Debug, Clone)]
pub struct DynamicsCtx {
    pose: Pose,
    integrator: DynamicsIntegrator,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DynamicsCtx {
    pub fn new(spawn: Pose, integrator: DynamicsIntegrator) -> Self {
        Self {
            pose: spawn,
            integrator,
        }
    }

    pub fn from_params(spawn: Pose, params: &VehicleParams) -> Self {
        Self::new(spawn, DynamicsIntegrator::from_params(params))
    }

    pub fn integrator(&self) -> &DynamicsIntegrator {
        &self.integrator
    }

    pub fn integrator_mut(&mut self) -> &mut DynamicsIntegrator {
        &mut self.integrator
    }

    /// Run one integrator step of `dt` seconds.
    pub fn step(&mut self, dt: f64) -> StepReport {
        self.integrator.step(dt, &mut self.pose)
    }
}

impl VehicleContext for DynamicsCtx {
    fn x(&self) -> f64 {
        self.pose.x()
    }

    fn y(&self) -> f64 {
        self.pose.y()
    }

    fn heading(&self) -> f64 {
        self.pose.heading()
    }

    fn speed(&self) -> f64 {
        self.pose.speed
    }

    fn set_position(&mut self, x: f64, y: f64) {
        self.pose.set_position(x, y)
    }

    fn set_heading(&mut self, heading_rad: f64) {
        self.pose.set_heading(heading_rad)
    }

    /// Write the control bus: `steer` in radians, `throttle` and `brake` in
    /// [0, 1].
    fn apply(&mut self, steer: f64, throttle: f64, brake: f64) {
        let bus = self.integrator.bus_mut();
        bus.set_steer_deg(steer.to_degrees());
        bus.set_throttle01(throttle);
        bus.set_brake01(brake);
    }

    fn pose(&self) -> Pose {
        self.pose
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_apply_writes_bus_only() {
        let mut ctx = DynamicsCtx::from_params(Pose::default(), &VehicleParams::default());
        ctx.apply(0.1, 2.0, -1.0);

        let bus = ctx.integrator().bus();
        assert!((bus.steer_deg() - 0.1f64.to_degrees()).abs() < 1e-12);
        assert_eq!(bus.throttle01(), 1.0);
        assert_eq!(bus.brake01(), 0.0);
        assert_eq!(ctx.x(), 0.0);

        ctx.apply(0.0, 1.0, 0.0);
        for _ in 0..60 {
            ctx.step(1.0 / 60.0);
        }
        assert!(ctx.x() > 0.0);
        assert!(ctx.speed() > 0.0);
    }
}
