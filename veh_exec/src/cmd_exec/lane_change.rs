//! Lane change along a cubic Bezier curve

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;

use super::{Maneuver, TurnDir};
use crate::veh_ctx::VehicleContext;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lane change to an adjacent lane.
///
/// The path is a cubic Bezier whose inner control points sit a third of the
/// length from each end along the initial heading, so the tangent at both
/// ends is parallel to the original direction of travel.
#[derive(Debug, Clone)]
pub struct LaneChange {
    dir: TurnDir,

    /// Lateral offset of the target lane.
    ///
    /// Units: world units
    lane_width: f64,

    /// Forward distance covered during the change.
    ///
    /// Units: world units
    length: f64,

    /// Units: seconds
    duration_s: f64,

    /// Control points, set in `on_start`.
    ctrl: Option<[Vector2<f64>; 4]>,

    /// Curve parameter in [0, 1].
    t: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LaneChange {
    pub fn new(dir: TurnDir, lane_width: f64, length: f64, duration_s: f64) -> Self {
        Self {
            dir,
            lane_width,
            length,
            duration_s,
            ctrl: None,
            t: 0.0,
        }
    }

    pub fn dir(&self) -> TurnDir {
        self.dir
    }

    /// Curve parameter in [0, 1].
    pub fn progress(&self) -> f64 {
        self.t
    }

    fn build(&mut self, ctx: &dyn VehicleContext) -> [Vector2<f64>; 4] {
        let p0 = ctx.position();
        let (sin, cos) = ctx.heading().sin_cos();
        let fwd = Vector2::new(cos, sin);
        let normal = Vector2::new(-sin, cos) * self.dir.sign();

        let p3 = p0 + fwd * self.length + normal * self.lane_width;
        let p1 = p0 + fwd * (self.length / 3.0);
        let p2 = p3 - fwd * (self.length / 3.0);

        let ctrl = [p0, p1, p2, p3];
        self.ctrl = Some(ctrl);
        ctrl
    }
}

/// Point on the cubic Bezier at `t`.
fn bezier(p: &[Vector2<f64>; 4], t: f64) -> Vector2<f64> {
    let u = 1.0 - t;
    p[0] * (u * u * u) + p[1] * (3.0 * u * u * t) + p[2] * (3.0 * u * t * t) + p[3] * (t * t * t)
}

/// Derivative of the cubic Bezier at `t`.
fn bezier_tangent(p: &[Vector2<f64>; 4], t: f64) -> Vector2<f64> {
    let u = 1.0 - t;
    (p[1] - p[0]) * (3.0 * u * u) + (p[2] - p[1]) * (6.0 * u * t) + (p[3] - p[2]) * (3.0 * t * t)
}

impl Maneuver for LaneChange {
    fn on_start(&mut self, ctx: &mut dyn VehicleContext) {
        self.t = 0.0;
        self.build(ctx);
    }

    fn execute(&mut self, dt: f64, ctx: &mut dyn VehicleContext) -> bool {
        let ctrl = match self.ctrl {
            Some(c) => c,
            None => {
                debug_assert!(false, "LaneChange executed before on_start");
                self.build(ctx)
            }
        };

        self.t = if self.duration_s > 0.0 {
            (self.t + dt.max(0.0) / self.duration_s).min(1.0)
        } else {
            1.0
        };

        let pos = bezier(&ctrl, self.t);
        ctx.set_position(pos.x, pos.y);

        let tangent = bezier_tangent(&ctrl, self.t);
        if tangent.norm() > 1e-12 {
            ctx.set_heading(tangent.y.atan2(tangent.x));
        }

        self.t >= 1.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loc::Pose;
    use crate::veh_ctx::KinematicCtx;
    use std::f64::consts::FRAC_PI_2;

    fn run(cmd: &mut LaneChange, ctx: &mut KinematicCtx, dt: f64) -> usize {
        cmd.on_start(ctx);
        let mut frames = 1;
        while !cmd.execute(dt, ctx) {
            frames += 1;
            assert!(frames < 10_000);
        }
        frames
    }

    #[test]
    fn test_endpoint_exact() {
        let mut ctx = KinematicCtx::new(Pose::new(0.0, 0.0, 0.0));
        let mut cmd = LaneChange::new(TurnDir::Left, 1.0, 8.0, 2.0);
        run(&mut cmd, &mut ctx, 1.0 / 60.0);

        assert!((ctx.x() - 8.0).abs() < 1e-3);
        assert!((ctx.y() - 1.0).abs() < 1e-3);
        assert!(ctx.heading().abs() < 1e-6);
    }

    #[test]
    fn test_right_change_rotated() {
        let mut ctx = KinematicCtx::new(Pose::new(2.0, 3.0, FRAC_PI_2));
        let mut cmd = LaneChange::new(TurnDir::Right, 2.0, 6.0, 0.8);
        run(&mut cmd, &mut ctx, 0.01);

        // Heading north, right is +x
        assert!((ctx.x() - 4.0).abs() < 1e-3);
        assert!((ctx.y() - 9.0).abs() < 1e-3);
        assert!((ctx.heading() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_lateral_offset_monotonic() {
        let mut ctx = KinematicCtx::new(Pose::default());
        let mut cmd = LaneChange::new(TurnDir::Left, 1.0, 8.0, 2.0);
        cmd.on_start(&mut ctx);

        let mut last_y = 0.0;
        while !cmd.execute(1.0 / 60.0, &mut ctx) {
            assert!(ctx.y() >= last_y - 1e-12);
            assert!(ctx.y() <= 1.0 + 1e-12);
            assert!(ctx.heading() >= 0.0);
            last_y = ctx.y();
        }
    }
}
