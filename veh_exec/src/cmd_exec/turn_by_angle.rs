//! Fixed rate turn by a target angle

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use std::f64::consts::FRAC_PI_2;
use util::maths::wrap_pi;

use super::{Maneuver, Turn90Params, TurnDir};
use crate::veh_ctx::VehicleContext;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Turn by a target angle in fixed yaw steps.
///
/// The maneuver first drives straight for `delay_s`, then applies one yaw
/// step per frame, never more than the angle left to turn. Once the remaining
/// angle is within the snap tolerance the heading is set exactly to the
/// target.
#[derive(Debug, Clone)]
pub struct TurnByAngle {
    /// Signed target angle, left positive.
    ///
    /// Units: radians
    target_rad: f64,

    /// Units: radians/frame
    yaw_step_rad: f64,

    /// Units: world units/frame
    step_dist: f64,

    /// Units: radians
    snap_tol_rad: f64,

    polarity: f64,

    /// Units: seconds
    delay_s: f64,

    // State
    started: bool,
    start_heading: f64,
    turned_rad: f64,
    delay_elapsed_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TurnByAngle {
    pub fn new(
        target_rad: f64,
        yaw_step_rad: f64,
        step_dist: f64,
        snap_tol_rad: f64,
        steer_polarity: i8,
        delay_s: f64,
    ) -> Self {
        Self {
            target_rad,
            yaw_step_rad: yaw_step_rad.abs(),
            step_dist,
            snap_tol_rad: snap_tol_rad.abs(),
            polarity: if steer_polarity >= 0 { 1.0 } else { -1.0 },
            delay_s,
            started: false,
            start_heading: 0.0,
            turned_rad: 0.0,
            delay_elapsed_s: 0.0,
        }
    }

    /// 90 degree turn in the given direction.
    pub fn quarter(dir: TurnDir, params: &Turn90Params) -> Self {
        Self::new(
            dir.sign() * FRAC_PI_2,
            params.yaw_step_deg.to_radians(),
            params.step_dist,
            params.snap_tol_deg.to_radians(),
            params.steer_polarity,
            params.delay_s,
        )
    }

    pub fn left_90(params: &Turn90Params) -> Self {
        Self::quarter(TurnDir::Left, params)
    }

    pub fn right_90(params: &Turn90Params) -> Self {
        Self::quarter(TurnDir::Right, params)
    }

    /// Angle turned so far, signed.
    pub fn turned_rad(&self) -> f64 {
        self.turned_rad
    }
}

impl Maneuver for TurnByAngle {
    fn on_start(&mut self, ctx: &mut dyn VehicleContext) {
        self.started = true;
        self.turned_rad = 0.0;
        self.delay_elapsed_s = 0.0;
        self.start_heading = ctx.heading();
    }

    fn execute(&mut self, dt: f64, ctx: &mut dyn VehicleContext) -> bool {
        if !self.started {
            debug_assert!(false, "TurnByAngle executed before on_start");
            self.on_start(ctx);
        }

        // Straight delay
        if self.delay_elapsed_s < self.delay_s {
            self.delay_elapsed_s += dt.max(0.0);
            ctx.apply(0.0, self.step_dist, 0.0);
            return false;
        }

        let remaining = self.target_rad - self.turned_rad;
        if remaining.abs() <= self.snap_tol_rad || self.yaw_step_rad <= 0.0 {
            ctx.set_heading(wrap_pi(
                self.start_heading + self.target_rad * self.polarity,
            ));
            return true;
        }

        let yaw = remaining.signum() * self.yaw_step_rad.min(remaining.abs());
        ctx.apply(yaw * self.polarity, self.step_dist, 0.0);
        self.turned_rad += yaw;

        trace!(
            "TurnByAngle: turned {:.4} of {:.4} rad",
            self.turned_rad,
            self.target_rad
        );

        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loc::Pose;
    use crate::veh_ctx::KinematicCtx;
    use std::f64::consts::PI;

    #[test]
    fn test_exact_completion_no_overshoot() {
        let mut ctx = KinematicCtx::new(Pose::new(0.0, 0.0, 0.3));
        let step = 7f64.to_radians();
        let mut cmd = TurnByAngle::new(FRAC_PI_2, step, 0.05, 1e-9, 1, 0.0);
        cmd.on_start(&mut ctx);

        let mut last_heading = ctx.heading();
        let mut frames = 0;
        while !cmd.execute(1.0 / 60.0, &mut ctx) {
            let delta = wrap_pi(ctx.heading() - last_heading);
            assert!(delta <= step + 1e-12);
            assert!(cmd.turned_rad() <= FRAC_PI_2 + 1e-12);
            last_heading = ctx.heading();
            frames += 1;
            assert!(frames < 1000);
        }

        assert!((ctx.heading() - wrap_pi(0.3 + FRAC_PI_2)).abs() < 1e-12);
    }

    #[test]
    fn test_right_turn_wraps() {
        let mut ctx = KinematicCtx::new(Pose::new(0.0, 0.0, -PI + 0.1));
        let mut cmd = TurnByAngle::right_90(&Turn90Params::default());
        cmd.on_start(&mut ctx);

        let mut frames = 0;
        while !cmd.execute(1.0 / 60.0, &mut ctx) {
            assert!(ctx.heading() > -PI && ctx.heading() <= PI);
            frames += 1;
            assert!(frames < 1000);
        }

        assert!((ctx.heading() - wrap_pi(-PI + 0.1 - FRAC_PI_2)).abs() < 1e-12);
    }

    #[test]
    fn test_delay_moves_straight() {
        let mut ctx = KinematicCtx::new(Pose::default());
        let params = Turn90Params {
            delay_s: 0.5,
            ..Default::default()
        };
        let mut cmd = TurnByAngle::left_90(&params);
        cmd.on_start(&mut ctx);

        for _ in 0..25 {
            assert!(!cmd.execute(0.02, &mut ctx));
        }
        assert_eq!(ctx.heading(), 0.0);
        assert!((ctx.x() - 25.0 * params.step_dist).abs() < 1e-9);
        assert!(ctx.y().abs() < 1e-12);
    }
}
