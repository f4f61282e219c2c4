//! Quarter circle turn through an intersection
//!
//! The turn runs through these phases:
//!
//! - `PreRoll` - drive straight a little way into the intersection
//! - `Arc` - follow a quarter circle tangent to the heading at turn start
//! - `Align` - continue forward while blending onto the exit lane centre
//! - `Done`

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use nalgebra::Vector2;
use std::f64::consts::FRAC_PI_2;
use util::maths::{clamp, lerp, rem_euclid};

use super::{Maneuver, TurnArcParams, TurnDir};
use crate::veh_ctx::VehicleContext;
use crate::world::Rect;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Turn through an intersection onto the exit lane.
#[derive(Debug, Clone)]
pub struct TurnArc {
    dir: TurnDir,
    rect: Rect,

    /// Centre of the exit lane, corrected for right hand traffic once the
    /// exit heading is known.
    lane_centre: Vector2<f64>,

    params: TurnArcParams,

    phase: Phase,
}

/// Geometry of the quarter circle.
#[derive(Debug, Copy, Clone)]
struct Arc {
    centre: Vector2<f64>,
    radius: f64,
    ang0: f64,
    ang1: f64,
    t: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Phase {
    NotStarted,
    PreRoll { remaining: f64 },
    Arc(Arc),
    Align {
        use_x: bool,
        target: f64,
        exited: f64,
    },
    Done,
}

/// Compass direction of a heading.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Compass {
    N,
    E,
    S,
    W,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TurnArc {
    pub fn new(dir: TurnDir, rect: Rect, lane_centre: Vector2<f64>, params: TurnArcParams) -> Self {
        Self {
            dir,
            rect,
            lane_centre,
            params,
            phase: Phase::NotStarted,
        }
    }

    pub fn dir(&self) -> TurnDir {
        self.dir
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    /// Radius of the arc for this intersection.
    pub fn radius(&self) -> f64 {
        let m = self.rect.min_side();
        (self.params.radius_scale * m - self.params.margin_scale * m).max(self.params.radius_min)
    }

    fn build_arc(&self, ctx: &dyn VehicleContext) -> Arc {
        let sign = self.dir.sign();
        let radius = self.radius();
        let (sin, cos) = ctx.heading().sin_cos();
        let left = Vector2::new(-sin, cos);

        let pos = ctx.position();
        let centre = pos + left * (radius * sign);
        let rel = pos - centre;
        let ang0 = rel.y.atan2(rel.x);

        Arc {
            centre,
            radius,
            ang0,
            ang1: ang0 + sign * FRAC_PI_2,
            t: 0.0,
        }
    }

    /// Step along the arc, returning the next phase.
    fn step_arc(&self, mut arc: Arc, dt: f64, ctx: &mut dyn VehicleContext) -> Phase {
        let p = &self.params;
        let sign = self.dir.sign();

        let frac = clamp(dt * p.dtheta_coef, p.dtheta_min, p.dtheta_max);
        arc.t = (arc.t + frac).min(1.0);

        let ang = lerp(arc.ang0, arc.ang1, arc.t);
        let on = arc.centre + Vector2::new(ang.cos(), ang.sin()) * arc.radius;
        ctx.set_position(on.x, on.y);
        ctx.set_heading(ang + sign * FRAC_PI_2);

        if arc.t < 1.0 {
            return Phase::Arc(arc);
        }

        let compass = Compass::from_heading(ctx.heading());
        let lane = ensure_right_hand_lane(&self.rect, compass, self.lane_centre);
        let (use_x, target) = match compass {
            Compass::N | Compass::S => (true, lane.x),
            Compass::E | Compass::W => (false, lane.y),
        };

        debug!(
            "TurnArc: arc complete heading {:?}, aligning {} to {:.2}",
            compass,
            if use_x { "x" } else { "y" },
            target
        );

        Phase::Align {
            use_x,
            target,
            exited: 0.0,
        }
    }
}

impl Maneuver for TurnArc {
    fn on_start(&mut self, _ctx: &mut dyn VehicleContext) {
        let m = self.rect.min_side();
        let remaining = (self.params.pre_roll_scale * m).max(self.params.pre_roll_min);
        self.phase = Phase::PreRoll { remaining };
    }

    fn execute(&mut self, dt: f64, ctx: &mut dyn VehicleContext) -> bool {
        if let Phase::NotStarted = self.phase {
            debug_assert!(false, "TurnArc executed before on_start");
            self.on_start(ctx);
        }

        let p = &self.params;

        self.phase = match self.phase.clone() {
            Phase::NotStarted => Phase::NotStarted,
            Phase::PreRoll { remaining } => {
                let step = remaining.min(p.pre_roll_step.max(1e-3));
                ctx.apply(0.0, step, 0.0);
                let remaining = remaining - step;

                if remaining <= 0.0 {
                    let arc = self.build_arc(ctx);
                    trace!(
                        "TurnArc: arc centre ({:.2}, {:.2}), radius {:.2}",
                        arc.centre.x,
                        arc.centre.y,
                        arc.radius
                    );
                    Phase::Arc(arc)
                } else {
                    Phase::PreRoll { remaining }
                }
            }
            Phase::Arc(arc) => self.step_arc(arc, dt, ctx),
            Phase::Align {
                use_x,
                target,
                exited,
            } => {
                let alpha = clamp(p.align_alpha, 0.0, 1.0);
                let step = p.exit_step.max(1e-3);
                let (sin, cos) = ctx.heading().sin_cos();

                let (mut x, mut y) = (ctx.x(), ctx.y());
                if use_x {
                    x = lerp(x, target, alpha);
                } else {
                    y = lerp(y, target, alpha);
                }
                ctx.set_position(x + step * cos, y + step * sin);

                let exited = exited + step;
                if exited >= p.exit_dist {
                    Phase::Done
                } else {
                    Phase::Align {
                        use_x,
                        target,
                        exited,
                    }
                }
            }
            Phase::Done => Phase::Done,
        };

        self.is_done()
    }
}

impl Compass {
    /// Nearest compass direction of a heading, in 90 degree sectors centred
    /// on each direction.
    pub fn from_heading(heading_rad: f64) -> Self {
        let deg = rem_euclid(heading_rad.to_degrees(), 360.0);

        if (45.0..135.0).contains(&deg) {
            Compass::N
        } else if (135.0..225.0).contains(&deg) {
            Compass::W
        } else if (225.0..315.0).contains(&deg) {
            Compass::S
        } else {
            Compass::E
        }
    }
}

/// Mirror the lane centre about the intersection centre when it lies on the
/// wrong side for right hand traffic heading in `compass`.
pub fn ensure_right_hand_lane(rect: &Rect, compass: Compass, lane: Vector2<f64>) -> Vector2<f64> {
    let c = rect.centre();
    let mut out = lane;

    match compass {
        Compass::N if lane.x < c.x => out.x = 2.0 * c.x - lane.x,
        Compass::S if lane.x > c.x => out.x = 2.0 * c.x - lane.x,
        Compass::E if lane.y > c.y => out.y = 2.0 * c.y - lane.y,
        Compass::W if lane.y < c.y => out.y = 2.0 * c.y - lane.y,
        _ => (),
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loc::Pose;
    use crate::veh_ctx::KinematicCtx;
    use std::f64::consts::PI;

    fn run(cmd: &mut TurnArc, ctx: &mut KinematicCtx) -> usize {
        cmd.on_start(ctx);
        let mut frames = 1;
        while !cmd.execute(1.0 / 60.0, ctx) {
            assert!(ctx.heading() > -PI && ctx.heading() <= PI);
            frames += 1;
            assert!(frames < 10_000);
        }
        frames
    }

    #[test]
    fn test_compass() {
        assert_eq!(Compass::from_heading(0.0), Compass::E);
        assert_eq!(Compass::from_heading(FRAC_PI_2), Compass::N);
        assert_eq!(Compass::from_heading(PI), Compass::W);
        assert_eq!(Compass::from_heading(-FRAC_PI_2), Compass::S);
        assert_eq!(Compass::from_heading(-0.1), Compass::E);
    }

    #[test]
    fn test_right_hand_lane() {
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        let wrong = Vector2::new(1.5, 0.0);
        assert_eq!(
            ensure_right_hand_lane(&rect, Compass::N, wrong),
            Vector2::new(2.5, 0.0)
        );
        assert_eq!(ensure_right_hand_lane(&rect, Compass::S, wrong), wrong);

        let wrong = Vector2::new(0.0, 2.5);
        assert_eq!(
            ensure_right_hand_lane(&rect, Compass::E, wrong),
            Vector2::new(0.0, 1.5)
        );
        assert_eq!(ensure_right_hand_lane(&rect, Compass::W, wrong), wrong);
    }

    #[test]
    fn test_left_turn_ends_north() {
        // Heading east into a 4x4 intersection centred on (2, 2)
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        let mut ctx = KinematicCtx::new(Pose::new(0.0, 1.5, 0.0));
        let mut cmd = TurnArc::new(
            TurnDir::Left,
            rect,
            Vector2::new(1.5, 2.0),
            TurnArcParams::default(),
        );
        run(&mut cmd, &mut ctx);

        assert!((ctx.heading() - FRAC_PI_2).abs() < 1e-9);

        // Lane centre mirrored to the right hand side, x = 2.5, blended toward
        assert!(ctx.x() > 2.0);
        assert!(ctx.y() > 1.5);
    }

    #[test]
    fn test_right_turn_arc_geometry() {
        let rect = Rect::new(0.0, 0.0, 4.0, 4.0);
        let mut ctx = KinematicCtx::new(Pose::new(0.0, 1.5, 0.0));
        let params = TurnArcParams::default();
        let mut cmd = TurnArc::new(TurnDir::Right, rect, Vector2::new(1.0, 2.0), params.clone());
        let radius = cmd.radius();
        assert!((radius - 1.0).abs() < 1e-12);

        cmd.on_start(&mut ctx);

        // Pre-roll of 0.45 * 4
        while let Phase::PreRoll { .. } = cmd.phase {
            cmd.execute(1.0 / 60.0, &mut ctx);
        }
        assert!((ctx.x() - 1.8).abs() < 1e-9);
        assert!((ctx.y() - 1.5).abs() < 1e-12);

        // On the arc the distance to the centre (1.8, 0.5) stays at the radius
        while let Phase::Arc(_) = cmd.phase {
            cmd.execute(1.0 / 60.0, &mut ctx);
            let d = (ctx.position() - Vector2::new(1.8, 0.5)).norm();
            assert!((d - radius).abs() < 1e-9);
        }

        assert!((ctx.heading() + FRAC_PI_2).abs() < 1e-9);
    }
}
