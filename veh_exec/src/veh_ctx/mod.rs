//! # Vehicle context
//!
//! The narrow surface through which maneuvers and supervisors move the
//! vehicle. Two implementations exist:
//!
//! - [`KinematicCtx`] - direct position writes, used by the command executor.
//! - [`DynamicsCtx`] - the force-based model, where `apply` drives the control
//!   bus and motion comes from the dynamics integrator.
//!
//! Only one of them owns a given vehicle's motion.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod dyn_ctx;
pub use dyn_ctx::DynamicsCtx;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use util::maths::clamp;

use crate::loc::Pose;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Query and mutation surface of a vehicle.
pub trait VehicleContext {
    fn x(&self) -> f64;
    fn y(&self) -> f64;

    /// Heading in (-pi, pi].
    fn heading(&self) -> f64;

    /// Scalar speed along the heading.
    fn speed(&self) -> f64;

    fn set_position(&mut self, x: f64, y: f64);

    /// Set the heading, which is wrapped into (-pi, pi].
    fn set_heading(&mut self, heading_rad: f64);

    /// Apply a control demand.
    ///
    /// The meaning of the values depends on the implementation, see
    /// [`KinematicCtx::apply`] and [`DynamicsCtx::apply`].
    fn apply(&mut self, steer: f64, throttle: f64, brake: f64);

    /// Copy of the current pose.
    fn pose(&self) -> Pose {
        let mut p = Pose::new(self.x(), self.y(), self.heading());
        p.speed = self.speed();
        p
    }

    fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x(), self.y())
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic vehicle context, moving the pose directly.
#[derive(Debug, Clone, Default)]
pub struct KinematicCtx {
    pose: Pose,

    /// Position at the start of the current frame, used to derive speed.
    frame_start: Vector2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinematicCtx {
    pub fn new(spawn: Pose) -> Self {
        Self {
            pose: spawn,
            frame_start: spawn.position,
        }
    }

    /// Mark the start of a frame.
    pub fn begin_frame(&mut self) {
        self.frame_start = self.pose.position;
    }

    /// Mark the end of a frame of length `dt`, updating the speed from the
    /// distance moved during the frame.
    pub fn end_frame(&mut self, dt: f64) {
        self.pose.speed = if dt > 0.0 {
            (self.pose.position - self.frame_start).norm() / dt
        } else {
            0.0
        };
    }
}

impl VehicleContext for KinematicCtx {
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

    /// Rotate by `steer` radians then move `throttle` world units forward.
    ///
    /// A brake in [0, 1] scales down the forward move, a full brake holds the
    /// vehicle in place.
    fn apply(&mut self, steer: f64, throttle: f64, brake: f64) {
        self.pose.rotate(steer);
        self.pose.translate(throttle * (1.0 - clamp(brake, 0.0, 1.0)));
    }

    fn pose(&self) -> Pose {
        self.pose
    }
}
