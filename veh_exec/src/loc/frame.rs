//! Local coordinate frames attached to a pose

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::Deserialize;

use super::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An offset frame rigidly attached to the vehicle body.
///
/// The local X axis points along the vehicle heading and the local Y axis to
/// its left.
#[derive(Debug, Copy, Clone, Default, PartialEq, Deserialize)]
pub struct LocalFrame {
    /// Origin of the frame in the vehicle body frame.
    ///
    /// Units: world units
    #[serde(default)]
    pub offset: Vector2<f64>,

    /// Rotation of the frame relative to the vehicle heading.
    ///
    /// Units: radians
    #[serde(default)]
    pub heading_offset_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocalFrame {
    pub fn new(forward: f64, left: f64, heading_offset_rad: f64) -> Self {
        Self {
            offset: Vector2::new(forward, left),
            heading_offset_rad,
        }
    }

    /// Convert a point in this frame into the world frame, given the pose of
    /// the vehicle carrying it.
    pub fn to_world(&self, vehicle: &Pose, local: Vector2<f64>) -> Vector2<f64> {
        let body_rot = Rotation2::new(vehicle.heading());
        let frame_rot = Rotation2::new(self.heading_offset_rad);

        vehicle.position + body_rot * (self.offset + frame_rot * local)
    }

    /// Convert a world point into this frame, given the pose of the vehicle
    /// carrying it.
    pub fn to_local(&self, vehicle: &Pose, world: Vector2<f64>) -> Vector2<f64> {
        let body_rot = Rotation2::new(vehicle.heading());
        let frame_rot = Rotation2::new(self.heading_offset_rad);

        frame_rot.inverse() * (body_rot.inverse() * (world - vehicle.position) - self.offset)
    }

    /// World pose of the frame origin, carrying over the vehicle speed.
    pub fn world_pose(&self, vehicle: &Pose) -> Pose {
        let origin = self.to_world(vehicle, Vector2::zeros());
        let mut pose = Pose::new(
            origin.x,
            origin.y,
            vehicle.heading() + self.heading_offset_rad,
        );
        pose.speed = vehicle.speed;
        pose
    }
}
