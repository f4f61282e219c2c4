//! Forward raycast sensor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use nalgebra::Vector2;
use serde::Deserialize;
use util::maths::lerp;

use super::SensorReading;
use crate::loc::Pose;
use crate::world::WorldQuery;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const LABEL_COLLISION: &str = "CollisionAhead";
pub const LABEL_CLEAR: &str = "Clear";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RaycastParams {
    /// Distance at or below which the reading is triggered.
    ///
    /// Units: world units
    pub warn_dist: f64,

    /// Units: world units
    pub max_dist: f64,

    /// Sampling step along each ray.
    ///
    /// Units: world units
    pub step: f64,

    /// Number of rays spread evenly over the field of view.
    pub num_rays: usize,

    /// Half width of the field of view, only used with more than one ray.
    ///
    /// Units: degrees
    pub fov_half_deg: f64,

    /// Exponential smoothing factor of the distance, `None` for raw readings.
    pub smoothing_alpha: Option<f64>,
}

/// Raycast sensor returning the nearest hit along one or more rays.
#[derive(Debug, Clone)]
pub struct RaycastSensor {
    params: RaycastParams,
    pose: Pose,

    filtered: Option<f64>,

    ray_start: Vector2<f64>,
    ray_ends: Vec<Vector2<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RaycastParams {
    fn default() -> Self {
        Self {
            warn_dist: 5.0,
            max_dist: 50.0,
            step: 0.25,
            num_rays: 1,
            fov_half_deg: 0.0,
            smoothing_alpha: None,
        }
    }
}

impl RaycastSensor {
    pub fn new(mut params: RaycastParams) -> Self {
        params.step = params.step.max(0.01);
        params.max_dist = params.max_dist.max(params.step);
        params.warn_dist = params.warn_dist.max(0.0);
        params.num_rays = params.num_rays.max(1);

        Self {
            params,
            pose: Pose::default(),
            filtered: None,
            ray_start: Vector2::zeros(),
            ray_ends: Vec::new(),
        }
    }

    pub fn params(&self) -> &RaycastParams {
        &self.params
    }

    /// Set the world pose the rays are cast from.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Start and end points of the rays cast by the last detection.
    pub fn last_rays(&self) -> (Vector2<f64>, &[Vector2<f64>]) {
        (self.ray_start, &self.ray_ends)
    }

    /// Cast the rays and return the reading.
    pub fn detect(&mut self, world: &dyn WorldQuery) -> SensorReading {
        let n = self.params.num_rays;
        let half = self.params.fov_half_deg.to_radians();

        self.ray_start = self.pose.position;
        self.ray_ends.clear();

        let mut nearest = (f64::INFINITY, 0.0);
        for i in 0..n {
            let offset = if n == 1 {
                0.0
            } else {
                -half + 2.0 * half * (i as f64) / ((n - 1) as f64)
            };
            let heading = self.pose.heading() + offset;
            let d = self.cast(world, heading);

            self.ray_ends
                .push(self.ray_start + Vector2::new(heading.cos(), heading.sin()) * d);

            if d < nearest.0 {
                nearest = (d, offset);
            }
        }

        let distance = match (self.params.smoothing_alpha, self.filtered) {
            (Some(alpha), Some(prev)) => lerp(prev, nearest.0, alpha.max(0.0).min(1.0)),
            _ => nearest.0,
        };
        self.filtered = Some(distance);

        let triggered = distance <= self.params.warn_dist;

        trace!("Raycast: distance {:.2}, triggered {}", distance, triggered);

        SensorReading {
            triggered,
            distance,
            angle: nearest.1,
            label: if triggered {
                LABEL_COLLISION
            } else {
                LABEL_CLEAR
            },
        }
    }

    /// Distance along one ray to the first blocked sample, zero if the
    /// sensor itself sits inside an obstacle.
    fn cast(&self, world: &dyn WorldQuery, heading: f64) -> f64 {
        let (x, y) = (self.pose.x(), self.pose.y());

        if world.is_blocked_at(x, y) {
            return 0.0;
        }

        world.cast_forward(x, y, heading, self.params.max_dist, self.params.step)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::world::{Rect, RectWorld};

    fn world() -> RectWorld {
        RectWorld::new(vec![Rect::new(4.0, -0.5, 1.0, 1.0)], vec![])
    }

    #[test]
    fn test_hit_and_clear() {
        let mut sensor = RaycastSensor::new(RaycastParams::default());
        let w = world();

        let reading = sensor.detect(&w);
        assert!(reading.triggered);
        assert!((reading.distance - 4.0).abs() < 1e-9);
        assert_eq!(reading.label, LABEL_COLLISION);

        sensor.set_pose(Pose::new(0.0, 2.0, 0.0));
        let reading = sensor.detect(&w);
        assert!(!reading.triggered);
        assert_eq!(reading.distance, 50.0);
        assert_eq!(reading.label, LABEL_CLEAR);

        // Inside the obstacle
        sensor.set_pose(Pose::new(4.5, 0.0, 0.0));
        assert_eq!(sensor.detect(&w).distance, 0.0);
    }

    #[test]
    fn test_multi_ray_nearest() {
        let mut sensor = RaycastSensor::new(RaycastParams {
            num_rays: 3,
            fov_half_deg: 30.0,
            ..Default::default()
        });
        sensor.set_pose(Pose::new(0.0, 2.0, 0.0));

        let reading = sensor.detect(&world());
        assert!(reading.triggered);
        assert!(reading.angle < 0.0);
        assert_eq!(sensor.last_rays().1.len(), 3);
    }

    #[test]
    fn test_matches_world_cast() {
        let w = RectWorld::new(
            vec![Rect::new(4.0, -0.5, 1.0, 1.0), Rect::new(-3.0, 2.0, 1.0, 6.0)],
            vec![],
        );
        let mut sensor = RaycastSensor::new(RaycastParams::default());
        let params = sensor.params().clone();

        for i in 0..16 {
            let heading = -3.0 + 0.4 * i as f64;
            sensor.set_pose(Pose::new(0.5, 0.5, heading));
            let expected = w.cast_forward(0.5, 0.5, heading, params.max_dist, params.step);
            assert_eq!(sensor.detect(&w).distance, expected);
        }
    }

    #[test]
    fn test_smoothing() {
        let mut sensor = RaycastSensor::new(RaycastParams {
            smoothing_alpha: Some(0.5),
            ..Default::default()
        });
        let w = world();

        sensor.set_pose(Pose::new(0.0, 2.0, 0.0));
        assert_eq!(sensor.detect(&w).distance, 50.0);

        sensor.set_pose(Pose::new(0.0, 0.0, 0.0));
        assert!((sensor.detect(&w).distance - 27.0).abs() < 1e-9);
    }
}
