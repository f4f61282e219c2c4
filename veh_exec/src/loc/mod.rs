//! # Localisation module
//!
//! Holds the vehicle [`Pose`] and the local/world frame conversions used by
//! anything mounted on the vehicle.
//!
//! Conventions: world X to the right, world Y up, heading measured
//! anticlockwise from +X in radians and always kept in (-pi, pi].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod frame;
pub use frame::LocalFrame;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position, heading and scalar speed of the vehicle in the world frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Pose {
    /// Position in the world frame.
    ///
    /// Units: world units (one lane width per unit)
    pub position: Vector2<f64>,

    /// Heading in the world frame.
    ///
    /// Units: radians, in (-pi, pi]
    heading_rad: f64,

    /// Scalar speed along the heading.
    ///
    /// Units: world units/second
    pub speed: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl Pose {
    /// Create a stationary pose, wrapping the heading.
    pub fn new(x: f64, y: f64, heading_rad: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            heading_rad: wrap_pi(heading_rad),
            speed: 0.0,
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Heading in (-pi, pi].
    pub fn heading(&self) -> f64 {
        self.heading_rad
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position = Vector2::new(x, y);
    }

    pub fn set_heading(&mut self, heading_rad: f64) {
        self.heading_rad = wrap_pi(heading_rad);
    }

    /// Rotate the heading by `delta_rad`, anticlockwise positive.
    pub fn rotate(&mut self, delta_rad: f64) {
        self.set_heading(self.heading_rad + delta_rad);
    }

    /// Unit vector pointing along the heading.
    pub fn forward(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// Unit vector pointing to the left of the heading.
    pub fn left(&self) -> Vector2<f64> {
        Vector2::new(-self.heading_rad.sin(), self.heading_rad.cos())
    }

    /// Move `dist` along the current heading.
    pub fn translate(&mut self, dist: f64) {
        self.position += self.forward() * dist;
    }

    /// Advance along the heading at the current speed for `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.translate(self.speed * dt);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_heading_always_wrapped() {
        let mut pose = Pose::new(0.0, 0.0, 7.0);
        assert!(pose.heading() > -PI && pose.heading() <= PI);

        // Mix of rotations and sets, including exact multiples of pi
        let deltas = [FRAC_PI_2, PI, -3.0 * PI, 0.3, 100.0, -PI, 2.0 * PI, -0.001];
        for (i, d) in deltas.iter().cycle().take(200).enumerate() {
            if i % 3 == 0 {
                pose.set_heading(pose.heading() + d * 1.7);
            } else {
                pose.rotate(*d);
            }
            assert!(
                pose.heading() > -PI && pose.heading() <= PI,
                "heading {} out of range",
                pose.heading()
            );
        }

        pose.set_heading(-PI);
        assert_eq!(pose.heading(), PI);
    }

    #[test]
    fn test_translate_and_step() {
        let mut pose = Pose::new(1.0, 1.0, FRAC_PI_2);
        pose.translate(2.0);
        assert!((pose.x() - 1.0).abs() < 1e-12);
        assert!((pose.y() - 3.0).abs() < 1e-12);

        pose.set_heading(0.0);
        pose.speed = 4.0;
        pose.step(0.5);
        assert!((pose.x() - 3.0).abs() < 1e-12);
        assert!((pose.y() - 3.0).abs() < 1e-12);

        let l = pose.left();
        assert!((l.x - 0.0).abs() < 1e-12 && (l.y - 1.0).abs() < 1e-12);
    }
}
