//! # World module
//!
//! Collision geometry the vehicle senses. The core only needs the
//! [`WorldQuery`] trait, [`RectWorld`] is a simple in-memory implementation
//! made of axis-aligned rectangles, which can be loaded from a TOML file.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod intersection;
pub use intersection::{IntersectionDetector, IntersectionHit};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::path::Path;

use nalgebra::Vector2;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Collision queries against the world geometry.
pub trait WorldQuery {
    /// Returns `true` if the point is inside an obstacle.
    fn is_blocked_at(&self, x: f64, y: f64) -> bool;

    /// Distance along `heading_rad` from `(x, y)` to the first blocked sample,
    /// or `max_dist` if nothing is hit.
    ///
    /// Samples are taken every `step` starting one step from the origin, so
    /// results are identical between runs for the same geometry.
    fn cast_forward(&self, x: f64, y: f64, heading_rad: f64, max_dist: f64, step: f64) -> f64 {
        if max_dist <= 0.0 {
            return 0.0;
        }

        let step = step.max(1e-3);
        let (sin, cos) = heading_rad.sin_cos();

        let mut dist = step;
        while dist <= max_dist {
            if self.is_blocked_at(x + cos * dist, y + sin * dist) {
                return dist;
            }
            dist += step;
        }

        max_dist
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Axis aligned rectangle given by its lower left corner and size.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// World of rectangular obstacles and intersections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RectWorld {
    /// Blocking geometry.
    pub obstacles: Vec<Rect>,

    /// Intersection areas, used by the [`IntersectionDetector`].
    pub intersections: Vec<Rect>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("Could not load the world file: {0}")]
    LoadError(util::params::LoadError),

    #[error("Rectangle {index} of {kind} has a non-positive size ({width} x {height})")]
    InvalidRect {
        kind: &'static str,
        index: usize,
        width: f64,
        height: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if the point is inside the rectangle, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn centre(&self) -> Vector2<f64> {
        Vector2::new(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
    }

    /// Length of the shorter side.
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

impl RectWorld {
    pub fn new(obstacles: Vec<Rect>, intersections: Vec<Rect>) -> Self {
        Self {
            obstacles,
            intersections,
        }
    }

    /// Load and validate a world from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WorldError> {
        let world: Self = util::params::load_path(path).map_err(WorldError::LoadError)?;
        world.validate()?;
        Ok(world)
    }

    /// Check every rectangle has a positive size.
    pub fn validate(&self) -> Result<(), WorldError> {
        let all = self
            .obstacles
            .iter()
            .enumerate()
            .map(|(i, r)| ("obstacles", i, r))
            .chain(
                self.intersections
                    .iter()
                    .enumerate()
                    .map(|(i, r)| ("intersections", i, r)),
            );

        for (kind, index, rect) in all {
            if rect.width <= 0.0 || rect.height <= 0.0 {
                return Err(WorldError::InvalidRect {
                    kind,
                    index,
                    width: rect.width,
                    height: rect.height,
                });
            }
        }

        Ok(())
    }
}

impl WorldQuery for RectWorld {
    fn is_blocked_at(&self, x: f64, y: f64) -> bool {
        self.obstacles.iter().any(|r| r.contains(x, y))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn wall_world() -> RectWorld {
        RectWorld::new(vec![Rect::new(10.0, -5.0, 1.0, 10.0)], vec![])
    }

    #[test]
    fn test_cast_forward() {
        let world = wall_world();

        assert!((world.cast_forward(0.0, 0.0, 0.0, 50.0, 0.25) - 10.0).abs() < 1e-9);
        assert_eq!(world.cast_forward(0.0, 0.0, FRAC_PI_2, 50.0, 0.25), 50.0);
        assert_eq!(world.cast_forward(0.0, 0.0, 0.0, 5.0, 0.25), 5.0);
        assert_eq!(world.cast_forward(0.0, 0.0, 0.0, 0.0, 0.25), 0.0);
    }

    #[test]
    fn test_load_from_toml() {
        let world: RectWorld = util::params::from_str(
            r#"
            obstacles = [ { x = 0.0, y = 0.0, width = 2.0, height = 1.0 } ]
            intersections = [ { x = 5.0, y = 5.0, width = 4.0, height = 4.0 } ]
            "#,
        )
        .unwrap();

        assert!(world.validate().is_ok());
        assert!(world.is_blocked_at(1.0, 0.5));
        assert!(!world.is_blocked_at(3.0, 0.5));
        assert_eq!(world.intersections[0].centre(), Vector2::new(7.0, 7.0));
    }

    #[test]
    fn test_invalid_rect() {
        let world = RectWorld::new(vec![], vec![Rect::new(0.0, 0.0, 0.0, 1.0)]);
        assert!(matches!(
            world.validate(),
            Err(WorldError::InvalidRect { index: 0, .. })
        ));
    }
}
