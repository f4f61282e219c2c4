//! Intersection entry and exit detection

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use nalgebra::Vector2;

use super::Rect;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracks which intersection rectangle, if any, the vehicle is in.
#[derive(Debug, Clone, Default)]
pub struct IntersectionDetector {
    rects: Vec<Rect>,

    /// Index of the rectangle occupied last update.
    last_index: Option<usize>,

    last_hit: IntersectionHit,
}

/// Result of one detector update.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct IntersectionHit {
    /// The vehicle entered an intersection this update.
    pub entered: bool,

    /// The vehicle is inside an intersection.
    pub inside: bool,

    /// The vehicle left an intersection this update.
    pub exited: bool,

    /// Index of the occupied rectangle.
    pub index: Option<usize>,

    pub rect: Option<Rect>,

    pub centre: Option<Vector2<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IntersectionDetector {
    pub fn new(rects: Vec<Rect>) -> Self {
        Self {
            rects,
            last_index: None,
            last_hit: IntersectionHit::default(),
        }
    }

    /// Update with the current vehicle position.
    ///
    /// Overlapping rectangles resolve to the first one in the list.
    pub fn update(&mut self, x: f64, y: f64) -> IntersectionHit {
        let now = self
            .rects
            .iter()
            .enumerate()
            .find(|(_, r)| r.contains(x, y))
            .map(|(i, r)| (i, *r));

        let was_inside = self.last_index.is_some();
        let inside = now.is_some();
        let entered = !was_inside && inside;
        let exited = was_inside && !inside;

        self.last_index = now.map(|(i, _)| i);

        self.last_hit = IntersectionHit {
            entered,
            inside,
            exited,
            index: now.map(|(i, _)| i),
            rect: now.map(|(_, r)| r),
            centre: now.map(|(_, r)| r.centre()),
        };

        if entered {
            info!("Entered intersection at ({:.2}, {:.2})", x, y);
        }
        if exited {
            debug!("Exited intersection at ({:.2}, {:.2})", x, y);
        }

        self.last_hit
    }

    pub fn is_at_intersection(&self) -> bool {
        self.last_hit.inside
    }

    pub fn just_entered(&self) -> bool {
        self.last_hit.entered
    }

    pub fn just_exited(&self) -> bool {
        self.last_hit.exited
    }

    pub fn last_hit(&self) -> IntersectionHit {
        self.last_hit
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }
}
