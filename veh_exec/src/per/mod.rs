//! # Perception module
//!
//! Distance sensors casting rays against the world geometry from a pose
//! mounted on the vehicle. The sensor pose is set by the owner every frame
//! before calling `detect`, sensors never modify the vehicle pose.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod raycast;
mod sector_sweep;

pub use raycast::{RaycastParams, RaycastSensor};
pub use sector_sweep::{SectorSweepSensor, SweepParams};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Output of a single sensor detection.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    /// The reading is within the sensor's warning distance.
    pub triggered: bool,

    /// Distance to the nearest obstacle, or the maximum range if none.
    ///
    /// Units: world units
    pub distance: f64,

    /// Direction of the nearest ray relative to the sensor heading.
    ///
    /// Units: radians
    pub angle: f64,

    pub label: &'static str,
}
