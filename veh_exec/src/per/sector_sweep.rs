//! Sector sweep sensor
//!
//! A wide angle scan of `num_rays` rays, spread over `num_frames` calls to
//! `detect`. Each call casts the next batch of rays and folds the batch
//! minimum into an exponentially smoothed distance.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{trace, warn};
use nalgebra::Vector2;
use serde::Deserialize;
use util::maths::{clamp, lerp};

use super::SensorReading;
use crate::loc::Pose;
use crate::world::WorldQuery;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const LABEL_OBSTACLE: &str = "Obstacle";
pub const LABEL_CLEAR: &str = "Clear";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    /// Half width of the sector.
    ///
    /// Units: degrees
    pub fov_half_deg: f64,

    /// Units: world units
    pub max_dist: f64,

    /// Total number of rays in a full sweep.
    pub num_rays: usize,

    /// Number of calls over which a full sweep is spread.
    pub num_frames: usize,

    /// Units: world units
    pub step: f64,

    /// Smoothing factor toward each new batch minimum.
    pub ema_alpha: f64,

    /// Units: world units
    pub warn_dist: f64,
}

/// Sector scan amortised over several frames.
#[derive(Debug, Clone)]
pub struct SectorSweepSensor {
    /// Units: radians
    fov_half_rad: f64,
    max_dist: f64,
    num_rays: usize,
    num_frames: usize,
    step: f64,
    ema_alpha: f64,
    warn_dist: f64,

    pose: Pose,

    /// Index of the next batch, in [0, num_frames).
    phase: usize,

    filtered: Option<f64>,
    last_batch_min: f64,

    /// Ray offset of the last batch minimum.
    ///
    /// Units: radians
    last_angle: f64,

    last_ray_ends: Vec<Vector2<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            fov_half_deg: 30.0,
            max_dist: 12.0,
            num_rays: 9,
            num_frames: 3,
            step: 0.25,
            ema_alpha: 0.4,
            warn_dist: 5.0,
        }
    }
}

impl SectorSweepSensor {
    /// Create a new sensor, clamping out of range parameters.
    pub fn new(params: &SweepParams) -> Self {
        let step = params.step.max(0.02);
        let ema_alpha = clamp(params.ema_alpha, 0.05, 0.9);

        if ema_alpha != params.ema_alpha || step != params.step {
            warn!(
                "Sector sweep parameters clamped: step {} -> {}, alpha {} -> {}",
                params.step, step, params.ema_alpha, ema_alpha
            );
        }

        Self {
            fov_half_rad: params.fov_half_deg.to_radians().max(0.01),
            max_dist: params.max_dist.max(step),
            num_rays: params.num_rays.max(3),
            num_frames: params.num_frames.max(1),
            step,
            ema_alpha,
            warn_dist: params.warn_dist.max(0.0),
            pose: Pose::default(),
            phase: 0,
            filtered: None,
            last_batch_min: f64::INFINITY,
            last_angle: 0.0,
            last_ray_ends: Vec::new(),
        }
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn set_warn_dist(&mut self, warn_dist: f64) {
        self.warn_dist = warn_dist.max(0.0);
    }

    /// Smoothed distance, `None` before the first detection.
    pub fn filtered_distance(&self) -> Option<f64> {
        self.filtered
    }

    pub fn last_batch_min(&self) -> f64 {
        self.last_batch_min
    }

    pub fn last_ray_ends(&self) -> &[Vector2<f64>] {
        &self.last_ray_ends
    }

    /// Number of rays cast per call.
    pub fn batch_size(&self) -> usize {
        ((self.num_rays + self.num_frames - 1) / self.num_frames).max(1)
    }

    /// Cast the next batch of rays and return the smoothed reading.
    pub fn detect(&mut self, world: &dyn WorldQuery) -> SensorReading {
        let batch = self.batch_size();
        let start = self.phase * batch;
        let end = (start + batch).min(self.num_rays);

        let (cx, cy, ch) = (self.pose.x(), self.pose.y(), self.pose.heading());

        self.last_ray_ends.clear();

        // Rays which don't divide evenly leave trailing batches empty, these
        // repeat the last reading rather than feeding max_dist to the filter.
        if start >= end {
            self.phase = (self.phase + 1) % self.num_frames;
            return self.reading(self.filtered.unwrap_or(self.max_dist));
        }

        let mut batch_min = f64::INFINITY;
        let mut batch_angle = 0.0;

        for i in start..end {
            let t = i as f64 / (self.num_rays - 1) as f64;
            let offset = -self.fov_half_rad + 2.0 * self.fov_half_rad * t;
            let a = ch + offset;

            let d = world.cast_forward(cx, cy, a, self.max_dist, self.step);
            if d < batch_min {
                batch_min = d;
                batch_angle = offset;
            }

            self.last_ray_ends
                .push(Vector2::new(cx + d * a.cos(), cy + d * a.sin()));
        }

        if !batch_min.is_finite() {
            batch_min = self.max_dist;
        }
        self.last_batch_min = batch_min;
        self.last_angle = batch_angle;

        let filtered = match self.filtered {
            Some(prev) => lerp(prev, batch_min, self.ema_alpha),
            None => batch_min,
        };
        self.filtered = Some(filtered);

        self.phase = (self.phase + 1) % self.num_frames;

        trace!(
            "Sweep: batch {}..{} min {:.2}, filtered {:.2}",
            start,
            end,
            batch_min,
            filtered
        );

        self.reading(filtered)
    }

    fn reading(&self, distance: f64) -> SensorReading {
        let triggered = distance <= self.warn_dist;

        SensorReading {
            triggered,
            distance,
            angle: self.last_angle,
            label: if triggered {
                LABEL_OBSTACLE
            } else {
                LABEL_CLEAR
            },
        }
    }
}
