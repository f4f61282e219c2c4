//! Parameters for the turn decision policies

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the [`StickyTurnPolicy`](super::StickyTurnPolicy).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StickyPolicyParams {
    /// Front distance at or below which the policy turns at once toward the
    /// clearer side.
    ///
    /// Units: world units
    pub front_hard: f64,

    /// Front distance at or above which the baseline band rules apply.
    ///
    /// Units: world units
    pub front_safe: f64,

    /// Deviation from the baseline ratio treated as noise.
    pub band_low: f64,

    /// Deviation from the baseline ratio needed to trigger a turn.
    pub band_high: f64,

    /// Consecutive same side deviations needed to trigger a turn.
    pub k_stable: u32,
}

/// Parameters of the [`TrendTurnPolicy`](super::TrendTurnPolicy).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendPolicyParams {
    /// Angle of the side sensors from the heading, used to project side
    /// distances onto the lateral axis.
    ///
    /// Units: degrees
    pub side_angle_deg: f64,

    /// Front distance at or above which the policy always goes straight.
    ///
    /// Units: world units
    pub straight_min: f64,

    /// Units: world units
    pub delta_thresh: f64,

    /// Units: world units/frame
    pub trend_thresh: f64,

    /// Units: world units
    pub hyst: f64,

    pub ema_alpha: f64,

    /// Time after a trigger during which no new turn is decided.
    ///
    /// Units: seconds
    pub lock_time_s: f64,

    /// Lockout applied once a turn completes.
    ///
    /// Units: seconds
    pub finish_lock_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which policy the drive manager uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum PolicyKind {
    Sticky,
    Trend,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StickyPolicyParams {
    fn default() -> Self {
        Self {
            front_hard: 1.0,
            front_safe: 0.01,
            band_low: 0.02,
            band_high: 0.02,
            k_stable: 4,
        }
    }
}

impl Default for TrendPolicyParams {
    fn default() -> Self {
        Self {
            side_angle_deg: 35.0,
            straight_min: 1.2,
            delta_thresh: 0.15,
            trend_thresh: 0.08,
            hyst: 0.10,
            ema_alpha: 0.35,
            lock_time_s: 0.5,
            finish_lock_s: 0.15,
        }
    }
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Sticky
    }
}
