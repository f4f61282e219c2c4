//! Parameters for the maneuvers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters used when building maneuvers from high level requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CmdParams {
    pub turn_90: Turn90Params,
    pub turn_arc: TurnArcParams,
}

/// Parameters of the fixed rate 90 degree turns.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Turn90Params {
    /// Yaw applied each frame while turning.
    ///
    /// Units: degrees/frame
    pub yaw_step_deg: f64,

    /// Distance moved each frame.
    ///
    /// Units: world units/frame
    pub step_dist: f64,

    /// Remaining angle below which the heading is snapped to the target.
    ///
    /// Units: degrees
    pub snap_tol_deg: f64,

    /// Straight travel time before the turn starts.
    ///
    /// Units: seconds
    pub delay_s: f64,

    /// Sign applied to the steer demand, +1 or -1.
    pub steer_polarity: i8,
}

/// Parameters of the intersection arc turn.
///
/// Lengths marked "scale" are fractions of the shorter side of the
/// intersection rectangle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TurnArcParams {
    /// Units: world units
    pub pre_roll_min: f64,

    pub pre_roll_scale: f64,

    /// Units: world units/frame
    pub pre_roll_step: f64,

    pub radius_scale: f64,

    pub margin_scale: f64,

    /// Units: world units
    pub radius_min: f64,

    /// Arc progress per second as a fraction of the quarter circle, before
    /// clamping.
    pub dtheta_coef: f64,

    /// Units: fraction of the quarter circle per frame
    pub dtheta_min: f64,

    /// Units: fraction of the quarter circle per frame
    pub dtheta_max: f64,

    /// Blend factor toward the exit lane centre per frame, in [0, 1].
    pub align_alpha: f64,

    /// Units: world units/frame
    pub exit_step: f64,

    /// Distance to travel along the exit lane before completing.
    ///
    /// Units: world units
    pub exit_dist: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Turn90Params {
    fn default() -> Self {
        Self {
            yaw_step_deg: 1.5,
            step_dist: 0.05,
            snap_tol_deg: 0.01,
            delay_s: 1.0,
            steer_polarity: 1,
        }
    }
}

impl Default for TurnArcParams {
    fn default() -> Self {
        Self {
            pre_roll_min: 0.6,
            pre_roll_scale: 0.45,
            pre_roll_step: 0.12,
            radius_scale: 0.35,
            margin_scale: 0.10,
            radius_min: 0.25,
            dtheta_coef: 1.6,
            dtheta_min: 0.02,
            dtheta_max: 0.10,
            align_alpha: 0.22,
            exit_step: 0.12,
            exit_dist: 0.8,
        }
    }
}
