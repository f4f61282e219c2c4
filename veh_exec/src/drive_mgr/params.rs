//! Parameters for the drive manager

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::SafetyParams;
use crate::cmd_exec::CmdParams;
use crate::loc::LocalFrame;
use crate::mount::MountSiteDef;
use crate::per::{RaycastParams, SweepParams};
use crate::turn_policy::{PolicyKind, StickyPolicyParams, TrendPolicyParams};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Site of the emergency raycast.
pub const SITE_NOSE: &str = "nose";

/// Site of the forward sector sweep.
pub const SITE_FRONT: &str = "front";

/// Site of the left sector sweep.
pub const SITE_LEFT: &str = "front_left";

/// Site of the right sector sweep.
pub const SITE_RIGHT: &str = "front_right";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriveMgrParams {
    /// Starting pose of the vehicle.
    pub spawn: SpawnParams,

    /// Speed used when no command is running.
    ///
    /// Units: world units/second
    pub cruise_speed: f64,

    /// Units: world units
    pub lane_width: f64,

    /// Lateral offset of a lane change.
    ///
    /// Units: world units
    pub lane_change_offset: f64,

    /// Units: world units
    pub lane_change_length: f64,

    /// Units: seconds
    pub lane_change_duration_s: f64,

    pub policy: PolicyKind,
    pub sticky_policy: StickyPolicyParams,
    pub trend_policy: TrendPolicyParams,

    pub emergency_ray: RaycastParams,
    pub front_sweep: SweepParams,
    pub side_sweep: SweepParams,

    pub safety: SafetyParams,

    pub cmd: CmdParams,

    /// Sensor mount sites, which must include the nose, front, front left
    /// and front right sites.
    pub mount_sites: Vec<MountSiteDef>,

    /// Maximum number of mounted sensors.
    pub max_mounts: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpawnParams {
    pub x: f64,
    pub y: f64,

    /// Units: degrees
    pub heading_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveMgrParams {
    fn default() -> Self {
        let side_angle = 35f64.to_radians();

        Self {
            spawn: SpawnParams::default(),
            cruise_speed: 4.0,
            lane_width: 1.0,
            lane_change_offset: 2.0,
            lane_change_length: 8.0,
            lane_change_duration_s: 0.8,
            policy: PolicyKind::Sticky,
            sticky_policy: StickyPolicyParams::default(),
            trend_policy: TrendPolicyParams::default(),
            emergency_ray: RaycastParams {
                warn_dist: 1.5,
                ..Default::default()
            },
            front_sweep: SweepParams::default(),
            side_sweep: SweepParams {
                fov_half_deg: 15.0,
                ..Default::default()
            },
            safety: SafetyParams::default(),
            cmd: CmdParams::default(),
            mount_sites: vec![
                MountSiteDef {
                    name: SITE_NOSE.into(),
                    frame: LocalFrame::new(0.4, 0.0, 0.0),
                },
                MountSiteDef {
                    name: SITE_FRONT.into(),
                    frame: LocalFrame::new(0.3, 0.0, 0.0),
                },
                MountSiteDef {
                    name: SITE_LEFT.into(),
                    frame: LocalFrame::new(0.3, 0.2, side_angle),
                },
                MountSiteDef {
                    name: SITE_RIGHT.into(),
                    frame: LocalFrame::new(0.3, -0.2, -side_angle),
                },
            ],
            max_mounts: 4,
        }
    }
}
