//! # Maneuver telecommands
//!
//! Telecommands which drive the [`DriveMgr`] from a timed script. In a script
//! each command is written as tagged JSON, for example:
//!
//! ```text
//! 1.0: {"type": "MoveForward", "distance": 5.0, "speed": 2.0};
//! 2.5: {"type": "LaneChange", "dir": "Left"};
//! 4.0: {"type": "TurnLeft90"};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Deserialize;

use crate::cmd_exec::{MoveForward, TurnByAngle, TurnDir, Wait};
use crate::drive_mgr::DriveMgr;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A maneuver telecommand.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ManeuverTc {
    /// Units: world units and world units/second
    MoveForward { distance: f64, speed: f64 },

    /// Change lane using the drive manager's lane change parameters.
    LaneChange { dir: TurnDir },

    TurnLeft90,
    TurnRight90,

    /// Turn by a signed angle, anticlockwise positive, creeping forward a
    /// small step every frame of the turn.
    TurnByAngle {
        /// Units: degrees
        angle_deg: f64,

        /// Units: degrees/frame, defaults to the 90 degree turn step
        #[serde(default)]
        yaw_step_deg: Option<f64>,
    },

    /// Units: seconds
    Wait { duration_s: f64 },

    /// Drop the queue and abort the current command.
    Clear,

    /// Release the emergency brake.
    ResetBrake,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand on the drive manager.
pub fn exec(mgr: &mut DriveMgr, tc: &ManeuverTc) {
    debug!("Executing {:?}", tc);

    let turn_90 = mgr.params().cmd.turn_90.clone();

    match tc {
        ManeuverTc::MoveForward { distance, speed } => {
            mgr.enqueue(MoveForward::new(*distance, *speed).into())
        }
        ManeuverTc::LaneChange { dir } => {
            mgr.lane_change(*dir == TurnDir::Left);
        }
        ManeuverTc::TurnLeft90 => mgr.enqueue(TurnByAngle::left_90(&turn_90).into()),
        ManeuverTc::TurnRight90 => mgr.enqueue(TurnByAngle::right_90(&turn_90).into()),
        ManeuverTc::TurnByAngle {
            angle_deg,
            yaw_step_deg,
        } => mgr.enqueue(
            TurnByAngle::new(
                angle_deg.to_radians(),
                yaw_step_deg.unwrap_or(turn_90.yaw_step_deg).to_radians(),
                turn_90.step_dist,
                turn_90.snap_tol_deg.to_radians(),
                turn_90.steer_polarity,
                turn_90.delay_s,
            )
            .into(),
        ),
        ManeuverTc::Wait { duration_s } => mgr.enqueue(Wait::new(*duration_s).into()),
        ManeuverTc::Clear => mgr.clear(),
        ManeuverTc::ResetBrake => mgr.reset_brake(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_mgr::{DriveMgrInit, DriveMgrParams};
    use crate::world::RectWorld;
    use util::module::State;
    use util::script_interpreter::{Pending, ScriptInterpreter};

    #[test]
    fn test_parse_script() {
        let script = "\
            0.0: {\"type\": \"MoveForward\", \"distance\": 2.0, \"speed\": 1.0};\n\
            0.5: {\"type\": \"LaneChange\", \"dir\": \"Right\"};\n\
            1.0: {\"type\": \"TurnByAngle\", \"angle_deg\": -45.0};\n\
            1.0: {\"type\": \"ResetBrake\"};\n";

        let mut si: ScriptInterpreter<ManeuverTc> = ScriptInterpreter::from_str(script).unwrap();
        assert_eq!(si.get_num_cmds(), 4);

        assert_eq!(
            si.get_pending(0.0),
            Pending::Some(vec![ManeuverTc::MoveForward {
                distance: 2.0,
                speed: 1.0
            }])
        );
        assert_eq!(
            si.get_pending(0.6),
            Pending::Some(vec![ManeuverTc::LaneChange { dir: TurnDir::Right }])
        );
        assert_eq!(
            si.get_pending(1.0),
            Pending::Some(vec![
                ManeuverTc::TurnByAngle {
                    angle_deg: -45.0,
                    yaw_step_deg: None
                },
                ManeuverTc::ResetBrake
            ])
        );
    }

    #[test]
    fn test_turn_by_angle_creeps_forward() {
        let mut mgr = DriveMgr::default();
        mgr.init(
            DriveMgrInit {
                params: DriveMgrParams::default(),
                world: RectWorld::default(),
            },
            None,
        )
        .unwrap();

        exec(
            &mut mgr,
            &ManeuverTc::TurnByAngle {
                angle_deg: 45.0,
                yaw_step_deg: None,
            },
        );
        while !mgr.is_idle() {
            mgr.proc(&(1.0 / 60.0)).unwrap();
            assert!(mgr.time_s() < 10.0);
        }

        let pose = mgr.pose();
        assert!((pose.heading() - 45f64.to_radians()).abs() < 1e-9);
        assert!(pose.x() > 0.0);
        assert!(pose.y() > 0.0);
    }

    #[test]
    fn test_exec_enqueues() {
        let mut mgr = DriveMgr::default();
        assert!(mgr.is_idle());

        exec(&mut mgr, &ManeuverTc::TurnLeft90);
        exec(&mut mgr, &ManeuverTc::Wait { duration_s: 1.0 });
        assert!(!mgr.is_idle());

        exec(&mut mgr, &ManeuverTc::Clear);
        assert!(mgr.is_idle());
    }
}
