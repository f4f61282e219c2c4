//! # Vehicle library.
//!
//! This library allows the executables and benches in the workspace to
//! access the modules defined inside the vehicle crate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Command executor - runs queued maneuvers one at a time
pub mod cmd_exec;

/// Drive manager - frame supervisor tying perception, safety, decisions and commands together
pub mod drive_mgr;

/// Dynamics model - engine, tyres, geartrain and the force integrator
pub mod dyn_model;

/// Localisation module - vehicle pose and body frames
pub mod loc;

/// Mount registry - named sites carrying sensors on the vehicle body
pub mod mount;

/// Perception - raycast and sector sweep sensors
pub mod per;

/// Maneuver telecommands
pub mod tc;

/// Turn decision policies
pub mod turn_policy;

/// Vehicle contexts - the interface maneuvers drive the vehicle through
pub mod veh_ctx;

/// World model - obstacles and intersections
pub mod world;
