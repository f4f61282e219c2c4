//! Main vehicle executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logger and parameters
//!     - Main loop:
//!         - Script telecommand processing
//!         - Drive manager processing:
//!             - Perception
//!             - Emergency brake guard
//!             - Intersection decisions
//!             - Command execution
//!         - Cycle management
//!
//! # Modules
//!
//! All cyclic modules (e.g. `drive_mgr`) shall provide a public struct
//! implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use structopt::StructOpt;

// Internal
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{Pending, ScriptInterpreter},
    session::Session,
    time::seconds_to_duration,
};
use veh_lib::{
    drive_mgr::{DriveMgr, DriveMgrInit, DriveMgrParams},
    tc::{self, ManeuverTc},
    world::{RectWorld, WorldError},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 1.0 / 60.0;

/// Targets whose per-frame output is capped at info.
const QUIET_TARGETS: [&str; 2] = ["veh_lib::per", "veh_lib::turn_policy"];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "veh_exec", about = "Frame cycle drive simulation")]
struct Opt {
    /// Maneuver script to run.
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Simulated duration, defaults to the end of the script.
    #[structopt(short, long)]
    duration: Option<f64>,

    /// World file, defaults to `world.toml` in the params directory.
    #[structopt(short, long, parse(from_os_str))]
    world: Option<PathBuf>,

    /// Sleep between cycles to run at wall clock speed.
    #[structopt(long)]
    realtime: bool,

    /// Log at trace level.
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("veh_exec", "sessions").wrap_err("Failed to create the session")?;

    let level = if opt.verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    logger_init(level, &QUIET_TARGETS, &session).wrap_err("Failed to initialise logging")?;

    info!("Vehicle Executable\n");
    info!(
        "Running on: {}",
        host::get_hostname().unwrap_or_else(|| "unknown host".into())
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: DriveMgrParams =
        util::params::load("drive_mgr.toml").wrap_err("Could not load drive manager params")?;

    let world = match opt.world {
        Some(ref p) => RectWorld::load(p),
        None => util::params::load("world.toml").map_err(WorldError::LoadError),
    }
    .wrap_err("Could not load the world")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE SCRIPT ----

    let mut script: Option<ScriptInterpreter<ManeuverTc>> = match opt.script {
        Some(ref p) => {
            info!("Loading script from {:?}", p);

            let si = ScriptInterpreter::new(p).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_cmds()
            );

            Some(si)
        }
        None => {
            info!("No script provided, the vehicle will cruise\n");
            None
        }
    };

    let duration_s = opt
        .duration
        .or_else(|| script.as_ref().map(|s| s.get_duration() + 5.0))
        .unwrap_or(30.0);

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut drive_mgr = DriveMgr::default();
    drive_mgr
        .init(DriveMgrInit { params, world }, Some(&session))
        .wrap_err("Failed to initialise DriveMgr")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop, running for {:.02} s\n", duration_s);

    let cycle_period = seconds_to_duration(CYCLE_PERIOD_S)
        .to_std()
        .wrap_err("Invalid cycle period")?;

    while drive_mgr.time_s() < duration_s {
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        if let Some(ref mut si) = script {
            match si.get_pending(drive_mgr.time_s()) {
                Pending::None => (),
                Pending::Some(tcs) => {
                    for t in tcs.iter() {
                        tc::exec(&mut drive_mgr, t);
                    }
                }
                Pending::EndOfScript => {
                    info!("End of script reached");
                    script = None;
                }
            }
        }

        // ---- DRIVE PROCESSING ----

        let (pose, status) = drive_mgr
            .proc(&CYCLE_PERIOD_S)
            .wrap_err("Error during DriveMgr processing")?;

        debug!(
            "t = {:.3}: ({:.2}, {:.2}) h = {:.1} deg, {:?}",
            status.time_s,
            pose.x(),
            pose.y(),
            pose.heading().to_degrees(),
            status.active_cmd
        );

        // ---- CYCLE MANAGEMENT ----

        if opt.realtime {
            match cycle_period.checked_sub(cycle_start_instant.elapsed()) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    (cycle_start_instant.elapsed() - cycle_period).as_secs_f64()
                ),
            }
        }
    }

    let last = *drive_mgr.last_status();
    session
        .save_json("final_status.json", &last)
        .wrap_err("Could not save the final status")?;

    info!(
        "Run complete at ({:.2}, {:.2}), emergency brake {}",
        last.x, last.y, last.emergency_brake
    );

    Ok(())
}
