//! # Straight line simulation
//!
//! Drives the force model in a straight line with a constant throttle and
//! prints the vehicle state at a fixed interval. Useful for checking engine
//! and tyre parameter changes without running the full drive simulation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Result};
use log::info;
use serde::Serialize;
use structopt::StructOpt;

use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};
use veh_lib::{
    dyn_model::{StepReport, VehicleParams},
    loc::Pose,
    veh_ctx::{DynamicsCtx, VehicleContext},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Physics step.
const DT_S: f64 = 1.0 / 120.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "straight_line", about = "Constant throttle force model run")]
struct Opt {
    /// Simulated duration in seconds.
    #[structopt(short, long, default_value = "10.0")]
    duration: f64,

    /// Throttle in [0, 1].
    #[structopt(short, long, default_value = "0.3")]
    throttle: f64,

    /// Interval between printed samples in seconds.
    #[structopt(short, long, default_value = "0.1")]
    sample: f64,

    /// Use the built in vehicle rather than `vehicle.toml`.
    #[structopt(long)]
    builtin: bool,
}

/// One printed sample.
#[derive(Debug, Serialize)]
struct Sample {
    time_s: f64,
    x: f64,
    y: f64,
    speed_ms: f64,
    rpm: f64,
    torque_nm: f64,
    fuel: Option<f64>,
    sum_fx_n: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("straight_line", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Info, &[], &session).wrap_err("Failed to initialise logging")?;

    let params: VehicleParams = if opt.builtin {
        VehicleParams::default()
    } else {
        util::params::load("vehicle.toml").wrap_err("Could not load vehicle params")?
    };

    let mut arch = Archiver::from_path(&session, "straight_line/samples.csv")
        .wrap_err("Failed to create the sample archive")?;

    info!(
        "Straight line run: {:.1} s at {:.2} throttle, {:.0} kg vehicle",
        opt.duration, opt.throttle, params.mass_kg
    );

    // ---- SIMULATION ----

    let mut ctx = DynamicsCtx::from_params(Pose::new(0.0, 0.0, 0.0), &params);
    ctx.integrator_mut().bus_mut().set_throttle01(opt.throttle);
    ctx.integrator_mut().bus_mut().set_brake01(0.0);
    ctx.integrator_mut().bus_mut().set_steer_deg(0.0);

    println!("time(s)\tx\ty\tspeed(m/s)\trpm\ttorque(Nm)\tfuel\tFx_sum");

    let mut t = 0.0;
    let mut next_print = 0.0;
    let mut report = StepReport::default();

    while t < opt.duration {
        report = ctx.step(DT_S);
        t += DT_S;

        if t >= next_print {
            let s = sample(t, &ctx, &report);
            print_sample(&format!("{:.2}", s.time_s), &s);
            arch.serialise(&s).wrap_err("Failed to archive sample")?;
            next_print += opt.sample.max(DT_S);
        }
    }

    let s = sample(t, &ctx, &report);
    print_sample("END", &s);

    info!("Finished at x = {:.2} with speed {:.2}", s.x, s.speed_ms);

    Ok(())
}

fn sample(t: f64, ctx: &DynamicsCtx, report: &StepReport) -> Sample {
    let pose = ctx.pose();

    Sample {
        time_s: t,
        x: pose.x(),
        y: pose.y(),
        speed_ms: report.speed_ms,
        rpm: report.engine.rpm,
        torque_nm: report.engine.torque_nm,
        fuel: report.engine.fuel_level,
        sum_fx_n: report.sum_fx_n,
    }
}

fn print_sample(label: &str, s: &Sample) {
    let fuel = match s.fuel {
        Some(f) => format!("{:.1}", f),
        None => "-".into(),
    };

    println!(
        "{}\t{:.2}\t{:.2}\t{:.2}\t{:.0}\t{:.0}\t{}\t{:.1}",
        label, s.x, s.y, s.speed_ms, s.rpm, s.torque_nm, fuel, s.sum_fx_n
    );
}
