//! Parameters structures for the dynamics model

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed engine characteristics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSpec {
    /// Units: revolutions/minute
    pub idle_rpm: f64,

    /// Units: revolutions/minute
    pub redline_rpm: f64,

    /// Units: newton meters
    pub peak_torque_nm: f64,

    /// Engine speed at which the peak torque is produced.
    ///
    /// Units: revolutions/minute
    pub peak_torque_rpm: f64,

    /// Rotational inertia of the crank and flywheel.
    ///
    /// Units: kilogram meters^2
    pub inertia_kgm2: f64,

    /// Fuel burn at full throttle.
    ///
    /// Units: fuel units/second
    pub full_throttle_fuel_rate: f64,
}

/// Numerical tuning of the engine model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    /// Strength of the coupling between the engine and load angular
    /// velocities.
    ///
    /// Units: 1/seconds
    pub sync_k: f64,

    /// Self damping torque per unit of angular velocity.
    ///
    /// Units: newton meter seconds/radian
    pub self_damping_k: f64,

    /// Rate at which a stalled engine spins down.
    ///
    /// Units: revolutions/minute/second
    pub stall_decay_rpm_s: f64,

    /// If true the torque is cut while the engine sits at the redline.
    pub redline_cutoff: bool,

    /// If true the clutch slips rather than drag a running engine below its
    /// idle speed.
    pub hold_idle: bool,
}

/// Fixed wheel characteristics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WheelSpec {
    /// Units: meters
    pub radius_m: f64,

    /// Units: meters
    pub width_m: f64,

    /// Maximum absolute steer angle, zero for a wheel that does not steer.
    ///
    /// Units: degrees
    pub max_steer_deg: f64,

    /// The wheel receives engine torque.
    pub driven: bool,

    /// The wheel receives brake torque.
    pub braked: bool,

    pub mu_dry: f64,

    pub mu_wet: f64,

    /// Rolling resistance as a fraction of the normal load.
    pub c_rolling: f64,
}

/// Tuning of the tyre force, wear and temperature model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TireModelParams {
    /// Maximum steer slew rate.
    ///
    /// Units: degrees/second
    pub steer_rate_deg_s: f64,

    /// Longitudinal curve stiffness, B in `tanh(B * C * slip)`.
    pub long_stiffness_b: f64,

    /// Longitudinal curve shape, C in `tanh(B * C * slip)`.
    pub long_shape_c: f64,

    /// Lateral curve stiffness.
    pub lat_stiffness_b: f64,

    /// Lateral curve shape.
    pub lat_shape_c: f64,

    /// Wear gained per joule of dissipated work.
    pub wear_per_joule: f64,

    /// Temperature rise relative to wear rise.
    pub heat_to_wear_ratio: f64,

    /// Units: degrees celsius/second
    pub cool_rate_c_s: f64,

    /// Units: degrees celsius
    pub ambient_temp_c: f64,

    /// Fraction of grip lost at full wear.
    pub wear_mu_loss: f64,

    /// Above this temperature grip is reduced by `hot_mu_loss`.
    ///
    /// Units: degrees celsius
    pub hot_temp_c: f64,

    pub hot_mu_loss: f64,

    /// Floor on the velocity denominators of the slip computations.
    ///
    /// Units: meters/second
    pub eps: f64,
}

/// Road surface condition, selecting which friction coefficient is used.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub enum Surface {
    Dry,
    Wet,
}

/// Parameters of a complete vehicle for the force model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    /// Units: kilograms
    pub mass_kg: f64,

    /// Distance between axles used for the yaw rate.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    pub num_wheels: usize,

    /// Brake torque per wheel at full brake demand.
    ///
    /// Units: newton meters
    pub brake_torque_max_nm: f64,

    /// Ratio between engine and wheel angular velocity.
    pub final_drive_ratio: f64,

    /// Fuel tank capacity, `None` for an engine which never runs dry.
    ///
    /// Units: fuel units
    pub fuel_capacity: Option<f64>,

    pub surface: Surface,

    pub engine: EngineSpec,

    pub engine_tuning: EngineTuning,

    pub wheel: WheelSpec,

    pub tire: TireModelParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for EngineSpec {
    fn default() -> Self {
        Self {
            idle_rpm: 900.0,
            redline_rpm: 7000.0,
            peak_torque_nm: 220.0,
            peak_torque_rpm: 4000.0,
            inertia_kgm2: 0.25,
            full_throttle_fuel_rate: 1.2,
        }
    }
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            sync_k: 5.0,
            self_damping_k: 0.02,
            stall_decay_rpm_s: 2000.0,
            redline_cutoff: true,
            hold_idle: true,
        }
    }
}

impl Default for WheelSpec {
    /// A plain wooden wheel.
    fn default() -> Self {
        Self {
            radius_m: 0.30,
            width_m: 0.12,
            max_steer_deg: 35.0,
            driven: true,
            braked: true,
            mu_dry: 0.6,
            mu_wet: 0.35,
            c_rolling: 0.015,
        }
    }
}

impl Default for TireModelParams {
    fn default() -> Self {
        Self {
            steer_rate_deg_s: 720.0,
            long_stiffness_b: 8.0,
            long_shape_c: 1.3,
            lat_stiffness_b: 6.0,
            lat_shape_c: 1.2,
            wear_per_joule: 1e-7,
            heat_to_wear_ratio: 8.0,
            cool_rate_c_s: 0.05,
            ambient_temp_c: 20.0,
            wear_mu_loss: 0.3,
            hot_temp_c: 120.0,
            hot_mu_loss: 0.15,
            eps: 1e-4,
        }
    }
}

impl Default for Surface {
    fn default() -> Self {
        Surface::Dry
    }
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            mass_kg: 800.0,
            wheelbase_m: 2.5,
            num_wheels: 4,
            brake_torque_max_nm: 3000.0,
            final_drive_ratio: 1.0,
            fuel_capacity: Some(100.0),
            surface: Surface::Dry,
            engine: EngineSpec::default(),
            engine_tuning: EngineTuning::default(),
            wheel: WheelSpec::default(),
            tire: TireModelParams::default(),
        }
    }
}

impl WheelSpec {
    /// Friction coefficient of this wheel on the given surface.
    pub fn mu(&self, surface: Surface) -> f64 {
        match surface {
            Surface::Dry => self.mu_dry,
            Surface::Wet => self.mu_wet,
        }
    }
}
