//! Per-wheel tyre force model
//!
//! Each physics step a wheel is first fed its load and kinematics in
//! [`Wheel::pre_step`], then [`Wheel::step`] computes the longitudinal and
//! lateral forces at the contact patch.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::Serialize;
use util::maths::clamp;

use super::{TireModelParams, WheelSpec};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mutable wheel state.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct WheelState {
    /// Actual steer angle.
    ///
    /// Units: degrees
    pub steer_deg: f64,

    /// Longitudinal slip ratio from the last step.
    pub slip_ratio: f64,

    /// Wear in [0, 1], never decreasing.
    pub wear: f64,

    /// Units: degrees celsius
    pub temp_c: f64,
}

/// Inputs cached by `pre_step` for the following `step`.
#[derive(Debug, Copy, Clone, Default)]
struct StepInputs {
    dt: f64,

    /// Units: newtons
    normal_load_n: f64,

    ground_mu: f64,

    /// Units: radians/second
    omega_rads: f64,

    /// Forward velocity at the wheel.
    ///
    /// Units: meters/second
    vx: f64,

    /// Lateral velocity at the wheel.
    ///
    /// Units: meters/second
    vy: f64,
}

/// A single wheel and tyre.
#[derive(Debug, Clone)]
pub struct Wheel {
    spec: WheelSpec,
    model: TireModelParams,

    target_steer_deg: f64,
    drive_torque_nm: f64,
    brake_torque_nm: f64,

    inputs: StepInputs,

    /// Units: newtons
    fx: f64,

    /// Units: newtons
    fy: f64,

    /// Friction limit used by the last step.
    ///
    /// Units: newtons
    force_limit_n: f64,

    state: WheelState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Wheel {
    pub fn new(spec: WheelSpec, model: TireModelParams) -> Self {
        let state = WheelState {
            temp_c: model.ambient_temp_c,
            ..Default::default()
        };

        Self {
            spec,
            model,
            target_steer_deg: 0.0,
            drive_torque_nm: 0.0,
            brake_torque_nm: 0.0,
            inputs: StepInputs::default(),
            fx: 0.0,
            fy: 0.0,
            force_limit_n: 0.0,
            state,
        }
    }

    pub fn spec(&self) -> &WheelSpec {
        &self.spec
    }

    pub fn state(&self) -> WheelState {
        self.state
    }

    /// Longitudinal force from the last step.
    ///
    /// Units: newtons
    pub fn fx(&self) -> f64 {
        self.fx
    }

    /// Lateral force from the last step.
    ///
    /// Units: newtons
    pub fn fy(&self) -> f64 {
        self.fy
    }

    /// Friction limit `mu_eff * load` used by the last step.
    pub fn force_limit_n(&self) -> f64 {
        self.force_limit_n
    }

    /// Set the steer angle to track, clamped to the wheel's maximum.
    pub fn set_target_steer_deg(&mut self, target_deg: f64) {
        let max = self.spec.max_steer_deg.max(0.0);
        self.target_steer_deg = clamp(target_deg, -max, max);
    }

    /// Set the drive torque, ignored by undriven wheels.
    pub fn set_drive_torque(&mut self, torque_nm: f64) {
        self.drive_torque_nm = if self.spec.driven { torque_nm } else { 0.0 };
    }

    /// Set the brake torque, ignored by unbraked wheels and floored at zero.
    pub fn set_brake_torque(&mut self, torque_nm: f64) {
        self.brake_torque_nm = if self.spec.braked {
            torque_nm.max(0.0)
        } else {
            0.0
        };
    }

    /// Cache the load and kinematics for this step and slew the steer angle
    /// toward its target.
    pub fn pre_step(
        &mut self,
        dt: f64,
        normal_load_n: f64,
        ground_mu: f64,
        omega_rads: f64,
        vx: f64,
        vy: f64,
    ) {
        self.inputs = StepInputs {
            dt: dt.max(0.0),
            normal_load_n: normal_load_n.max(0.0),
            ground_mu: ground_mu.max(0.0),
            omega_rads,
            vx,
            vy,
        };

        let max_delta = self.model.steer_rate_deg_s * self.inputs.dt;
        self.state.steer_deg += clamp(
            self.target_steer_deg - self.state.steer_deg,
            -max_delta,
            max_delta,
        );
    }

    /// Friction coefficient after wear and temperature losses.
    pub fn effective_mu(&self) -> f64 {
        let wear_loss = self.model.wear_mu_loss * self.state.wear;
        let temp_loss = if self.state.temp_c > self.model.hot_temp_c {
            self.model.hot_mu_loss
        } else {
            0.0
        };

        clamp(self.inputs.ground_mu * (1.0 - wear_loss - temp_loss), 0.0, 5.0)
    }

    /// Compute the contact patch forces from the inputs of the last
    /// `pre_step`, then accumulate wear and temperature.
    pub fn step(&mut self) {
        let m = &self.model;
        let inp = self.inputs;

        let radius = self.spec.radius_m.max(m.eps);
        let vx_abs = inp.vx.abs().max(m.eps);

        // Slip ratio
        let slip = (inp.omega_rads * radius - inp.vx) / vx_abs;
        self.state.slip_ratio = slip;

        // Friction limit
        let f_max = self.effective_mu() * inp.normal_load_n;
        self.force_limit_n = f_max;

        // Longitudinal: slip curve less rolling resistance plus applied torque
        let mut fx = f_max * (m.long_stiffness_b * m.long_shape_c * slip).tanh();

        let roll_sign = if inp.vx > m.eps {
            1.0
        } else if inp.vx < -m.eps {
            -1.0
        } else {
            0.0
        };
        fx -= self.spec.c_rolling * inp.normal_load_n * roll_sign;

        fx += (self.drive_torque_nm - self.brake_torque_nm) / radius;
        fx = clamp(fx, -f_max, f_max);

        // Lateral: resist sideways motion through the effective slip angle
        let slip_angle = (-inp.vy).atan2(vx_abs);
        let mut fy = f_max * (m.lat_stiffness_b * m.lat_shape_c * slip_angle).tanh();

        // Friction circle
        let f_total = fx.hypot(fy);
        if f_total > f_max && f_total > 0.0 {
            let scale = f_max / f_total;
            fx *= scale;
            fy *= scale;
        }

        self.fx = fx;
        self.fy = fy;

        // Wear and temperature from dissipated work
        let work = (fx * inp.vx).abs() + (fy * inp.vy).abs();
        let wear_gain = m.wear_per_joule * work * inp.dt;
        self.state.wear = clamp(self.state.wear + wear_gain, 0.0, 1.0);
        self.state.temp_c = clamp(
            self.state.temp_c + m.heat_to_wear_ratio * wear_gain - m.cool_rate_c_s * inp.dt,
            -20.0,
            200.0,
        );

        trace!(
            "Wheel: slip {:.3}, Fx {:.1} N, Fy {:.1} N, limit {:.1} N",
            slip,
            fx,
            fy,
            f_max
        );
    }
}
