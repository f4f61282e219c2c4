//! Dynamics integrator
//!
//! Runs one physics step of the force model in a fixed order:
//!
//! 1. Control bus to engine and wheels
//! 2. Engine update against the estimated load
//! 3. Torque distribution to the driven wheels
//! 4. Wheel pre-step with load and kinematics
//! 5. Wheel step
//! 6. Sum of longitudinal forces
//! 7. Speed and yaw integration
//! 8. Pose advance along the heading

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace, warn};
use serde::Serialize;
use util::maths::clamp;

use super::{
    Engine, EngineState, FuelTank, Geartrain, Surface, VehicleParams, Wheel, WheelState, G,
};
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Driver demands read by the integrator at the start of each step.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct ControlBus {
    throttle01: f64,
    brake01: f64,
    steer_deg: f64,
}

/// Summary of one integrator step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepReport {
    /// Units: newtons
    pub sum_fx_n: f64,

    /// Units: meters/second
    pub speed_ms: f64,

    pub engine: EngineState,

    pub wheels: Vec<WheelState>,
}

/// Force based vehicle model.
#[derive(Debug, Clone)]
pub struct DynamicsIntegrator {
    /// Units: kilograms
    mass_kg: f64,

    /// Units: meters
    wheelbase_m: f64,

    /// Units: newton meters
    brake_torque_max_nm: f64,

    surface: Surface,

    engine: Engine,
    wheels: Vec<Wheel>,
    geartrain: Geartrain,

    bus: ControlBus,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlBus {
    pub fn throttle01(&self) -> f64 {
        self.throttle01
    }

    pub fn brake01(&self) -> f64 {
        self.brake01
    }

    pub fn steer_deg(&self) -> f64 {
        self.steer_deg
    }

    pub fn set_throttle01(&mut self, throttle: f64) {
        self.throttle01 = clamp(throttle, 0.0, 1.0);
    }

    pub fn set_brake01(&mut self, brake: f64) {
        self.brake01 = clamp(brake, 0.0, 1.0);
    }

    pub fn set_steer_deg(&mut self, steer_deg: f64) {
        self.steer_deg = steer_deg;
    }
}

impl DynamicsIntegrator {
    /// Create an integrator from explicit components.
    pub fn new(
        mass_kg: f64,
        wheelbase_m: f64,
        brake_torque_max_nm: f64,
        surface: Surface,
        engine: Engine,
        wheels: Vec<Wheel>,
        geartrain: Geartrain,
    ) -> Self {
        let mass_kg = if mass_kg > 0.0 {
            mass_kg
        } else {
            warn!("Invalid vehicle mass {}, using 1 kg", mass_kg);
            1.0
        };

        Self {
            mass_kg,
            wheelbase_m: wheelbase_m.max(1e-3),
            brake_torque_max_nm: brake_torque_max_nm.max(0.0),
            surface,
            engine,
            wheels,
            geartrain,
            bus: ControlBus::default(),
        }
    }

    /// Build a vehicle of identical wheels from its parameters.
    pub fn from_params(params: &VehicleParams) -> Self {
        let wheels = (0..params.num_wheels.max(1))
            .map(|_| Wheel::new(params.wheel.clone(), params.tire.clone()))
            .collect();

        let mut engine = Engine::new(params.engine.clone(), params.engine_tuning.clone());
        if let Some(capacity) = params.fuel_capacity {
            engine = engine.with_tank(FuelTank::new(capacity));
        }

        debug!(
            "Built vehicle: {} kg, {} wheels, tank {:?}",
            params.mass_kg, params.num_wheels, params.fuel_capacity
        );

        Self::new(
            params.mass_kg,
            params.wheelbase_m,
            params.brake_torque_max_nm,
            params.surface,
            engine,
            wheels,
            Geartrain::new(params.final_drive_ratio),
        )
    }

    pub fn bus(&self) -> &ControlBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut ControlBus {
        &mut self.bus
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    pub fn set_surface(&mut self, surface: Surface) {
        self.surface = surface;
    }

    /// Advance the model by `dt` seconds, updating `pose` in place.
    pub fn step(&mut self, dt: f64, pose: &mut Pose) -> StepReport {
        let dt = dt.max(0.0);
        let speed = pose.speed.max(0.0);

        // Control bus
        self.engine.set_throttle(self.bus.throttle01);
        let brake_torque = self.bus.brake01 * self.brake_torque_max_nm;
        for wheel in self.wheels.iter_mut() {
            wheel.set_target_steer_deg(self.bus.steer_deg);
            wheel.set_brake_torque(brake_torque);
        }

        // Engine and geartrain
        let load_omega = self.geartrain.estimate_load_omega(speed, &self.wheels);
        let engine_torque = self.engine.update(dt, load_omega);
        self.geartrain
            .distribute_torque(engine_torque, &mut self.wheels);

        // Wheels
        let num_wheels = self.wheels.len().max(1) as f64;
        let load = self.mass_kg * G / num_wheels;
        for wheel in self.wheels.iter_mut() {
            let mu = wheel.spec().mu(self.surface);
            let radius = wheel.spec().radius_m.max(1e-6);
            wheel.pre_step(dt, load, mu, speed / radius, speed, 0.0);
            wheel.step();
        }

        // Forces and speed
        let sum_fx: f64 = self.wheels.iter().map(|w| w.fx()).sum();
        let new_speed = (speed + sum_fx / self.mass_kg * dt).max(0.0);

        // Yaw from the steerable wheels
        let steer: Vec<f64> = self
            .wheels
            .iter()
            .filter(|w| w.spec().max_steer_deg > 0.0)
            .map(|w| w.state().steer_deg)
            .collect();
        if !steer.is_empty() {
            let mean_steer = (steer.iter().sum::<f64>() / steer.len() as f64).to_radians();
            pose.rotate(new_speed * mean_steer.tan() / self.wheelbase_m * dt);
        }

        pose.speed = new_speed;
        pose.step(dt);

        trace!(
            "Dynamics: sum Fx {:.1} N, speed {:.3} m/s, heading {:.3} rad",
            sum_fx,
            new_speed,
            pose.heading()
        );

        StepReport {
            sum_fx_n: sum_fx,
            speed_ms: new_speed,
            engine: self.engine.state(),
            wheels: self.wheels.iter().map(|w| w.state()).collect(),
        }
    }
}
