//! Engine and fuel tank models

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, trace};
use serde::Serialize;
use util::maths::{clamp, lerp};

use super::{EngineSpec, EngineTuning};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Conversion from revolutions/minute to radians/second.
const RPM_TO_RADS: f64 = std::f64::consts::TAU / 60.0;

/// Fuel level at or below which a tank counts as empty.
const EMPTY_LEVEL: f64 = 1e-4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A fuel tank.
#[derive(Debug, Clone, Serialize)]
pub struct FuelTank {
    capacity: f64,
    level: f64,
}

/// Engine model with a three segment torque curve.
#[derive(Debug, Clone)]
pub struct Engine {
    spec: EngineSpec,
    tuning: EngineTuning,
    tank: Option<FuelTank>,

    /// Units: revolutions/minute
    rpm: f64,

    /// Units: radians/second
    omega: f64,

    throttle: f64,

    /// Units: newton meters
    torque_nm: f64,

    stalled: bool,
}

/// Snapshot of the engine state.
#[derive(Debug, Copy, Clone, Default, Serialize)]
pub struct EngineState {
    pub rpm: f64,
    pub throttle: f64,
    pub torque_nm: f64,
    pub stalled: bool,
    pub fuel_level: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FuelTank {
    /// Create a full tank.
    pub fn new(capacity: f64) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            capacity,
            level: capacity,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Remove fuel from the tank, never going below empty.
    pub fn consume(&mut self, amount: f64) {
        if amount > 0.0 {
            self.level = (self.level - amount).max(0.0);
        }
    }

    /// Add fuel to the tank, never going above capacity.
    pub fn refuel(&mut self, amount: f64) {
        if amount > 0.0 {
            self.level = (self.level + amount).min(self.capacity);
        }
    }

    pub fn refuel_full(&mut self) {
        self.level = self.capacity;
    }

    pub fn is_empty(&self) -> bool {
        self.level <= EMPTY_LEVEL
    }
}

impl EngineSpec {
    /// Full throttle torque at the given engine speed.
    ///
    /// Rises linearly from half peak (at zero) to idle, jumps to 60 % of peak
    /// at idle and climbs to the peak, then falls to 40 % of peak at the
    /// redline. Above the redline no torque is produced.
    pub fn torque_at_rpm(&self, rpm: f64) -> f64 {
        let peak = self.peak_torque_nm;

        if rpm <= self.idle_rpm {
            0.5 * peak * (rpm.max(0.0) / self.idle_rpm.max(1.0))
        } else if rpm <= self.peak_torque_rpm {
            let t = (rpm - self.idle_rpm) / (self.peak_torque_rpm - self.idle_rpm).max(1.0);
            lerp(0.6 * peak, peak, clamp(t, 0.0, 1.0))
        } else if rpm <= self.redline_rpm {
            let t = (rpm - self.peak_torque_rpm) / (self.redline_rpm - self.peak_torque_rpm).max(1.0);
            lerp(peak, 0.4 * peak, clamp(t, 0.0, 1.0))
        } else {
            0.0
        }
    }
}

impl Engine {
    /// Create a new engine idling, without a fuel tank.
    pub fn new(spec: EngineSpec, tuning: EngineTuning) -> Self {
        let rpm = clamp(spec.idle_rpm, 0.0, spec.redline_rpm);
        Self {
            spec,
            tuning,
            tank: None,
            rpm,
            omega: rpm * RPM_TO_RADS,
            throttle: 0.0,
            torque_nm: 0.0,
            stalled: false,
        }
    }

    /// Attach a fuel tank to the engine.
    pub fn with_tank(mut self, tank: FuelTank) -> Self {
        self.tank = Some(tank);
        self
    }

    pub fn spec(&self) -> &EngineSpec {
        &self.spec
    }

    pub fn tank(&self) -> Option<&FuelTank> {
        self.tank.as_ref()
    }

    /// Set the throttle demand, clamped to [0, 1].
    pub fn set_throttle(&mut self, throttle: f64) {
        self.throttle = clamp(throttle, 0.0, 1.0);
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    pub fn torque_nm(&self) -> f64 {
        self.torque_nm
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn state(&self) -> EngineState {
        EngineState {
            rpm: self.rpm,
            throttle: self.throttle,
            torque_nm: self.torque_nm,
            stalled: self.stalled,
            fuel_level: self.tank.as_ref().map(|t| t.level()),
        }
    }

    /// Add fuel. A stalled engine restarts once its tank holds fuel again.
    ///
    /// Returns false if the engine has no tank.
    pub fn refuel(&mut self, amount: f64) -> bool {
        match self.tank {
            Some(ref mut t) => {
                t.refuel(amount);
                self.try_restart();
                true
            }
            None => false,
        }
    }

    /// Fill the tank completely, restarting a stalled engine.
    pub fn refuel_full(&mut self) -> bool {
        match self.tank {
            Some(ref mut t) => {
                t.refuel_full();
                self.try_restart();
                true
            }
            None => false,
        }
    }

    /// Advance the engine by `dt` seconds against a load turning at
    /// `load_omega` radians/second, returning the output torque.
    pub fn update(&mut self, dt: f64, load_omega: f64) -> f64 {
        let dt = dt.max(0.0);

        // Fuel
        self.burn_fuel(dt);

        // A stalled engine produces nothing and spins down
        if self.stalled {
            self.torque_nm = 0.0;
            self.rpm = (self.rpm - self.tuning.stall_decay_rpm_s * dt).max(0.0);
            self.omega = self.rpm * RPM_TO_RADS;
            return self.torque_nm;
        }

        // Clutch coupling to the load
        let target_omega = if self.tuning.hold_idle {
            load_omega.max(self.spec.idle_rpm * RPM_TO_RADS)
        } else {
            load_omega
        };
        self.omega += (target_omega - self.omega) * self.tuning.sync_k * dt;

        // Torque from the curve scaled by throttle, less self damping
        let base_torque = self.spec.torque_at_rpm(self.rpm).max(0.0);
        let damping = self.tuning.self_damping_k * self.omega;
        self.torque_nm = (base_torque * self.throttle - damping).max(0.0);

        // Integrate
        let inertia = self.spec.inertia_kgm2.max(1e-4);
        self.omega += self.torque_nm / inertia * dt;
        self.rpm = clamp(self.omega / RPM_TO_RADS, 0.0, self.spec.redline_rpm);
        self.omega = self.rpm * RPM_TO_RADS;

        if self.rpm >= self.spec.redline_rpm && self.tuning.redline_cutoff {
            self.torque_nm = 0.0;
        }

        if self.rpm <= 0.0 {
            info!("Engine stalled: speed decayed to zero");
            self.stalled = true;
        }

        trace!(
            "Engine: rpm {:.0}, torque {:.1} Nm, throttle {:.2}",
            self.rpm,
            self.torque_nm,
            self.throttle
        );

        self.torque_nm
    }

    fn burn_fuel(&mut self, dt: f64) {
        if self.stalled {
            return;
        }

        if let Some(ref mut tank) = self.tank {
            let rate = (self.spec.full_throttle_fuel_rate * self.throttle).max(0.0);
            tank.consume(rate * dt);

            if tank.is_empty() {
                info!("Engine stalled: fuel tank empty");
                self.stalled = true;
            }
        }
    }

    fn try_restart(&mut self) {
        let has_fuel = self.tank.as_ref().map(|t| !t.is_empty()).unwrap_or(true);

        if self.stalled && has_fuel {
            info!("Engine restarted");
            self.stalled = false;
            self.rpm = self.rpm.max(self.spec.idle_rpm.min(self.spec.redline_rpm));
            self.omega = self.rpm * RPM_TO_RADS;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: f64 = 1.0 / 120.0;

    #[test]
    fn test_torque_curve() {
        let spec = EngineSpec::default();

        assert_eq!(spec.torque_at_rpm(0.0), 0.0);
        assert!((spec.torque_at_rpm(450.0) - 55.0).abs() < 1e-9);
        assert!((spec.torque_at_rpm(900.0) - 110.0).abs() < 1e-9);
        assert!((spec.torque_at_rpm(900.0 + 1e-9) - 132.0).abs() < 1e-6);
        assert!((spec.torque_at_rpm(4000.0) - 220.0).abs() < 1e-9);
        assert!((spec.torque_at_rpm(7000.0) - 88.0).abs() < 1e-9);
        assert_eq!(spec.torque_at_rpm(7001.0), 0.0);
    }

    #[test]
    fn test_fuel_tank() {
        let mut tank = FuelTank::new(10.0);
        tank.consume(4.0);
        assert_eq!(tank.level(), 6.0);
        tank.consume(-1.0);
        assert_eq!(tank.level(), 6.0);
        tank.consume(100.0);
        assert!(tank.is_empty());
        tank.refuel(3.0);
        assert_eq!(tank.level(), 3.0);
        tank.refuel(30.0);
        assert_eq!(tank.level(), 10.0);
        tank.consume(10.0);
        tank.refuel_full();
        assert_eq!(tank.level(), 10.0);
    }

    #[test]
    fn test_stall_until_refuel() {
        let mut engine =
            Engine::new(EngineSpec::default(), EngineTuning::default()).with_tank(FuelTank::new(0.05));
        engine.set_throttle(1.0);

        // 0.05 units at 1.2 units/s lasts ~5 frames
        let mut steps = 0;
        while !engine.is_stalled() {
            engine.update(DT, 0.0);
            steps += 1;
            assert!(steps < 100, "engine never stalled");
        }

        let rpm_at_stall = engine.rpm();
        for _ in 0..240 {
            assert_eq!(engine.update(DT, 50.0), 0.0);
            assert!(engine.is_stalled());
            assert_eq!(engine.torque_nm(), 0.0);
        }
        assert!(engine.rpm() < rpm_at_stall);

        assert!(engine.refuel(1.0));
        assert!(!engine.is_stalled());
        assert!(engine.update(DT, 0.0) > 0.0);
    }

    #[test]
    fn test_rpm_bounded_by_redline() {
        let mut engine = Engine::new(EngineSpec::default(), EngineTuning::default());
        engine.set_throttle(1.0);

        // Load spinning far beyond the redline drags the engine up to it
        for _ in 0..2000 {
            engine.update(DT, 2000.0);
            assert!(engine.rpm() <= engine.spec().redline_rpm);
        }
        assert_eq!(engine.rpm(), engine.spec().redline_rpm);
        assert_eq!(engine.torque_nm(), 0.0);
    }

    #[test]
    fn test_zero_rpm_stall_without_idle_hold() {
        let tuning = EngineTuning {
            hold_idle: false,
            sync_k: 100.0,
            ..Default::default()
        };
        let mut engine = Engine::new(EngineSpec::default(), tuning);

        // No throttle and a locked load, the crank is dragged to zero
        for _ in 0..240 {
            engine.update(0.01, 0.0);
        }
        assert!(engine.is_stalled());
        assert!(!engine.refuel(1.0));
    }
}
