//! Geartrain between the engine and the driven wheels

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;

use super::Wheel;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed-ratio geartrain splitting torque equally across driven wheels.
#[derive(Debug, Clone)]
pub struct Geartrain {
    final_drive_ratio: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Geartrain {
    /// Create a new geartrain, a non-positive ratio is replaced by 1.
    pub fn new(final_drive_ratio: f64) -> Self {
        let final_drive_ratio = if final_drive_ratio > 0.0 {
            final_drive_ratio
        } else {
            warn!(
                "Invalid final drive ratio {}, using 1.0",
                final_drive_ratio
            );
            1.0
        };

        Self { final_drive_ratio }
    }

    pub fn final_drive_ratio(&self) -> f64 {
        self.final_drive_ratio
    }

    /// Estimate the engine side angular velocity of the load from the
    /// vehicle speed and the average radius of the driven wheels.
    ///
    /// Units: radians/second
    pub fn estimate_load_omega(&self, speed_ms: f64, wheels: &[Wheel]) -> f64 {
        let radii: Vec<f64> = wheels
            .iter()
            .filter(|w| w.spec().driven)
            .map(|w| w.spec().radius_m)
            .collect();

        if radii.is_empty() {
            return 0.0;
        }

        let avg_radius = radii.iter().sum::<f64>() / radii.len() as f64;
        if avg_radius <= 0.0 {
            return 0.0;
        }

        speed_ms.max(0.0) / avg_radius * self.final_drive_ratio
    }

    /// Split the engine torque equally across the driven wheels.
    pub fn distribute_torque(&self, engine_torque_nm: f64, wheels: &mut [Wheel]) {
        let num_driven = wheels.iter().filter(|w| w.spec().driven).count();
        if num_driven == 0 {
            return;
        }

        let per_wheel = engine_torque_nm * self.final_drive_ratio / num_driven as f64;
        for wheel in wheels.iter_mut().filter(|w| w.spec().driven) {
            wheel.set_drive_torque(per_wheel);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dyn_model::{TireModelParams, WheelSpec};

    fn wheels() -> Vec<Wheel> {
        let driven = WheelSpec::default();
        let free = WheelSpec {
            driven: false,
            radius_m: 0.5,
            ..Default::default()
        };
        vec![
            Wheel::new(driven.clone(), TireModelParams::default()),
            Wheel::new(driven, TireModelParams::default()),
            Wheel::new(free, TireModelParams::default()),
        ]
    }

    #[test]
    fn test_load_omega() {
        let gt = Geartrain::new(2.0);
        let ws = wheels();

        // Only the driven wheels (0.3 m) count
        assert!((gt.estimate_load_omega(3.0, &ws) - 20.0).abs() < 1e-9);
        assert_eq!(gt.estimate_load_omega(-3.0, &ws), 0.0);
        assert_eq!(gt.estimate_load_omega(3.0, &[]), 0.0);
    }

    #[test]
    fn test_distribute_torque() {
        let gt = Geartrain::new(1.0);
        let mut ws = wheels();
        gt.distribute_torque(120.0, &mut ws);

        for w in ws.iter_mut() {
            w.pre_step(0.01, 1e6, 1.0, 0.0, 0.0, 0.0);
            w.step();
        }

        // 60 Nm over 0.3 m on each driven wheel, nothing on the free one
        assert!((ws[0].fx() - 200.0).abs() < 1e-6);
        assert!((ws[1].fx() - 200.0).abs() < 1e-6);
        assert_eq!(ws[2].fx(), 0.0);
    }

    #[test]
    fn test_invalid_ratio() {
        assert_eq!(Geartrain::new(0.0).final_drive_ratio(), 1.0);
    }
}
