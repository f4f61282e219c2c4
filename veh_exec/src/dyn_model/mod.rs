//! # Dynamics model
//!
//! Force based vehicle model: an engine with a torque curve drives the wheels
//! through a geartrain, and each wheel turns slip into friction limited
//! forces. [`DynamicsIntegrator`] ties these together and advances a
//! [`Pose`](crate::loc::Pose).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod engine;
mod geartrain;
mod integrator;
mod params;
mod wheel;

pub use engine::*;
pub use geartrain::*;
pub use integrator::*;
pub use params::*;
pub use wheel::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Gravitational acceleration.
///
/// Units: meters/second^2
pub const G: f64 = 9.81;
