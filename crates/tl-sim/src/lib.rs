//! Surrogate rigid-body aircraft plant.
//!
//! Provides:
//! - 6-DOF equations of motion over a linear stability-derivative aero model
//! - First-order actuators with rate limiting and engine spool lag
//! - Inverse-square gravity and an exponential atmosphere
//! - Point-mass mass balance with shaped inertia
//! - Fixed-step RK4 and forward Euler integrators
//! - A catalog of named models loaded from YAML

pub mod actuator;
pub mod aero;
pub mod aircraft;
pub mod catalog;
pub mod environment;
pub mod error;
pub mod integrator;
pub mod mass;
pub mod model;

pub use actuator::{ActuatorSet, Channel, FirstOrderActuator};
pub use aero::{AeroDef, EngineDef, ReferenceDef};
pub use aircraft::{Aircraft, AircraftDef, AircraftState};
pub use catalog::Catalog;
pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, IntegratorType, RK4};
pub use mass::{InertiaDef, MassDef, MassProperties, PointMass, Shape};
pub use model::DynamicModel;
