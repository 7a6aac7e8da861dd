//! The narrow contract between the trim/linearization core and a dynamics model.

use crate::error::PlantResult;
use crate::quantity::Quantity;

/// A nonlinear dynamic system advanced in fixed time steps and accessed
/// through named scalar quantities.
///
/// Implementations own their full internal state. Callers hold the plant as
/// `&mut P` for the whole of a trim or linearization run, so no other code can
/// mutate it while perturbations and cost evaluations are in flight.
pub trait Plant {
    /// Set the fixed step used by every [`Plant::run_one_step`] call.
    fn set_time_step(&mut self, dt: f64);

    /// Current fixed step (seconds).
    fn time_step(&self) -> f64;

    /// Advance exactly one fixed-step frame.
    ///
    /// Returns [`PlantError::Diverged`](crate::PlantError::Diverged) when the
    /// integration produced a non-finite state.
    fn run_one_step(&mut self) -> PlantResult<()>;

    /// Read a named quantity.
    fn get(&self, quantity: &Quantity) -> PlantResult<f64>;

    /// Write a named quantity. Does not advance time.
    fn set(&mut self, quantity: &Quantity, value: f64) -> PlantResult<()>;

    /// Whether the plant can read `quantity`.
    fn has(&self, quantity: &Quantity) -> bool {
        self.get(quantity).is_ok()
    }

    /// Bring internal subsystems that no component is bound to (engine spool,
    /// actuator positions) to steady state for the current inputs.
    fn settle(&mut self) -> PlantResult<()> {
        Ok(())
    }

    /// Simulation time (seconds) accumulated by [`Plant::run_one_step`].
    fn sim_time(&self) -> f64 {
        0.0
    }
}
