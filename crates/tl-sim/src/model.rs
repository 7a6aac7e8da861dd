//! DynamicModel trait for integrable systems.

use crate::error::SimResult;

/// A continuous-time system `xdot = f(t, x)` whose state supports the vector
/// space operations the fixed-step integrators need.
pub trait DynamicModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Takes &mut self so models may cache intermediate results.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}
