//! Objective functions for the simplex optimizer.

use crate::error::EvalResult;

/// A scalar objective over a parameter vector.
///
/// Evaluation may have side effects (a trim cost steps the plant), so it takes
/// `&mut self` and is not assumed idempotent.
pub trait CostFunction {
    fn eval(&mut self, params: &[f64]) -> EvalResult<f64>;
}

impl<F> CostFunction for F
where
    F: FnMut(&[f64]) -> EvalResult<f64>,
{
    fn eval(&mut self, params: &[f64]) -> EvalResult<f64> {
        self(params)
    }
}
