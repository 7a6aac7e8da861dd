//! Trim and linearization core.
//!
//! This crate finds equilibrium ("trim") operating points of a [`Plant`] with a
//! Nelder–Mead simplex search over a hand-shaped cost functional, then builds a
//! continuous-time linear model around that point by finite differences.
//!
//! [`Plant`]: tl_plant::Plant

pub mod cost;
pub mod error;
pub mod jacobian;
pub mod simplex;
pub mod statespace;
pub mod trimmer;

pub use cost::CostFunction;
pub use error::{EvalError, EvalResult, SolverError, SolverResult};
pub use simplex::{
    BoundsPolicy, IterationReport, NelderMead, SimplexConfig, SimplexStatus, TrimSolution, Vertex,
};
pub use statespace::{DEFAULT_PERTURBATION, LinearModel, ReferencePoint, StateSpace};
pub use trimmer::{
    Constraints, CostWeights, PARAMETER_NAMES, TrimBounds, TrimMode, TrimParameters, TrimPoint,
    TrimResiduals, Trimmer, coordinated_turn_rate,
};
