//! Nelder–Mead simplex optimizer with box bounds.
//!
//! The optimizer is a small state machine driven by [`NelderMead::update`].
//! The first call builds and evaluates the initial simplex; each later call
//! ranks the vertices, tests for termination and otherwise performs one
//! reflection / expansion / contraction / shrink transformation.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tl_core::{clamp_to_box, inside_box};

use crate::cost::CostFunction;
use crate::error::{EvalError, SolverError, SolverResult};
use crate::trimmer::TrimBounds;

/// Treatment of candidates that leave the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundsPolicy {
    /// Project onto the box, then evaluate.
    #[default]
    Clamp,
    /// Assign infinite cost without evaluating.
    Reject,
}

/// Optimizer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexStatus {
    Initializing,
    Iterating,
    Converged,
    MaxIterationsReached,
    Failed,
}

impl SimplexStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SimplexStatus::Converged | SimplexStatus::MaxIterationsReached | SimplexStatus::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimplexStatus::Initializing => "initializing",
            SimplexStatus::Iterating => "iterating",
            SimplexStatus::Converged => "converged",
            SimplexStatus::MaxIterationsReached => "max-iterations",
            SimplexStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SimplexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optimizer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexConfig {
    pub initial_guess: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Per-dimension offset of the initial vertices from the guess.
    pub initial_step: Vec<f64>,
    pub max_iterations: usize,
    pub rel_tol: f64,
    pub abs_tol: f64,
    /// Expansion coefficient; contraction and shrink use its reciprocal.
    pub speed: f64,
    /// Relative noise added to every cost; zero disables.
    pub random_scale: f64,
    pub seed: Option<u64>,
    pub show_convergence: bool,
    pub show_simplex: bool,
    pub bounds_policy: BoundsPolicy,
    /// Consecutive non-finite evaluations tolerated before failing; zero
    /// disables the check.
    pub max_consecutive_failures: usize,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self::from_bounds(&TrimBounds::default())
    }
}

impl SimplexConfig {
    /// Trim defaults over the given box.
    pub fn from_bounds(bounds: &TrimBounds) -> Self {
        Self {
            initial_guess: bounds.guess.to_vec(),
            lower: bounds.lower.to_vec(),
            upper: bounds.upper.to_vec(),
            initial_step: bounds.step.to_vec(),
            max_iterations: 2000,
            rel_tol: 10.0 * f64::from(f32::EPSILON),
            abs_tol: 10.0 * f64::EPSILON,
            speed: 2.0,
            random_scale: 0.0,
            seed: None,
            show_convergence: false,
            show_simplex: false,
            bounds_policy: BoundsPolicy::Clamp,
            max_consecutive_failures: 100,
        }
    }

    pub fn dimension(&self) -> usize {
        self.initial_guess.len()
    }

    pub fn validate(&self) -> SolverResult<()> {
        let n = self.initial_guess.len();
        if n == 0 {
            return Err(config_error("empty initial guess".to_string()));
        }
        for (what, len) in [
            ("lower bound", self.lower.len()),
            ("upper bound", self.upper.len()),
            ("initial step", self.initial_step.len()),
        ] {
            if len != n {
                return Err(SolverError::DimensionMismatch {
                    what,
                    expected: n,
                    got: len,
                });
            }
        }
        for i in 0..n {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(config_error(format!(
                    "lower bound must be below upper bound in dimension {i} ({lo} >= {hi})"
                )));
            }
            let step = self.initial_step[i];
            if !(step.is_finite() && step > 0.0) {
                return Err(config_error(format!(
                    "initial step must be positive in dimension {i}, got {step}"
                )));
            }
            if !self.initial_guess[i].is_finite() {
                return Err(config_error(format!("initial guess is not finite in dimension {i}")));
            }
        }
        if !(self.speed.is_finite() && self.speed > 1.0) {
            return Err(config_error(format!("speed must be > 1, got {}", self.speed)));
        }
        if !(self.rel_tol >= 0.0 && self.abs_tol >= 0.0) {
            return Err(config_error("tolerances must be non-negative".to_string()));
        }
        if !(self.random_scale.is_finite() && self.random_scale >= 0.0) {
            return Err(config_error(format!(
                "random scale must be non-negative, got {}",
                self.random_scale
            )));
        }
        Ok(())
    }
}

fn config_error(what: String) -> SolverError {
    SolverError::Configuration { what }
}

/// A simplex vertex: point and its (possibly infinite) cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub point: Vec<f64>,
    pub cost: f64,
}

/// Progress snapshot passed to the iteration callback.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub iteration: usize,
    pub evaluations: usize,
    pub best: Vec<f64>,
    pub best_cost: f64,
    /// `|f_worst - f_best|`
    pub spread: f64,
    /// `2 |f_worst - f_best| / (|f_worst| + |f_best|)`
    pub relative_spread: f64,
}

/// Result of a terminated search.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimSolution {
    pub params: Vec<f64>,
    pub cost: f64,
    pub status: SimplexStatus,
    pub iterations: usize,
    pub evaluations: usize,
}

impl TrimSolution {
    pub fn converged(&self) -> bool {
        self.status == SimplexStatus::Converged
    }

    /// Turn a non-converged result into [`SolverError::ConvergenceFailure`].
    pub fn require_converged(self) -> SolverResult<Self> {
        if self.converged() {
            Ok(self)
        } else {
            Err(SolverError::ConvergenceFailure {
                iterations: self.iterations,
                cost: self.cost,
            })
        }
    }
}

type Callback<'cb> = Box<dyn FnMut(&IterationReport) + 'cb>;

/// Nelder–Mead optimizer over a [`CostFunction`].
pub struct NelderMead<'cb, C: CostFunction> {
    cost: C,
    config: SimplexConfig,
    callback: Option<Callback<'cb>>,
    rng: Option<ChaCha8Rng>,
    status: SimplexStatus,
    vertices: Vec<Vertex>,
    best_seen: Option<Vertex>,
    iterations: usize,
    evaluations: usize,
    consecutive_failures: usize,
}

impl<'cb, C: CostFunction> NelderMead<'cb, C> {
    /// Validate `config` and prepare the search. Nothing is evaluated until
    /// the first [`NelderMead::update`].
    pub fn new(cost: C, config: SimplexConfig) -> SolverResult<Self> {
        config.validate()?;
        let rng = (config.random_scale > 0.0).then(|| match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        });
        Ok(Self {
            cost,
            config,
            callback: None,
            rng,
            status: SimplexStatus::Initializing,
            vertices: Vec::new(),
            best_seen: None,
            iterations: 0,
            evaluations: 0,
            consecutive_failures: 0,
        })
    }

    /// Called after every completed iteration.
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&IterationReport) + 'cb,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn status(&self) -> SimplexStatus {
        self.status
    }

    pub fn config(&self) -> &SimplexConfig {
        &self.config
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn cost_function(&self) -> &C {
        &self.cost
    }

    pub fn cost_function_mut(&mut self) -> &mut C {
        &mut self.cost
    }

    pub fn into_cost_function(self) -> C {
        self.cost
    }

    /// Advance the state machine by one step and return the new status.
    ///
    /// Terminal states are sticky. A fatal evaluation fault moves the
    /// optimizer to [`SimplexStatus::Failed`] and is returned as `Err`.
    pub fn update(&mut self) -> SolverResult<SimplexStatus> {
        match self.status {
            SimplexStatus::Initializing => self.initialize()?,
            SimplexStatus::Iterating => self.iterate()?,
            _ => {}
        }
        Ok(self.status)
    }

    /// Call [`NelderMead::update`] until a terminal state is reached.
    pub fn run(&mut self) -> SolverResult<TrimSolution> {
        while !self.status.is_terminal() {
            self.update()?;
        }
        self.solution()
    }

    /// Best vertex of a terminated search.
    pub fn solution(&self) -> SolverResult<TrimSolution> {
        if !self.status.is_terminal() {
            return Err(SolverError::NotTerminal {
                status: self.status.to_string(),
            });
        }
        let best = self
            .vertices
            .iter()
            .filter(|v| v.cost.is_finite())
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
            .or(self.best_seen.as_ref())
            .ok_or_else(|| SolverError::Evaluation {
                what: "no finite cost was ever evaluated".to_string(),
            })?;
        Ok(TrimSolution {
            params: best.point.clone(),
            cost: best.cost,
            status: self.status,
            iterations: self.iterations,
            evaluations: self.evaluations,
        })
    }

    fn initialize(&mut self) -> SolverResult<()> {
        let n = self.config.dimension();
        let mut x0 = self.config.initial_guess.clone();
        clamp_to_box(&mut x0, &self.config.lower, &self.config.upper);

        let mut points = Vec::with_capacity(n + 1);
        points.push(x0.clone());
        for i in 0..n {
            let mut xi = x0.clone();
            let step = self.config.initial_step[i];
            // Step inward when the guess sits on the upper face.
            xi[i] = if x0[i] + step <= self.config.upper[i] {
                x0[i] + step
            } else {
                x0[i] - step
            };
            points.push(xi);
        }

        self.vertices = Vec::with_capacity(n + 1);
        for p in points {
            let v = self.evaluate(p)?;
            self.vertices.push(v);
        }
        self.status = SimplexStatus::Iterating;
        self.check_failures();
        tracing::debug!(n, evaluations = self.evaluations, "simplex initialized");
        Ok(())
    }

    fn iterate(&mut self) -> SolverResult<()> {
        self.rank();

        let n = self.vertices.len() - 1;
        let fb = self.vertices[0].cost;
        let fw = self.vertices[n].cost;

        if fb.is_infinite() {
            tracing::warn!(iterations = self.iterations, "every simplex vertex has infinite cost");
            self.status = SimplexStatus::Failed;
            return Ok(());
        }

        let spread = (fw - fb).abs();
        let relative_spread = 2.0 * spread / (fw.abs() + fb.abs() + f64::MIN_POSITIVE);
        if self.config.show_convergence {
            tracing::info!(
                iteration = self.iterations,
                best = fb,
                spread,
                relative_spread,
                "simplex convergence"
            );
        }
        if spread < self.config.abs_tol || relative_spread < self.config.rel_tol {
            tracing::debug!(iterations = self.iterations, cost = fb, "simplex converged");
            self.status = SimplexStatus::Converged;
            return Ok(());
        }
        if self.iterations >= self.config.max_iterations {
            tracing::debug!(iterations = self.iterations, cost = fb, "simplex iteration cap");
            self.status = SimplexStatus::MaxIterationsReached;
            return Ok(());
        }

        self.transform()?;
        self.iterations += 1;
        self.check_failures();

        if self.callback.is_some() {
            let report = self.report();
            if let Some(cb) = self.callback.as_mut() {
                cb(&report);
            }
        }
        Ok(())
    }

    /// Sort vertices by non-decreasing cost.
    fn rank(&mut self) {
        self.vertices.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        if self.config.show_simplex {
            for (i, v) in self.vertices.iter().enumerate() {
                tracing::debug!(vertex = i, cost = v.cost, point = ?v.point, "simplex");
            }
        }
    }

    /// One Nelder–Mead transformation on a ranked simplex.
    fn transform(&mut self) -> SolverResult<()> {
        let n = self.vertices.len() - 1;
        let expand = self.config.speed;
        let contract = 1.0 / self.config.speed;

        let centroid = self.centroid();
        let worst = self.vertices[n].clone();
        let fb = self.vertices[0].cost;
        let fsw = self.vertices[n - 1].cost;

        let reflected = self.evaluate(along(&centroid, &worst.point, -1.0))?;

        if reflected.cost < fb {
            let expanded = self.evaluate(along(&centroid, &reflected.point, expand))?;
            self.vertices[n] = if expanded.cost < reflected.cost {
                expanded
            } else {
                reflected
            };
            return Ok(());
        }
        if reflected.cost < fsw {
            self.vertices[n] = reflected;
            return Ok(());
        }

        let contracted = if reflected.cost < worst.cost {
            let c = self.evaluate(along(&centroid, &reflected.point, contract))?;
            (c.cost <= reflected.cost).then_some(c)
        } else {
            let c = self.evaluate(along(&centroid, &worst.point, contract))?;
            (c.cost < worst.cost).then_some(c)
        };

        match contracted {
            Some(c) => self.vertices[n] = c,
            None => self.shrink(contract)?,
        }
        Ok(())
    }

    /// Pull every vertex toward the best one.
    fn shrink(&mut self, factor: f64) -> SolverResult<()> {
        let best = self.vertices[0].point.clone();
        for i in 1..self.vertices.len() {
            let p = along(&best, &self.vertices[i].point, factor);
            self.vertices[i] = self.evaluate(p)?;
        }
        Ok(())
    }

    /// Centroid of every vertex except the worst.
    fn centroid(&self) -> Vec<f64> {
        let n = self.vertices.len() - 1;
        let mut c = vec![0.0; self.config.dimension()];
        for v in &self.vertices[..n] {
            for (ci, xi) in c.iter_mut().zip(&v.point) {
                *ci += xi;
            }
        }
        for ci in &mut c {
            *ci /= n as f64;
        }
        c
    }

    /// Apply the bounds policy and evaluate one candidate.
    fn evaluate(&mut self, mut point: Vec<f64>) -> SolverResult<Vertex> {
        let (lower, upper) = (&self.config.lower, &self.config.upper);
        match self.config.bounds_policy {
            BoundsPolicy::Clamp => clamp_to_box(&mut point, lower, upper),
            BoundsPolicy::Reject => {
                if !inside_box(&point, lower, upper) {
                    tracing::trace!(?point, "candidate outside bounds rejected");
                    return Ok(Vertex {
                        point,
                        cost: f64::INFINITY,
                    });
                }
            }
        }

        self.evaluations += 1;
        let cost = match self.cost.eval(&point) {
            Ok(c) if c.is_finite() => c,
            Ok(c) => {
                tracing::debug!(cost = c, ?point, "non-finite cost");
                f64::INFINITY
            }
            Err(EvalError::Fatal { what }) => {
                tracing::error!(%what, ?point, "fatal evaluation fault");
                self.status = SimplexStatus::Failed;
                return Err(SolverError::Fatal { what });
            }
            Err(e) => {
                tracing::debug!(error = %e, ?point, "evaluation failed");
                f64::INFINITY
            }
        };

        if cost.is_finite() {
            self.consecutive_failures = 0;
            let vertex = Vertex {
                point: point.clone(),
                cost,
            };
            if self.best_seen.as_ref().is_none_or(|b| cost < b.cost) {
                self.best_seen = Some(vertex);
            }
        } else {
            self.consecutive_failures += 1;
        }

        Ok(Vertex {
            point,
            cost: self.perturb(cost),
        })
    }

    fn perturb(&mut self, cost: f64) -> f64 {
        match self.rng.as_mut() {
            Some(rng) if cost.is_finite() => {
                let u: f64 = rng.gen_range(-1.0..1.0);
                cost + self.config.random_scale * u * cost.abs()
            }
            _ => cost,
        }
    }

    fn check_failures(&mut self) {
        let limit = self.config.max_consecutive_failures;
        if limit > 0 && self.consecutive_failures >= limit {
            tracing::warn!(
                failures = self.consecutive_failures,
                "too many consecutive failed evaluations"
            );
            self.status = SimplexStatus::Failed;
        }
    }

    fn report(&self) -> IterationReport {
        let best = self
            .vertices
            .iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost));
        let worst = self
            .vertices
            .iter()
            .max_by(|a, b| a.cost.total_cmp(&b.cost));
        let (best_point, fb) = best.map(|v| (v.point.clone(), v.cost)).unwrap_or_default();
        let fw = worst.map(|v| v.cost).unwrap_or(fb);
        let spread = (fw - fb).abs();
        IterationReport {
            iteration: self.iterations,
            evaluations: self.evaluations,
            best: best_point,
            best_cost: fb,
            spread,
            relative_spread: 2.0 * spread / (fw.abs() + fb.abs() + f64::MIN_POSITIVE),
        }
    }
}

/// `origin + t * (toward - origin)`
fn along(origin: &[f64], toward: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(toward)
        .map(|(&o, &p)| o + t * (p - o))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalResult;
    use proptest::prelude::*;
    use std::cell::RefCell;

    fn bowl(target: Vec<f64>) -> impl FnMut(&[f64]) -> EvalResult<f64> {
        move |x: &[f64]| Ok(x.iter().zip(&target).map(|(a, b)| (a - b).powi(2)).sum())
    }

    fn small_config() -> SimplexConfig {
        SimplexConfig {
            initial_guess: vec![0.5, 0.5],
            lower: vec![-1.0, -1.0],
            upper: vec![1.0, 1.0],
            initial_step: vec![0.1, 0.1],
            ..SimplexConfig::default()
        }
    }

    #[test]
    fn default_config_matches_trim_box() {
        let c = SimplexConfig::default();
        assert_eq!(c.dimension(), 6);
        assert_eq!(c.max_iterations, 2000);
        assert_eq!(c.speed, 2.0);
        assert_eq!(c.bounds_policy, BoundsPolicy::Clamp);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn inverted_bounds_fail_before_any_evaluation() {
        let calls = RefCell::new(0usize);
        let cost = |_: &[f64]| -> EvalResult<f64> {
            *calls.borrow_mut() += 1;
            Ok(0.0)
        };
        let mut config = small_config();
        config.lower[1] = 1.0;
        let err = NelderMead::new(cost, config).err().unwrap();
        assert!(matches!(err, SolverError::Configuration { .. }));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn invalid_speed_and_step_are_rejected() {
        let mut c = small_config();
        c.speed = 1.0;
        assert!(matches!(c.validate(), Err(SolverError::Configuration { .. })));

        let mut c = small_config();
        c.initial_step[0] = 0.0;
        assert!(matches!(c.validate(), Err(SolverError::Configuration { .. })));

        let mut c = small_config();
        c.upper.pop();
        assert!(matches!(
            c.validate(),
            Err(SolverError::DimensionMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn first_update_initializes() {
        let mut nm = NelderMead::new(bowl(vec![0.0, 0.0]), small_config()).unwrap();
        assert_eq!(nm.status(), SimplexStatus::Initializing);
        assert!(nm.solution().is_err());
        assert_eq!(nm.update().unwrap(), SimplexStatus::Iterating);
        assert_eq!(nm.vertices().len(), 3);
        assert_eq!(nm.evaluations(), 3);
        assert_eq!(nm.iterations(), 0);
    }

    #[test]
    fn two_dimensional_bowl_converges() {
        let mut nm = NelderMead::new(bowl(vec![0.2, -0.3]), small_config()).unwrap();
        let sol = nm.run().unwrap();
        assert!(sol.converged());
        assert!((sol.params[0] - 0.2).abs() < 1e-6);
        assert!((sol.params[1] + 0.3).abs() < 1e-6);
    }

    #[test]
    fn iteration_cap_is_honoured() {
        let mut config = small_config();
        config.max_iterations = 5;
        let mut nm = NelderMead::new(bowl(vec![0.2, -0.3]), config).unwrap();
        let sol = nm.run().unwrap();
        assert_eq!(sol.status, SimplexStatus::MaxIterationsReached);
        assert_eq!(sol.iterations, 5);
        assert!(matches!(
            sol.require_converged(),
            Err(SolverError::ConvergenceFailure { iterations: 5, .. })
        ));
    }

    #[test]
    fn terminal_state_is_sticky() {
        let mut nm = NelderMead::new(bowl(vec![0.0, 0.0]), small_config()).unwrap();
        nm.run().unwrap();
        let evals = nm.evaluations();
        assert_eq!(nm.update().unwrap(), SimplexStatus::Converged);
        assert_eq!(nm.evaluations(), evals);
    }

    #[test]
    fn fatal_fault_fails_and_keeps_best() {
        let calls = RefCell::new(0usize);
        let cost = |x: &[f64]| -> EvalResult<f64> {
            let mut n = calls.borrow_mut();
            *n += 1;
            if *n > 10 {
                Err(EvalError::Fatal {
                    what: "plant lost".into(),
                })
            } else {
                Ok(x[0] * x[0] + x[1] * x[1])
            }
        };
        let mut nm = NelderMead::new(cost, small_config()).unwrap();
        let err = nm.run().unwrap_err();
        assert!(matches!(err, SolverError::Fatal { .. }));
        assert_eq!(nm.status(), SimplexStatus::Failed);
        let sol = nm.solution().unwrap();
        assert!(sol.cost.is_finite());
        assert!(!sol.converged());
    }

    #[test]
    fn persistent_divergence_fails() {
        let cost = |_: &[f64]| -> EvalResult<f64> {
            Err(EvalError::Diverged {
                what: "always".into(),
            })
        };
        let mut config = small_config();
        config.max_consecutive_failures = 3;
        let mut nm = NelderMead::new(cost, config).unwrap();
        assert_eq!(nm.update().unwrap(), SimplexStatus::Failed);
        assert!(nm.solution().is_err());
    }

    #[test]
    fn reject_policy_never_evaluates_outside() {
        let seen = RefCell::new(Vec::new());
        let cost = |x: &[f64]| -> EvalResult<f64> {
            seen.borrow_mut().push(x.to_vec());
            // Minimum outside the box, pushes the simplex into the upper face
            Ok((x[0] - 3.0).powi(2) + (x[1] - 3.0).powi(2))
        };
        let mut config = small_config();
        config.bounds_policy = BoundsPolicy::Reject;
        config.max_iterations = 200;
        let mut nm = NelderMead::new(cost, config).unwrap();
        nm.run().unwrap();
        let lo = [-1.0, -1.0];
        let hi = [1.0, 1.0];
        assert!(seen.borrow().iter().all(|p| inside_box(p, &lo, &hi)));
    }

    #[test]
    fn seeded_randomization_is_reproducible() {
        let run = || {
            let mut config = small_config();
            config.random_scale = 0.1;
            config.seed = Some(7);
            config.max_iterations = 50;
            let mut nm = NelderMead::new(bowl(vec![0.1, 0.1]), config).unwrap();
            nm.run().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn callback_sees_every_iteration() {
        let reports = RefCell::new(Vec::new());
        let mut config = small_config();
        config.max_iterations = 20;
        let mut nm = NelderMead::new(bowl(vec![0.2, -0.3]), config)
            .unwrap()
            .with_callback(|r: &IterationReport| reports.borrow_mut().push(r.clone()));
        let sol = nm.run().unwrap();
        drop(nm);
        let reports = reports.into_inner();
        assert_eq!(reports.len(), sol.iterations);
        for (i, r) in reports.iter().enumerate() {
            assert_eq!(r.iteration, i + 1);
        }
        assert!(reports.windows(2).all(|w| w[1].best_cost <= w[0].best_cost));
    }

    proptest! {
        #[test]
        fn clamp_policy_never_evaluates_outside(
            tx in -3.0f64..3.0,
            ty in -3.0f64..3.0,
            gx in -1.0f64..1.0,
            gy in -1.0f64..1.0,
        ) {
            let seen = RefCell::new(Vec::new());
            let cost = |x: &[f64]| -> EvalResult<f64> {
                seen.borrow_mut().push(x.to_vec());
                Ok((x[0] - tx).powi(2) + 3.0 * (x[1] - ty).powi(2))
            };
            let mut config = small_config();
            config.initial_guess = vec![gx, gy];
            config.max_iterations = 100;
            let mut nm = NelderMead::new(cost, config).unwrap();
            let sol = nm.run().unwrap();
            prop_assert!(sol.iterations <= 100);
            let lo = [-1.0, -1.0];
            let hi = [1.0, 1.0];
            prop_assert!(seen.borrow().iter().all(|p| inside_box(p, &lo, &hi)));
        }

        #[test]
        fn ranking_sorts_by_cost(costs in prop::collection::vec(-1e6f64..1e6, 2..8)) {
            let mut nm = NelderMead::new(bowl(vec![0.0, 0.0]), small_config()).unwrap();
            nm.vertices = costs
                .iter()
                .map(|&c| Vertex { point: vec![0.0, 0.0], cost: c })
                .collect();
            nm.vertices.push(Vertex { point: vec![0.0, 0.0], cost: f64::INFINITY });
            nm.rank();
            prop_assert!(nm.vertices.windows(2).all(|w| w[0].cost <= w[1].cost));
        }
    }
}
