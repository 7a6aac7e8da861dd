//! Trim cost functional.
//!
//! The [`Trimmer`] maps the six free trim parameters (throttle, elevator,
//! alpha, aileron, rudder, beta) to a non-negative scalar that is zero at an
//! equilibrium satisfying the flight [`Constraints`]. Attitude and body rates
//! are not free parameters: they are derived from the constraints for every
//! candidate, written into the plant together with the candidate, and the
//! plant is stepped once to observe the resulting accelerations.

use std::fmt;

use tl_core::constants::G0_FPS2;
use tl_core::inside_box;
use tl_plant::{Plant, Quantity, StateVector};

use crate::cost::CostFunction;
use crate::error::{EvalError, EvalResult, SolverError, SolverResult};

/// Number of free trim parameters.
pub const TRIM_DIMENSION: usize = 6;

/// Parameter order of every trim vector.
pub const PARAMETER_NAMES: [&str; TRIM_DIMENSION] =
    ["throttle", "elevator", "alpha", "aileron", "rudder", "beta"];

/// Kind of steady flight to trim for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimMode {
    #[default]
    NonTurning,
    Rolling,
    Pitching,
    Turning,
}

impl TrimMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrimMode::NonTurning => "non-turning",
            TrimMode::Rolling => "rolling",
            TrimMode::Pitching => "pitching",
            TrimMode::Turning => "turning",
        }
    }
}

impl fmt::Display for TrimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Yaw rate of a coordinated turn at bank `phi` and pitch `theta` (rad).
pub fn coordinated_turn_rate(phi: f64, theta: f64, velocity: f64, gravity: f64) -> f64 {
    phi.tan() * gravity * theta.cos() / velocity
}

/// Flight condition the trim must satisfy.
///
/// Units: ft/s, ft, rad, rad/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub velocity: f64,
    pub altitude: f64,
    /// Flight path angle.
    pub gamma: f64,
    pub mode: TrimMode,
    pub roll_rate: f64,
    pub pitch_rate: f64,
    pub yaw_rate: f64,
    /// Rolling mode only: the roll rate is about the stability x axis.
    pub stability_axis_roll: bool,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            velocity: 500.0,
            altitude: 1000.0,
            gamma: 0.0,
            mode: TrimMode::NonTurning,
            roll_rate: 0.0,
            pitch_rate: 0.0,
            yaw_rate: 0.0,
            stability_axis_roll: false,
        }
    }
}

impl Constraints {
    pub fn level(velocity: f64, altitude: f64, gamma: f64) -> Self {
        Self {
            velocity,
            altitude,
            gamma,
            ..Self::default()
        }
    }

    /// Steady roll at `roll_rate`.
    pub fn rolling(
        velocity: f64,
        altitude: f64,
        gamma: f64,
        roll_rate: f64,
        stability_axis: bool,
    ) -> Self {
        Self {
            mode: TrimMode::Rolling,
            roll_rate,
            stability_axis_roll: stability_axis,
            ..Self::level(velocity, altitude, gamma)
        }
    }

    /// Steady pull-up at `pitch_rate`.
    pub fn pitching(velocity: f64, altitude: f64, gamma: f64, pitch_rate: f64) -> Self {
        Self {
            mode: TrimMode::Pitching,
            pitch_rate,
            ..Self::level(velocity, altitude, gamma)
        }
    }

    /// Coordinated turn at bank `phi`; the yaw-rate target is derived from
    /// `phi`, `theta` and local gravity `g`.
    pub fn turning(velocity: f64, altitude: f64, gamma: f64, phi: f64, theta: f64, g: f64) -> Self {
        Self {
            mode: TrimMode::Turning,
            yaw_rate: coordinated_turn_rate(phi, theta, velocity, g),
            ..Self::level(velocity, altitude, gamma)
        }
    }

    /// Reject constraints no flight condition can satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if !self.velocity.is_finite() || self.velocity <= 0.0 {
            return Err(format!("velocity must be positive, got {}", self.velocity));
        }
        let targets = [
            ("altitude", self.altitude),
            ("gamma", self.gamma),
            ("roll rate", self.roll_rate),
            ("pitch rate", self.pitch_rate),
            ("yaw rate", self.yaw_rate),
        ];
        if let Some((name, v)) = targets.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{name} must be finite, got {v}"));
        }
        Ok(())
    }
}

/// Box and starting point of the trim search.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimBounds {
    pub lower: [f64; TRIM_DIMENSION],
    pub upper: [f64; TRIM_DIMENSION],
    pub step: [f64; TRIM_DIMENSION],
    pub guess: [f64; TRIM_DIMENSION],
}

impl Default for TrimBounds {
    fn default() -> Self {
        let a = 20.0_f64.to_radians();
        Self {
            lower: [0.0, -1.0, -a, -1.0, -1.0, -a],
            upper: [1.0, 1.0, a, 1.0, 1.0, a],
            step: [0.2, 0.1, 0.1, 0.1, 0.1, 0.1],
            guess: [0.5, 0.0, 0.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Weights of the cost terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostWeights {
    pub velocity: f64,
    pub aero_angles: f64,
    pub angular_accel: f64,
    pub rate_error: f64,
    pub climb: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            velocity: 1.0,
            aero_angles: 100.0,
            angular_accel: 10.0,
            rate_error: 10.0,
            climb: 1.0,
        }
    }
}

/// Named view of a trim vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrimParameters {
    pub throttle: f64,
    pub elevator: f64,
    pub alpha: f64,
    pub aileron: f64,
    pub rudder: f64,
    pub beta: f64,
}

impl TrimParameters {
    pub fn from_slice(v: &[f64]) -> Option<Self> {
        match *v {
            [throttle, elevator, alpha, aileron, rudder, beta] => Some(Self {
                throttle,
                elevator,
                alpha,
                aileron,
                rudder,
                beta,
            }),
            _ => None,
        }
    }

    pub fn to_array(&self) -> [f64; TRIM_DIMENSION] {
        [
            self.throttle,
            self.elevator,
            self.alpha,
            self.aileron,
            self.rudder,
            self.beta,
        ]
    }
}

/// Individual terms of the most recent cost evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrimResiduals {
    pub vt_dot: f64,
    pub alpha_dot: f64,
    pub beta_dot: f64,
    pub p_dot: f64,
    pub q_dot: f64,
    pub r_dot: f64,
    pub p_error: f64,
    pub q_error: f64,
    pub r_error: f64,
    /// `(hdot - V sin(gamma)) / V`
    pub climb_error: f64,
    pub cost: f64,
}

impl TrimResiduals {
    fn is_finite(&self) -> bool {
        [
            self.vt_dot,
            self.alpha_dot,
            self.beta_dot,
            self.p_dot,
            self.q_dot,
            self.r_dot,
            self.p_error,
            self.q_error,
            self.r_error,
            self.climb_error,
            self.cost,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Trimmed operating point for reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimPoint {
    pub params: TrimParameters,
    pub phi: f64,
    pub theta: f64,
    pub p: f64,
    pub q: f64,
    pub r: f64,
    pub cost: f64,
    pub residuals: TrimResiduals,
}

/// Attitude and body rates implied by the constraints for one candidate.
#[derive(Debug, Clone, Copy)]
struct DerivedState {
    phi: f64,
    theta: f64,
    p: f64,
    q: f64,
    r: f64,
}

/// Trim cost evaluator bound to a plant for the duration of a trim.
pub struct Trimmer<'p, P: Plant + ?Sized> {
    plant: &'p mut P,
    constraints: Constraints,
    bounds: TrimBounds,
    weights: CostWeights,
    observed: StateVector,
    last: Option<TrimResiduals>,
    evaluations: usize,
}

impl<'p, P: Plant + ?Sized> Trimmer<'p, P> {
    pub fn new(plant: &'p mut P, constraints: Constraints) -> SolverResult<Self> {
        constraints
            .validate()
            .map_err(|what| SolverError::Configuration { what })?;
        let observed = StateVector::from_quantities([
            Quantity::Vt,
            Quantity::Alpha,
            Quantity::Beta,
            Quantity::P,
            Quantity::Q,
            Quantity::R,
            Quantity::Alt,
        ])?;
        Ok(Self {
            plant,
            constraints,
            bounds: TrimBounds::default(),
            weights: CostWeights::default(),
            observed,
            last: None,
            evaluations: 0,
        })
    }

    pub fn with_bounds(mut self, bounds: TrimBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_weights(mut self, weights: CostWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn bounds(&self) -> &TrimBounds {
        &self.bounds
    }

    pub fn plant(&self) -> &P {
        &*self.plant
    }

    pub fn plant_mut(&mut self) -> &mut P {
        &mut *self.plant
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Residual terms of the last successful evaluation.
    pub fn last_residuals(&self) -> Option<&TrimResiduals> {
        self.last.as_ref()
    }

    /// Local gravity, falling back to standard gravity when the plant does not
    /// expose it.
    fn gravity(&self) -> f64 {
        if self.plant.has(&Quantity::Gravity) {
            if let Ok(g) = self.plant.get(&Quantity::Gravity) {
                if g.is_finite() && g > 0.0 {
                    return g;
                }
            }
        }
        G0_FPS2
    }

    /// Bank angle of a coordinated turn at the yaw-rate target (Stevens & Lewis).
    fn turn_coordination_phi(&self, alpha: f64, beta: f64) -> f64 {
        let c = &self.constraints;
        let g = self.gravity();
        let big_g = c.yaw_rate * c.velocity / g;
        let a = 1.0 - big_g * alpha.tan() * beta.sin();
        let b = c.gamma.sin() / beta.cos();
        let cc = 1.0 + big_g * big_g * beta.cos() * beta.cos();
        let num = (a - b * b)
            + b * alpha.tan() * (cc * (1.0 - b * b) + big_g * big_g * beta.sin().powi(2)).sqrt();
        let den = a * a - b * b * (1.0 + cc * alpha.tan().powi(2));
        (big_g * beta.cos() / alpha.cos() * num / den).atan()
    }

    /// Pitch attitude meeting the rate-of-climb constraint.
    fn climb_theta(&self, alpha: f64, beta: f64, phi: f64) -> f64 {
        let sg = self.constraints.gamma.sin();
        let a = alpha.cos() * beta.cos();
        let b = phi.sin() * beta.sin() + phi.cos() * alpha.sin() * beta.cos();
        ((a * b + sg * (a * a - sg * sg + b * b).sqrt()) / (a * a - sg * sg)).atan()
    }

    fn derive_state(&self, alpha: f64, beta: f64) -> DerivedState {
        let c = &self.constraints;
        let phi = match c.mode {
            TrimMode::Turning => self.turn_coordination_phi(alpha, beta),
            _ => 0.0,
        };
        let theta = self.climb_theta(alpha, beta, phi);

        let (p, q, r) = match c.mode {
            TrimMode::NonTurning => (0.0, 0.0, 0.0),
            TrimMode::Rolling if c.stability_axis_roll => {
                (c.roll_rate * alpha.cos(), 0.0, c.roll_rate * alpha.sin())
            }
            TrimMode::Rolling => (c.roll_rate, 0.0, 0.0),
            TrimMode::Pitching => (0.0, c.pitch_rate, 0.0),
            TrimMode::Turning => {
                let rt = c.yaw_rate;
                (
                    -rt * theta.sin(),
                    rt * phi.sin() * theta.cos(),
                    rt * phi.cos() * theta.cos(),
                )
            }
        };
        DerivedState {
            phi,
            theta,
            p,
            q,
            r,
        }
    }

    /// Write the candidate and its derived state into the plant.
    fn load(&mut self, x: &TrimParameters, d: &DerivedState) -> EvalResult<()> {
        let c = self.constraints;
        let writes = [
            (Quantity::ThrottleCmd, x.throttle),
            (Quantity::DaCmd, x.aileron),
            (Quantity::DeCmd, x.elevator),
            (Quantity::DrCmd, x.rudder),
            (Quantity::Vt, c.velocity),
            (Quantity::Alpha, x.alpha),
            (Quantity::Beta, x.beta),
            (Quantity::Phi, d.phi),
            (Quantity::Theta, d.theta),
            (Quantity::P, d.p),
            (Quantity::Q, d.q),
            (Quantity::R, d.r),
            (Quantity::Alt, c.altitude),
        ];
        for (q, v) in &writes {
            self.plant.set(q, *v)?;
        }
        self.plant.settle()?;
        Ok(())
    }

    fn check(&self, params: &[f64]) -> EvalResult<TrimParameters> {
        let x = TrimParameters::from_slice(params).ok_or_else(|| EvalError::Fatal {
            what: format!(
                "trim vector has {} entries, expected {TRIM_DIMENSION}",
                params.len()
            ),
        })?;
        self.constraints
            .validate()
            .map_err(|what| EvalError::Fatal { what })?;
        if !inside_box(params, &self.bounds.lower, &self.bounds.upper) {
            return Err(EvalError::OutOfBounds {
                what: format!("{params:?}"),
            });
        }
        Ok(x)
    }

    fn evaluate(&mut self, params: &[f64]) -> EvalResult<TrimResiduals> {
        let x = self.check(params)?;
        self.evaluations += 1;

        let d = self.derive_state(x.alpha, x.beta);
        if ![d.phi, d.theta, d.p, d.q, d.r].iter().all(|v| v.is_finite()) {
            return Err(EvalError::Diverged {
                what: format!("no attitude satisfies the constraints at alpha = {}", x.alpha),
            });
        }
        self.load(&x, &d)?;

        let dt = self.plant.time_step();
        let before = self.observed.snapshot(&*self.plant)?;
        self.plant.run_one_step()?;
        let rates = self.observed.rates(&*self.plant, &before, dt)?;
        let (p, q, r) = (
            self.plant.get(&Quantity::P)?,
            self.plant.get(&Quantity::Q)?,
            self.plant.get(&Quantity::R)?,
        );

        let c = &self.constraints;
        let w = &self.weights;
        let mut res = TrimResiduals {
            vt_dot: rates[0],
            alpha_dot: rates[1],
            beta_dot: rates[2],
            p_dot: rates[3],
            q_dot: rates[4],
            r_dot: rates[5],
            p_error: p - d.p,
            q_error: q - d.q,
            r_error: r - d.r,
            climb_error: (rates[6] - c.velocity * c.gamma.sin()) / c.velocity,
            cost: 0.0,
        };
        res.cost = w.velocity * res.vt_dot.powi(2)
            + w.aero_angles * (res.alpha_dot.powi(2) + res.beta_dot.powi(2))
            + w.angular_accel * (res.p_dot.powi(2) + res.q_dot.powi(2) + res.r_dot.powi(2))
            + w.rate_error * (res.p_error.powi(2) + res.q_error.powi(2) + res.r_error.powi(2))
            + w.climb * res.climb_error.powi(2);

        if !res.is_finite() {
            return Err(EvalError::Diverged {
                what: format!("non-finite trim residuals: {res:?}"),
            });
        }
        self.last = Some(res);
        Ok(res)
    }

    /// Load a solution into the plant and report the operating point.
    ///
    /// The candidate is evaluated once for its residuals, then the initial
    /// condition is rewritten so the plant sits exactly at the trim point
    /// rather than one step past it.
    pub fn apply(&mut self, params: &[f64]) -> SolverResult<TrimPoint> {
        let residuals = self.evaluate(params)?;
        let x = self.check(params)?;
        let d = self.derive_state(x.alpha, x.beta);
        self.load(&x, &d)?;
        tracing::debug!(cost = residuals.cost, ?x, "trim point applied");
        Ok(TrimPoint {
            params: x,
            phi: d.phi,
            theta: d.theta,
            p: d.p,
            q: d.q,
            r: d.r,
            cost: residuals.cost,
            residuals,
        })
    }
}

impl<P: Plant + ?Sized> CostFunction for Trimmer<'_, P> {
    fn eval(&mut self, params: &[f64]) -> EvalResult<f64> {
        let res = self.evaluate(params);
        if let Err(e) = &res {
            tracing::trace!(error = %e, ?params, "trim evaluation rejected");
        }
        res.map(|r| r.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_plant::TablePlant;

    /// Every quantity the trimmer writes, with a no-op step.
    fn steady_plant() -> TablePlant {
        let mut plant = TablePlant::new(0.01);
        for q in [
            Quantity::ThrottleCmd,
            Quantity::DaCmd,
            Quantity::DeCmd,
            Quantity::DrCmd,
            Quantity::Vt,
            Quantity::Alpha,
            Quantity::Beta,
            Quantity::Phi,
            Quantity::Theta,
            Quantity::P,
            Quantity::Q,
            Quantity::R,
            Quantity::Alt,
        ] {
            plant = plant.with_value(q, 0.0);
        }
        plant
    }

    #[test]
    fn turning_yaw_rate_target() {
        let r = coordinated_turn_rate(0.2, 0.05, 500.0, 32.174);
        let expected = 0.2_f64.tan() * 32.174 * 0.05_f64.cos() / 500.0;
        assert!((r - expected).abs() < 1e-15);
        assert!((r - 0.013_028).abs() < 1e-6);

        let c = Constraints::turning(500.0, 1000.0, 0.0, 0.2, 0.05, 32.174);
        assert_eq!(c.mode, TrimMode::Turning);
        assert_eq!(c.yaw_rate, r);
    }

    #[test]
    fn level_flight_theta_equals_alpha() {
        let mut plant = steady_plant();
        let t = Trimmer::new(&mut plant, Constraints::level(500.0, 1000.0, 0.0)).unwrap();
        let d = t.derive_state(0.07, 0.0);
        assert_eq!(d.phi, 0.0);
        assert!((d.theta - 0.07).abs() < 1e-12);
        assert_eq!((d.p, d.q, d.r), (0.0, 0.0, 0.0));
    }

    #[test]
    fn climbing_theta_adds_gamma() {
        let mut plant = steady_plant();
        let gamma = 3.0_f64.to_radians();
        let t = Trimmer::new(&mut plant, Constraints::level(500.0, 1000.0, gamma)).unwrap();
        let d = t.derive_state(0.05, 0.0);
        assert!((d.theta - (0.05 + gamma)).abs() < 1e-12);
    }

    #[test]
    fn stability_axis_roll_splits_rate() {
        let mut plant = steady_plant();
        let c = Constraints::rolling(500.0, 1000.0, 0.0, 0.5, true);
        let t = Trimmer::new(&mut plant, c).unwrap();
        let d = t.derive_state(0.1, 0.0);
        assert!((d.p - 0.5 * 0.1_f64.cos()).abs() < 1e-15);
        assert!((d.r - 0.5 * 0.1_f64.sin()).abs() < 1e-15);
    }

    #[test]
    fn body_axis_roll_is_pure_p() {
        let mut plant = steady_plant();
        let c = Constraints::rolling(500.0, 1000.0, 0.0, 0.5, false);
        let mut t = Trimmer::new(&mut plant, c).unwrap();
        let d = t.derive_state(0.1, 0.02);
        assert_eq!((d.p, d.q, d.r), (0.5, 0.0, 0.0));
        assert_eq!(d.phi, 0.0);

        t.eval(&[0.5, 0.0, 0.1, 0.0, 0.0, 0.02]).unwrap();
        assert_eq!(t.plant().get(&Quantity::P).unwrap(), 0.5);
        assert_eq!(t.plant().get(&Quantity::R).unwrap(), 0.0);
    }

    #[test]
    fn pitching_sets_only_q() {
        let mut plant = steady_plant();
        let c = Constraints::pitching(500.0, 1000.0, 0.0, 0.2);
        let mut t = Trimmer::new(&mut plant, c).unwrap();
        let d = t.derive_state(0.1, 0.02);
        assert_eq!((d.p, d.q, d.r), (0.0, 0.2, 0.0));
        assert_eq!(d.phi, 0.0);

        let cost = t.eval(&[0.5, 0.0, 0.1, 0.0, 0.0, 0.02]).unwrap();
        assert_eq!(t.plant().get(&Quantity::Q).unwrap(), 0.2);
        assert_eq!(t.plant().get(&Quantity::P).unwrap(), 0.0);
        // the plant holds q, so the rate target adds nothing
        assert_eq!(t.last_residuals().unwrap().q_error, 0.0);
        assert!(cost.is_finite());
    }

    #[test]
    fn turning_body_rates_follow_yaw_rate() {
        let mut plant = steady_plant();
        let c = Constraints::turning(500.0, 1000.0, 0.0, 0.3, 0.0, G0_FPS2);
        let t = Trimmer::new(&mut plant, c).unwrap();
        let d = t.derive_state(0.05, 0.0);
        // Level coordinated turn with zero sideslip recovers the commanded bank
        assert!((d.phi - 0.3).abs() < 1e-3, "phi = {}", d.phi);
        let rt = c.yaw_rate;
        assert!((d.p + rt * d.theta.sin()).abs() < 1e-15);
        assert!((d.r - rt * d.phi.cos() * d.theta.cos()).abs() < 1e-15);
    }

    #[test]
    fn steady_plant_has_zero_cost() {
        let mut plant = steady_plant();
        let mut t = Trimmer::new(&mut plant, Constraints::level(500.0, 1000.0, 0.0)).unwrap();
        let cost = t.eval(&[0.5, 0.0, 0.02, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(cost, 0.0);
        assert_eq!(t.evaluations(), 1);
        assert_eq!(t.plant().get(&Quantity::Vt).unwrap(), 500.0);
        assert_eq!(t.plant().get(&Quantity::ThrottleCmd).unwrap(), 0.5);
    }

    #[test]
    fn wrong_length_is_fatal() {
        let mut plant = steady_plant();
        let mut t = Trimmer::new(&mut plant, Constraints::default()).unwrap();
        assert!(matches!(t.eval(&[0.5, 0.0]), Err(EvalError::Fatal { .. })));
        assert_eq!(t.evaluations(), 0);
    }

    #[test]
    fn out_of_bounds_is_rejected_without_stepping() {
        let mut plant = steady_plant();
        let mut t = Trimmer::new(&mut plant, Constraints::default()).unwrap();
        assert!(matches!(
            t.eval(&[1.5, 0.0, 0.0, 0.0, 0.0, 0.0]),
            Err(EvalError::OutOfBounds { .. })
        ));
        assert_eq!(t.plant().sim_time(), 0.0);
    }

    #[test]
    fn invalid_constraints_are_configuration_errors() {
        let mut plant = steady_plant();
        let err = Trimmer::new(&mut plant, Constraints::level(0.0, 1000.0, 0.0))
            .err()
            .unwrap();
        assert!(matches!(err, SolverError::Configuration { .. }));
    }

    #[test]
    fn missing_quantity_is_fatal() {
        let mut plant = TablePlant::new(0.01).with_value(Quantity::Vt, 0.0);
        let mut t = Trimmer::new(&mut plant, Constraints::default()).unwrap();
        assert!(matches!(
            t.eval(&[0.5, 0.0, 0.0, 0.0, 0.0, 0.0]),
            Err(EvalError::Fatal { .. })
        ));
    }

    #[test]
    fn velocity_residual_is_weighted() {
        let mut plant = steady_plant().with_step(|values, dt| {
            // Vt' = 10 (throttle - 0.4)
            let thr = values[&Quantity::ThrottleCmd];
            if let Some(vt) = values.get_mut(&Quantity::Vt) {
                *vt += 10.0 * (thr - 0.4) * dt;
            }
            Ok(())
        });
        let mut t = Trimmer::new(&mut plant, Constraints::default()).unwrap();
        let cost = t.eval(&[0.5, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert!((cost - 1.0).abs() < 1e-9);
        let res = t.last_residuals().unwrap();
        assert!((res.vt_dot - 1.0).abs() < 1e-9);
        assert_eq!(res.alpha_dot, 0.0);
    }

    #[test]
    fn apply_leaves_plant_at_trim_point() {
        let mut plant = steady_plant().with_step(|values, dt| {
            if let Some(vt) = values.get_mut(&Quantity::Vt) {
                *vt += 3.0 * dt;
            }
            Ok(())
        });
        let mut t = Trimmer::new(&mut plant, Constraints::level(400.0, 500.0, 0.0)).unwrap();
        let point = t.apply(&[0.3, -0.1, 0.04, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(point.params.elevator, -0.1);
        assert!((point.theta - 0.04).abs() < 1e-12);
        assert_eq!(t.plant().get(&Quantity::Vt).unwrap(), 400.0);
        assert_eq!(t.plant().get(&Quantity::DeCmd).unwrap(), -0.1);
        assert!((point.cost - 9.0).abs() < 1e-6);
    }
}
