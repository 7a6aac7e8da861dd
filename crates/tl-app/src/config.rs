//! Trim run configuration.
//!
//! Loaded from YAML; every field has a default so an empty file (or no file)
//! describes a complete run. Angles are given in degrees and rates in deg/s,
//! converted to the radians the plant uses with `uom`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tl_core::units::{deg, dps, kts, to_ft, to_fps, to_rad, to_rps};
use tl_plant::{Quantity, StateVector};
use tl_solver::{BoundsPolicy, Constraints, DEFAULT_PERTURBATION, SimplexConfig, TrimBounds};
use uom::si::f64::Length;
use uom::si::length::meter;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeConfig {
    #[default]
    NonTurning,
    Rolling,
    Pitching,
    Turning,
}

/// Flight condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub mode: ModeConfig,
    pub altitude_ft: f64,
    /// Overrides `altitude_ft` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    pub velocity_fps: f64,
    /// Overrides `velocity_fps` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_kts: Option<f64>,
    pub gamma_deg: f64,
    pub roll_rate_dps: f64,
    pub stability_axis_roll: bool,
    pub pitch_rate_dps: f64,
    /// Bank angle of a coordinated turn.
    pub bank_deg: f64,
    /// Turn rate; replaces the rate derived from `bank_deg` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaw_rate_dps: Option<f64>,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            mode: ModeConfig::NonTurning,
            altitude_ft: 1000.0,
            altitude_m: None,
            velocity_fps: 200.0,
            velocity_kts: None,
            gamma_deg: 0.0,
            roll_rate_dps: 0.0,
            stability_axis_roll: false,
            pitch_rate_dps: 0.0,
            bank_deg: 0.0,
            yaw_rate_dps: None,
        }
    }
}

impl FlightConfig {
    pub fn altitude(&self) -> f64 {
        match self.altitude_m {
            Some(m) => to_ft(Length::new::<meter>(m)),
            None => self.altitude_ft,
        }
    }

    pub fn velocity(&self) -> f64 {
        match self.velocity_kts {
            Some(v) => to_fps(kts(v)),
            None => self.velocity_fps,
        }
    }

    /// Constraints in plant units. `gravity` is local gravity at the trim
    /// altitude, used for the coordinated-turn rate.
    pub fn to_constraints(&self, gravity: f64) -> AppResult<Constraints> {
        let v = self.velocity();
        let h = self.altitude();
        let gamma = to_rad(deg(self.gamma_deg));
        let c = match self.mode {
            ModeConfig::NonTurning => Constraints::level(v, h, gamma),
            ModeConfig::Rolling => Constraints::rolling(
                v,
                h,
                gamma,
                to_rps(dps(self.roll_rate_dps)),
                self.stability_axis_roll,
            ),
            ModeConfig::Pitching => Constraints::pitching(v, h, gamma, to_rps(dps(self.pitch_rate_dps))),
            ModeConfig::Turning => match self.yaw_rate_dps {
                Some(r) => Constraints {
                    yaw_rate: to_rps(dps(r)),
                    ..Constraints::turning(v, h, gamma, 0.0, gamma, gravity)
                },
                // pitch attitude is not known before trimming; the flight path angle stands in
                None => Constraints::turning(v, h, gamma, to_rad(deg(self.bank_deg)), gamma, gravity),
            },
        };
        c.validate().map_err(AppError::InvalidInput)?;
        Ok(c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicyConfig {
    #[default]
    Clamp,
    Reject,
}

impl From<BoundsPolicyConfig> for BoundsPolicy {
    fn from(p: BoundsPolicyConfig) -> Self {
        match p {
            BoundsPolicyConfig::Clamp => BoundsPolicy::Clamp,
            BoundsPolicyConfig::Reject => BoundsPolicy::Reject,
        }
    }
}

/// Nelder–Mead settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub max_iterations: usize,
    pub rel_tol: f64,
    pub abs_tol: f64,
    pub speed: f64,
    pub random_scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub bounds_policy: BoundsPolicyConfig,
    pub show_convergence: bool,
    pub show_simplex: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        let base = SimplexConfig::default();
        Self {
            max_iterations: base.max_iterations,
            rel_tol: base.rel_tol,
            abs_tol: base.abs_tol,
            speed: base.speed,
            random_scale: base.random_scale,
            seed: base.seed,
            bounds_policy: BoundsPolicyConfig::Clamp,
            show_convergence: false,
            show_simplex: false,
        }
    }
}

impl SolverSettings {
    pub fn simplex_config(&self, bounds: &TrimBounds) -> SimplexConfig {
        SimplexConfig {
            max_iterations: self.max_iterations,
            rel_tol: self.rel_tol,
            abs_tol: self.abs_tol,
            speed: self.speed,
            random_scale: self.random_scale,
            seed: self.seed,
            bounds_policy: self.bounds_policy.into(),
            show_convergence: self.show_convergence,
            show_simplex: self.show_simplex,
            ..SimplexConfig::from_bounds(bounds)
        }
    }
}

/// Quantities of the linear model, by symbol. Empty lists select the defaults
/// for the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearizationConfig {
    pub perturbation: f64,
    pub states: Vec<String>,
    pub inputs: Vec<String>,
    /// Empty: the outputs are the states.
    pub outputs: Vec<String>,
}

impl Default for LinearizationConfig {
    fn default() -> Self {
        Self {
            perturbation: DEFAULT_PERTURBATION,
            states: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

/// Parse quantity symbols into a vector.
pub fn parse_vector(symbols: &[String]) -> AppResult<StateVector> {
    let quantities = symbols
        .iter()
        .map(|s| {
            Quantity::from_symbol(s)
                .ok_or_else(|| AppError::InvalidInput(format!("unknown quantity '{s}'")))
        })
        .collect::<AppResult<Vec<_>>>()?;
    Ok(StateVector::from_quantities(quantities)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub extension: String,
    /// Record the run under `<dir>/.trimlin/runs`.
    pub store_runs: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            extension: tl_results::DEFAULT_SCRIPT_EXTENSION.to_string(),
            store_runs: true,
        }
    }
}

/// Complete description of one trim-and-linearize run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub model: String,
    /// Extra model catalog merged over the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models_file: Option<PathBuf>,
    pub flight: FlightConfig,
    pub solver: SolverSettings,
    pub linearization: LinearizationConfig,
    pub output: OutputConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: "trainer".to_string(),
            models_file: None,
            flight: FlightConfig::default(),
            solver: SolverSettings::default(),
            linearization: LinearizationConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_solver::{TrimMode, coordinated_turn_rate};

    #[test]
    fn empty_file_gives_defaults() {
        let c = RunConfig::from_yaml_str("{}").unwrap();
        assert_eq!(c, RunConfig::default());
        assert_eq!(c.model, "trainer");
        assert_eq!(c.flight.velocity(), 200.0);
        assert_eq!(c.flight.altitude(), 1000.0);
        assert_eq!(c.output.extension, "sce");
    }

    #[test]
    fn partial_yaml_overrides() {
        let c = RunConfig::from_yaml_str(
            "model: twin\nflight:\n  mode: pitching\n  pitch_rate_dps: 5\n  velocity_kts: 120\nsolver:\n  seed: 7\n  bounds_policy: reject\n",
        )
        .unwrap();
        assert_eq!(c.model, "twin");
        assert_eq!(c.flight.mode, ModeConfig::Pitching);
        assert!((c.flight.velocity() - 202.537).abs() < 1e-3);
        assert_eq!(c.solver.seed, Some(7));
        assert_eq!(c.solver.max_iterations, 2000);

        let k = c.flight.to_constraints(32.174).unwrap();
        assert_eq!(k.mode, TrimMode::Pitching);
        assert!((k.pitch_rate - 5.0_f64.to_radians()).abs() < 1e-12);

        let s = c.solver.simplex_config(&TrimBounds::default());
        assert_eq!(s.bounds_policy, BoundsPolicy::Reject);
        assert_eq!(s.initial_guess, TrimBounds::default().guess.to_vec());
    }

    #[test]
    fn metric_altitude() {
        let f = FlightConfig {
            altitude_m: Some(304.8),
            ..FlightConfig::default()
        };
        assert!((f.altitude() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn feet_altitude_passes_through_exactly() {
        for h in [1000.0, 3000.0, 1234.5, 36_089.24] {
            let f = FlightConfig {
                altitude_ft: h,
                ..FlightConfig::default()
            };
            assert_eq!(f.altitude(), h);
            assert_eq!(f.to_constraints(32.174).unwrap().altitude, h);
        }
    }

    #[test]
    fn turning_from_bank_angle() {
        let f = FlightConfig {
            mode: ModeConfig::Turning,
            bank_deg: 30.0,
            ..FlightConfig::default()
        };
        let c = f.to_constraints(32.1).unwrap();
        let expected = coordinated_turn_rate(30.0_f64.to_radians(), 0.0, 200.0, 32.1);
        assert!((c.yaw_rate - expected).abs() < 1e-12);

        let f = FlightConfig {
            yaw_rate_dps: Some(3.0),
            ..f
        };
        let c = f.to_constraints(32.1).unwrap();
        assert!((c.yaw_rate - 3.0_f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn negative_velocity_is_rejected() {
        let f = FlightConfig {
            velocity_fps: -10.0,
            ..FlightConfig::default()
        };
        assert!(matches!(f.to_constraints(32.174), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn vector_symbols() {
        let v = parse_vector(&["Vt".to_string(), "alpha".to_string(), "Rpm0".to_string()]).unwrap();
        assert_eq!(v.names(), vec!["Vt", "Alpha", "Rpm0"]);
        assert!(parse_vector(&["Flaps".to_string()]).is_err());
        assert!(parse_vector(&["Vt".to_string(), "Vtrue".to_string()]).is_err());
    }
}
