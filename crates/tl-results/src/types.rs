//! Persisted run records.

use serde::{Deserialize, Serialize};

use crate::ResultsResult;

pub type RunId = String;

/// Flight condition a trim was requested for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintsRecord {
    pub mode: String,
    pub velocity_fps: f64,
    pub altitude_ft: f64,
    pub gamma_rad: f64,
    #[serde(default)]
    pub roll_rate_rps: f64,
    #[serde(default)]
    pub pitch_rate_rps: f64,
    #[serde(default)]
    pub yaw_rate_rps: f64,
    /// Bank angle of the applied trim point; absent when the trim faulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phi_rad: Option<f64>,
    #[serde(default)]
    pub stability_axis_roll: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverRecord {
    pub max_iterations: usize,
    pub rel_tol: f64,
    pub abs_tol: f64,
    pub speed: f64,
    pub random_scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub bounds_policy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub model: String,
    /// RFC 3339.
    pub timestamp: String,
    pub solver_version: String,
    pub constraints: ConstraintsRecord,
    pub solver: SolverRecord,
    pub status: String,
    pub cost: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub parameters: Vec<ParameterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RunManifest {
    pub fn to_yaml(&self) -> ResultsResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn converged(&self) -> bool {
        self.status == "converged"
    }
}

/// Best vertex after one simplex iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub iteration: usize,
    pub evaluations: usize,
    pub cost: f64,
    pub params: Vec<f64>,
    pub relative_spread: f64,
}
