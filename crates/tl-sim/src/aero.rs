//! Linear stability-derivative aerodynamics and a simple propulsion model.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Reference geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDef {
    pub wing_area_ft2: f64,
    pub span_ft: f64,
    pub chord_ft: f64,
}

/// Lift (stability axes). Rates are non-dimensional (`q c / 2V`); surface
/// terms are per unit of normalized deflection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftDef {
    pub c0: f64,
    pub alpha: f64,
    pub q: f64,
    pub elevator: f64,
}

/// `CD = c0 + k CL^2`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DragDef {
    pub c0: f64,
    pub k: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SideDef {
    pub beta: f64,
    pub rudder: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchDef {
    pub c0: f64,
    pub alpha: f64,
    pub q: f64,
    pub elevator: f64,
}

/// Roll or yaw moment derivatives.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LateralDef {
    pub beta: f64,
    pub p: f64,
    pub r: f64,
    pub aileron: f64,
    pub rudder: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AeroDef {
    #[serde(default)]
    pub lift: LiftDef,
    #[serde(default)]
    pub drag: DragDef,
    #[serde(default)]
    pub side: SideDef,
    #[serde(default)]
    pub roll: LateralDef,
    #[serde(default)]
    pub pitch: PitchDef,
    #[serde(default)]
    pub yaw: LateralDef,
}

/// Flow condition seen by the aero model.
#[derive(Debug, Clone, Copy)]
pub struct FlowState {
    pub vt: f64,
    pub alpha: f64,
    pub beta: f64,
    pub p: f64,
    pub q: f64,
    pub r: f64,
    pub density: f64,
}

/// Normalized surface positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Surfaces {
    pub aileron: f64,
    pub elevator: f64,
    pub rudder: f64,
}

/// Body-axis force (lbf) and moment about the CG (ft-lbf).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForcesAndMoments {
    pub force: Vector3<f64>,
    pub moment: Vector3<f64>,
}

impl AeroDef {
    pub fn forces(&self, geom: &ReferenceDef, s: &FlowState, u: &Surfaces) -> ForcesAndMoments {
        let qbar = 0.5 * s.density * s.vt * s.vt;
        let qs = qbar * geom.wing_area_ft2;
        let (b, c) = (geom.span_ft, geom.chord_ft);
        let (ph, qh, rh) = if s.vt > 0.0 {
            (
                s.p * b / (2.0 * s.vt),
                s.q * c / (2.0 * s.vt),
                s.r * b / (2.0 * s.vt),
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        let cl = self.lift.c0 + self.lift.alpha * s.alpha + self.lift.q * qh + self.lift.elevator * u.elevator;
        let cd = self.drag.c0 + self.drag.k * cl * cl;
        let cy = self.side.beta * s.beta + self.side.rudder * u.rudder;

        let c_roll = self.roll.beta * s.beta
            + self.roll.p * ph
            + self.roll.r * rh
            + self.roll.aileron * u.aileron
            + self.roll.rudder * u.rudder;
        let c_pitch = self.pitch.c0
            + self.pitch.alpha * s.alpha
            + self.pitch.q * qh
            + self.pitch.elevator * u.elevator;
        let c_yaw = self.yaw.beta * s.beta
            + self.yaw.p * ph
            + self.yaw.r * rh
            + self.yaw.aileron * u.aileron
            + self.yaw.rudder * u.rudder;

        let (sa, ca) = s.alpha.sin_cos();
        ForcesAndMoments {
            force: Vector3::new(qs * (-cd * ca + cl * sa), qs * cy, qs * (-cd * sa - cl * ca)),
            moment: Vector3::new(qs * b * c_roll, qs * c * c_pitch, qs * b * c_yaw),
        }
    }
}

/// Piston/propeller engine reduced to an RPM lag and a thrust map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineDef {
    /// Sea-level static thrust at full throttle (lbf).
    pub max_thrust_lbf: f64,
    pub idle_rpm: f64,
    pub max_rpm: f64,
    /// Spool time constant (s).
    pub spool_tau_s: f64,
}

impl EngineDef {
    /// RPM the engine settles to at `throttle`.
    pub fn steady_rpm(&self, throttle: f64) -> f64 {
        self.idle_rpm + throttle * (self.max_rpm - self.idle_rpm)
    }

    pub fn rpm_dot(&self, rpm: f64, throttle: f64) -> f64 {
        (self.steady_rpm(throttle) - rpm) / self.spool_tau_s
    }

    /// Thrust along body x, proportional to normalized RPM and density ratio.
    pub fn thrust(&self, rpm: f64, density_ratio: f64) -> f64 {
        let n = (rpm - self.idle_rpm) / (self.max_rpm - self.idle_rpm);
        self.max_thrust_lbf * n * density_ratio
    }
}
