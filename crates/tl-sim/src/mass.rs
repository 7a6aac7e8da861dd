//! Mass balance: empty aircraft plus shaped point masses.
//!
//! Locations are body axes (x forward, y right, z down) in ft from an
//! arbitrary reference point. Weights are lbf; mass and inertia come out in
//! slug and slug-ft^2 about the combined centre of gravity.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use tl_core::constants::SLUG_TO_LB;

use crate::error::{SimError, SimResult};

/// Geometry of a point mass for its own (local) inertia.
///
/// Tubes and cylinders are aligned with the body x axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    #[default]
    Point,
    /// Thin-walled hollow cylinder.
    Tube { radius_ft: f64, length_ft: f64 },
    /// Solid cylinder.
    Cylinder { radius_ft: f64, length_ft: f64 },
    /// Thin-walled hollow sphere.
    Sphere { radius_ft: f64 },
    /// Solid sphere.
    Ball { radius_ft: f64 },
}

impl Shape {
    /// Principal inertia of mass `m` (slug) about its own centre.
    pub fn inertia(&self, m: f64) -> Matrix3<f64> {
        let (ixx, iyy, izz) = match *self {
            Shape::Point => (0.0, 0.0, 0.0),
            Shape::Tube {
                radius_ft: r,
                length_ft: l,
            } => {
                let t = m * (6.0 * r * r + l * l) / 12.0;
                (m * r * r, t, t)
            }
            Shape::Cylinder {
                radius_ft: r,
                length_ft: l,
            } => {
                let t = m * (3.0 * r * r + l * l) / 12.0;
                (m * r * r / 2.0, t, t)
            }
            Shape::Sphere { radius_ft: r } => {
                let i = 2.0 / 3.0 * m * r * r;
                (i, i, i)
            }
            Shape::Ball { radius_ft: r } => {
                let i = 2.0 / 5.0 * m * r * r;
                (i, i, i)
            }
        };
        Matrix3::from_diagonal(&Vector3::new(ixx, iyy, izz))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMass {
    pub name: String,
    pub weight_lb: f64,
    pub location_ft: [f64; 3],
    #[serde(default)]
    pub shape: Shape,
}

/// Empty-aircraft inertia about the empty CG (slug-ft^2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertiaDef {
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
    #[serde(default)]
    pub ixy: f64,
    #[serde(default)]
    pub ixz: f64,
    #[serde(default)]
    pub iyz: f64,
}

impl InertiaDef {
    /// Inertia tensor with the usual negative products of inertia.
    pub fn tensor(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.ixx, -self.ixy, -self.ixz, //
            -self.ixy, self.iyy, -self.iyz, //
            -self.ixz, -self.iyz, self.izz,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassDef {
    pub empty_weight_lb: f64,
    #[serde(default)]
    pub empty_cg_ft: [f64; 3],
    pub empty_inertia_slug_ft2: InertiaDef,
    #[serde(default)]
    pub point_masses: Vec<PointMass>,
}

/// Combined mass properties.
#[derive(Debug, Clone, PartialEq)]
pub struct MassProperties {
    pub weight_lb: f64,
    pub mass_slug: f64,
    pub cg_ft: Vector3<f64>,
    pub inertia: Matrix3<f64>,
    pub inertia_inv: Matrix3<f64>,
}

/// Inertia of a point mass `m` at offset `d` from the reference (parallel axis).
fn parallel_axis(m: f64, d: &Vector3<f64>) -> Matrix3<f64> {
    (Matrix3::identity() * d.norm_squared() - d * d.transpose()) * m
}

impl MassDef {
    pub fn properties(&self) -> SimResult<MassProperties> {
        if !(self.empty_weight_lb > 0.0) {
            return Err(SimError::InvalidArg {
                what: "empty weight must be positive",
            });
        }
        if let Some(pm) = self.point_masses.iter().find(|pm| !(pm.weight_lb >= 0.0)) {
            return Err(SimError::NonPhysical {
                what: format!("point mass {} has negative weight", pm.name),
            });
        }

        let empty_cg = Vector3::from(self.empty_cg_ft);
        let empty_mass = self.empty_weight_lb / SLUG_TO_LB;

        let weight_lb =
            self.empty_weight_lb + self.point_masses.iter().map(|pm| pm.weight_lb).sum::<f64>();
        let mass_slug = weight_lb / SLUG_TO_LB;

        let moment = self
            .point_masses
            .iter()
            .fold(empty_cg * empty_mass, |acc, pm| {
                acc + Vector3::from(pm.location_ft) * (pm.weight_lb / SLUG_TO_LB)
            });
        let cg_ft = moment / mass_slug;

        let mut inertia =
            self.empty_inertia_slug_ft2.tensor() + parallel_axis(empty_mass, &(empty_cg - cg_ft));
        for pm in &self.point_masses {
            let m = pm.weight_lb / SLUG_TO_LB;
            let d = Vector3::from(pm.location_ft) - cg_ft;
            inertia += pm.shape.inertia(m) + parallel_axis(m, &d);
        }

        let inertia_inv = inertia.try_inverse().ok_or_else(|| SimError::NonPhysical {
            what: "singular inertia tensor".to_string(),
        })?;

        Ok(MassProperties {
            weight_lb,
            mass_slug,
            cg_ft,
            inertia,
            inertia_inv,
        })
    }
}
