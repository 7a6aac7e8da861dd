//! Finite-difference linearization of a plant about a reference point.
//!
//! For state vector x, input vector u and output vector y bound to the same
//! plant, [`StateSpace::linearize`] builds
//!
//! ```text
//! A = d(xdot)/dx   B = d(xdot)/du
//! C = dy/dx        D = dy/du
//! ```
//!
//! with the fourth-order central stencil. Every perturbed run starts from the
//! full reference point; the plant is returned to (x0, u0) afterwards.

use nalgebra::DMatrix;
use tl_plant::{Plant, PlantError, StateVector};

use crate::error::{SolverError, SolverResult};
use crate::jacobian::fourth_order_stencil;

/// Default perturbation size.
pub const DEFAULT_PERTURBATION: f64 = 1e-5;

/// Values of x, u and y at the linearization point.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePoint {
    pub x0: Vec<f64>,
    pub u0: Vec<f64>,
    pub y0: Vec<f64>,
}

/// Continuous-time linear model `xdot = A x + B u`, `y = C x + D u`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub a: DMatrix<f64>,
    pub b: DMatrix<f64>,
    pub c: DMatrix<f64>,
    pub d: DMatrix<f64>,
    pub x0: Vec<f64>,
    pub u0: Vec<f64>,
    pub y0: Vec<f64>,
    pub x_names: Vec<String>,
    pub u_names: Vec<String>,
    pub y_names: Vec<String>,
    pub x_units: Vec<String>,
    pub u_units: Vec<String>,
    pub y_units: Vec<String>,
}

impl LinearModel {
    pub fn state_count(&self) -> usize {
        self.x0.len()
    }

    pub fn input_count(&self) -> usize {
        self.u0.len()
    }

    pub fn output_count(&self) -> usize {
        self.y0.len()
    }

    /// True when no matrix entry is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        [&self.a, &self.b, &self.c, &self.d]
            .iter()
            .all(|m| m.iter().all(|v| v.is_finite()))
    }
}

#[derive(Debug, Clone, Copy)]
enum Column {
    State(usize),
    Input(usize),
}

/// One perturbed run: state rates and outputs after a single step.
struct Sample {
    rates: Vec<f64>,
    outputs: Vec<f64>,
}

/// Linearization engine over three vectors bound to one plant.
#[derive(Debug, Clone)]
pub struct StateSpace {
    x: StateVector,
    u: StateVector,
    y: StateVector,
    step: f64,
}

impl StateSpace {
    pub fn new(x: StateVector, u: StateVector, y: StateVector) -> Self {
        Self {
            x,
            u,
            y,
            step: DEFAULT_PERTURBATION,
        }
    }

    /// Override the perturbation size used by [`StateSpace::linearize`].
    pub fn with_step(mut self, h: f64) -> Self {
        self.step = h;
        self
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn x(&self) -> &StateVector {
        &self.x
    }

    pub fn u(&self) -> &StateVector {
        &self.u
    }

    pub fn y(&self) -> &StateVector {
        &self.y
    }

    /// Snapshot the current plant values of x, u and y.
    pub fn reference_point<P: Plant + ?Sized>(&self, plant: &P) -> SolverResult<ReferencePoint> {
        Ok(ReferencePoint {
            x0: self.x.snapshot(plant)?,
            u0: self.u.snapshot(plant)?,
            y0: self.y.snapshot(plant)?,
        })
    }

    pub fn linearize<P: Plant + ?Sized>(
        &self,
        plant: &mut P,
        reference: &ReferencePoint,
    ) -> SolverResult<LinearModel> {
        self.linearize_with_step(plant, reference, self.step)
    }

    /// Linearize with an explicit perturbation `h`.
    ///
    /// The plant time step is set to `h` for the duration of the call and
    /// restored afterwards, as is the reference (x0, u0), also on error.
    pub fn linearize_with_step<P: Plant + ?Sized>(
        &self,
        plant: &mut P,
        reference: &ReferencePoint,
        h: f64,
    ) -> SolverResult<LinearModel> {
        if !(h.is_finite() && h > 0.0) {
            return Err(SolverError::Configuration {
                what: format!("perturbation must be positive, got {h}"),
            });
        }
        self.check_reference(reference)?;

        let dt0 = plant.time_step();
        plant.set_time_step(h);
        let result = self.compute(plant, reference, h);
        plant.set_time_step(dt0);

        let restored = self
            .x
            .restore(plant, &reference.x0)
            .and_then(|_| self.u.restore(plant, &reference.u0));

        let model = result?;
        restored?;
        Ok(model)
    }

    fn check_reference(&self, r: &ReferencePoint) -> SolverResult<()> {
        for (what, expected, got) in [
            ("x0", self.x.size(), r.x0.len()),
            ("u0", self.u.size(), r.u0.len()),
            ("y0", self.y.size(), r.y0.len()),
        ] {
            if expected != got {
                return Err(SolverError::DimensionMismatch {
                    what,
                    expected,
                    got,
                });
            }
        }
        Ok(())
    }

    fn compute<P: Plant + ?Sized>(
        &self,
        plant: &mut P,
        r: &ReferencePoint,
        h: f64,
    ) -> SolverResult<LinearModel> {
        let (nx, nu, ny) = (self.x.size(), self.u.size(), self.y.size());
        let mut a = DMatrix::zeros(nx, nx);
        let mut b = DMatrix::zeros(nx, nu);
        let mut c = DMatrix::zeros(ny, nx);
        let mut d = DMatrix::zeros(ny, nu);

        for j in 0..nx {
            self.fill_column(plant, r, Column::State(j), h, &mut a, &mut c)?;
        }
        for j in 0..nu {
            self.fill_column(plant, r, Column::Input(j), h, &mut b, &mut d)?;
        }

        tracing::debug!(nx, nu, ny, h, "linearization complete");
        Ok(LinearModel {
            a,
            b,
            c,
            d,
            x0: r.x0.clone(),
            u0: r.u0.clone(),
            y0: r.y0.clone(),
            x_names: self.x.names(),
            u_names: self.u.names(),
            y_names: self.y.names(),
            x_units: units(&self.x),
            u_units: units(&self.u),
            y_units: units(&self.y),
        })
    }

    /// Fill column `j` of the rate matrix and the output matrix from four
    /// shared perturbed runs.
    fn fill_column<P: Plant + ?Sized>(
        &self,
        plant: &mut P,
        r: &ReferencePoint,
        column: Column,
        h: f64,
        rate_matrix: &mut DMatrix<f64>,
        output_matrix: &mut DMatrix<f64>,
    ) -> SolverResult<()> {
        let s1 = self.sample(plant, r, column, h)?;
        let sn1 = self.sample(plant, r, column, -h)?;
        let s2 = self.sample(plant, r, column, 2.0 * h)?;
        let sn2 = self.sample(plant, r, column, -2.0 * h)?;

        let (j, wrt) = match column {
            Column::State(j) => (j, self.x.name(j)?),
            Column::Input(j) => (j, self.u.name(j)?),
        };

        for i in 0..self.x.size() {
            let (f1, fn1, f2, fn2) = (s1.rates[i], sn1.rates[i], s2.rates[i], sn2.rates[i]);
            let df = fourth_order_stencil(f1, fn1, f2, fn2, h);
            tracing::trace!(of = self.x.name(i)?, wrt, f1, fn1, f2, fn2, df, "rate derivative");
            rate_matrix[(i, j)] = df;
        }
        for i in 0..self.y.size() {
            let (f1, fn1, f2, fn2) = (
                s1.outputs[i],
                sn1.outputs[i],
                s2.outputs[i],
                sn2.outputs[i],
            );
            let df = fourth_order_stencil(f1, fn1, f2, fn2, h);
            tracing::trace!(of = self.y.name(i)?, wrt, f1, fn1, f2, fn2, df, "output derivative");
            output_matrix[(i, j)] = df;
        }
        Ok(())
    }

    /// Restore the reference, offset one entry by `delta`, and step once.
    fn sample<P: Plant + ?Sized>(
        &self,
        plant: &mut P,
        r: &ReferencePoint,
        column: Column,
        delta: f64,
    ) -> SolverResult<Sample> {
        self.x.restore(plant, &r.x0)?;
        self.u.restore(plant, &r.u0)?;
        self.y.restore_writable(plant, &r.y0)?;

        match column {
            Column::State(j) => self.x.set_at(plant, j, r.x0[j] + delta)?,
            Column::Input(j) => self.u.set_at(plant, j, r.u0[j] + delta)?,
        }

        let before = self.x.get(plant)?;
        let dt = plant.time_step();
        match plant.run_one_step() {
            Ok(()) => {}
            Err(PlantError::Diverged { what }) => {
                tracing::warn!(%what, ?column, delta, "plant diverged during linearization");
                return Ok(Sample {
                    rates: vec![f64::NAN; self.x.size()],
                    outputs: vec![f64::NAN; self.y.size()],
                });
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Sample {
            rates: self.x.rates(plant, &before, dt)?,
            outputs: self.y.get(plant)?,
        })
    }
}

fn units(v: &StateVector) -> Vec<String> {
    v.iter().map(|c| c.unit().to_string()).collect()
}
