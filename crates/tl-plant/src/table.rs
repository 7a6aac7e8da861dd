//! Map-backed plant driven by a step closure.
//!
//! Wraps any model that can be written as "update these named values over
//! one step" into a [`Plant`]. Useful for analytic test plants and for quick
//! adapters around external models.

use std::collections::{HashMap, HashSet};

use crate::error::{PlantError, PlantResult};
use crate::plant::Plant;
use crate::quantity::Quantity;

pub type StepFn = Box<dyn FnMut(&mut HashMap<Quantity, f64>, f64) -> PlantResult<()>>;

pub struct TablePlant {
    values: HashMap<Quantity, f64>,
    read_only: HashSet<Quantity>,
    dt: f64,
    time: f64,
    step: Option<StepFn>,
}

impl TablePlant {
    pub fn new(dt: f64) -> Self {
        Self {
            values: HashMap::new(),
            read_only: HashSet::new(),
            dt,
            time: 0.0,
            step: None,
        }
    }

    /// Add a writable quantity.
    pub fn with_value(mut self, quantity: Quantity, value: f64) -> Self {
        self.values.insert(quantity, value);
        self
    }

    /// Add a quantity only the step function may change.
    pub fn with_output(mut self, quantity: Quantity, value: f64) -> Self {
        self.read_only.insert(quantity.clone());
        self.values.insert(quantity, value);
        self
    }

    pub fn with_step<F>(mut self, step: F) -> Self
    where
        F: FnMut(&mut HashMap<Quantity, f64>, f64) -> PlantResult<()> + 'static,
    {
        self.step = Some(Box::new(step));
        self
    }

    pub fn values(&self) -> &HashMap<Quantity, f64> {
        &self.values
    }
}

impl Plant for TablePlant {
    fn set_time_step(&mut self, dt: f64) {
        self.dt = dt;
    }

    fn time_step(&self) -> f64 {
        self.dt
    }

    fn run_one_step(&mut self) -> PlantResult<()> {
        if let Some(step) = self.step.as_mut() {
            step(&mut self.values, self.dt)?;
        }
        self.time += self.dt;

        if let Some((q, v)) = self.values.iter().find(|(_, v)| !v.is_finite()) {
            tracing::debug!(quantity = %q, value = *v, t = self.time, "table plant diverged");
            return Err(PlantError::Diverged {
                what: format!("{q} = {v}"),
            });
        }
        Ok(())
    }

    fn get(&self, quantity: &Quantity) -> PlantResult<f64> {
        self.values
            .get(quantity)
            .copied()
            .ok_or_else(|| PlantError::UnknownQuantity {
                name: quantity.symbol(),
            })
    }

    fn set(&mut self, quantity: &Quantity, value: f64) -> PlantResult<()> {
        if self.read_only.contains(quantity) {
            return Err(PlantError::ReadOnly {
                name: quantity.symbol(),
            });
        }
        match self.values.get_mut(quantity) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(PlantError::UnknownQuantity {
                name: quantity.symbol(),
            }),
        }
    }

    fn has(&self, quantity: &Quantity) -> bool {
        self.values.contains_key(quantity)
    }

    fn sim_time(&self) -> f64 {
        self.time
    }
}
