//! Ordered, named groups of plant quantities.

use crate::component::Component;
use crate::error::{PlantError, PlantResult};
use crate::plant::Plant;
use crate::quantity::Quantity;

/// An ordered list of [`Component`]s read from and written to a plant.
///
/// Order is significant: it fixes row/column indices of every matrix built
/// from the vector. Names are unique within a vector.
///
/// The vector does not hold the plant. Every bulk accessor borrows it for the
/// duration of the call, so several vectors (states, inputs, outputs) can
/// address the same plant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateVector {
    components: Vec<Component>,
}

impl StateVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from registry quantities, in order.
    pub fn from_quantities<I>(quantities: I) -> PlantResult<Self>
    where
        I: IntoIterator<Item = Quantity>,
    {
        let mut v = Self::new();
        for q in quantities {
            v.add(Component::of(q))?;
        }
        Ok(v)
    }

    /// Append a component; rejects a name already present.
    pub fn add(&mut self, component: Component) -> PlantResult<()> {
        if self.components.iter().any(|c| c.name() == component.name()) {
            return Err(PlantError::DuplicateComponent {
                name: component.name().to_string(),
            });
        }
        self.components.push(component);
        Ok(())
    }

    /// Builder form of [`StateVector::add`].
    pub fn with(mut self, component: Component) -> PlantResult<Self> {
        self.add(component)?;
        Ok(self)
    }

    pub fn size(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component(&self, i: usize) -> PlantResult<&Component> {
        self.components.get(i).ok_or(PlantError::IndexOob {
            what: "component",
            index: i,
            len: self.components.len(),
        })
    }

    pub fn name(&self, i: usize) -> PlantResult<&str> {
        Ok(self.component(i)?.name())
    }

    pub fn unit(&self, i: usize) -> PlantResult<&str> {
        Ok(self.component(i)?.unit())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.components.iter().map(|c| c.name().to_string()).collect()
    }

    /// Position of the component called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name() == name)
    }

    /// Read every component, in order.
    pub fn get<P: Plant + ?Sized>(&self, plant: &P) -> PlantResult<Vec<f64>> {
        self.components.iter().map(|c| c.get(plant)).collect()
    }

    pub fn get_at<P: Plant + ?Sized>(&self, plant: &P, i: usize) -> PlantResult<f64> {
        self.component(i)?.get(plant)
    }

    /// Write every component, in order.
    pub fn set<P: Plant + ?Sized>(&self, plant: &mut P, values: &[f64]) -> PlantResult<()> {
        self.check_len(values)?;
        for (c, &v) in self.components.iter().zip(values) {
            c.set(plant, v)?;
        }
        Ok(())
    }

    pub fn set_at<P: Plant + ?Sized>(&self, plant: &mut P, i: usize, value: f64) -> PlantResult<()> {
        self.component(i)?.set(plant, value)
    }

    /// Alias for [`StateVector::get`] used when saving a reference point.
    pub fn snapshot<P: Plant + ?Sized>(&self, plant: &P) -> PlantResult<Vec<f64>> {
        self.get(plant)
    }

    /// Write back a [`StateVector::snapshot`].
    pub fn restore<P: Plant + ?Sized>(&self, plant: &mut P, values: &[f64]) -> PlantResult<()> {
        self.set(plant, values)
    }

    /// Write back only the writable entries of a snapshot.
    ///
    /// Output vectors usually mix writable states with read-only derived
    /// quantities; the read-only ones are skipped.
    pub fn restore_writable<P: Plant + ?Sized>(
        &self,
        plant: &mut P,
        values: &[f64],
    ) -> PlantResult<()> {
        self.check_len(values)?;
        for (c, &v) in self.components.iter().zip(values) {
            if c.is_writable() {
                c.set(plant, v)?;
            }
        }
        Ok(())
    }

    /// Time derivatives of every component after one step over `dt` that
    /// started from `before`.
    pub fn rates<P: Plant + ?Sized>(
        &self,
        plant: &P,
        before: &[f64],
        dt: f64,
    ) -> PlantResult<Vec<f64>> {
        self.check_len(before)?;
        self.components
            .iter()
            .zip(before)
            .map(|(c, &b)| c.rate(plant, b, dt))
            .collect()
    }

    /// One line per component: `name = value unit`.
    pub fn describe<P: Plant + ?Sized>(&self, plant: &P) -> PlantResult<String> {
        let mut out = String::new();
        for c in &self.components {
            let v = c.get(plant)?;
            out.push_str(&format!("{:>12} = {v:>14.6e} {}\n", c.name(), c.unit()));
        }
        Ok(out)
    }

    fn check_len(&self, values: &[f64]) -> PlantResult<()> {
        if values.len() != self.components.len() {
            return Err(PlantError::LengthMismatch {
                what: "state vector values",
                expected: self.components.len(),
                got: values.len(),
            });
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a StateVector {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
