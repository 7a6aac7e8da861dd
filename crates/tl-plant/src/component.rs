//! A named scalar bound to a plant quantity.

use crate::error::{PlantError, PlantResult};
use crate::plant::Plant;
use crate::quantity::{Category, Quantity};

/// One entry of a [`StateVector`](crate::StateVector).
///
/// The accessor pair is the plant's own `get`/`set` for [`Component::quantity`];
/// the component only adds a display name, unit label and category.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    name: String,
    unit: String,
    category: Category,
    quantity: Quantity,
    writable: bool,
    rate: Option<Quantity>,
}

impl Component {
    /// Build a component from the quantity registry.
    pub fn of(quantity: Quantity) -> Self {
        let info = quantity.info();
        Self {
            name: info.symbol,
            unit: info.unit.to_string(),
            category: info.category,
            quantity,
            writable: info.writable,
            rate: info.rate,
        }
    }

    /// Build a component with explicit metadata, for plant-specific quantities.
    pub fn custom(
        name: impl Into<String>,
        unit: impl Into<String>,
        category: Category,
        quantity: Quantity,
    ) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            category,
            quantity,
            writable: category != Category::Output,
            rate: None,
        }
    }

    /// Read the time derivative from `rate` instead of differencing.
    pub fn with_rate(mut self, rate: Quantity) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn get<P: Plant + ?Sized>(&self, plant: &P) -> PlantResult<f64> {
        plant.get(&self.quantity)
    }

    pub fn set<P: Plant + ?Sized>(&self, plant: &mut P, value: f64) -> PlantResult<()> {
        if !self.writable {
            return Err(PlantError::ReadOnly {
                name: self.name.clone(),
            });
        }
        plant.set(&self.quantity, value)
    }

    /// Time derivative after a step that started from `before`.
    ///
    /// Uses the plant's rate quantity when it exposes one, otherwise the
    /// difference quotient over the step `dt`.
    pub fn rate<P: Plant + ?Sized>(&self, plant: &P, before: f64, dt: f64) -> PlantResult<f64> {
        if let Some(rate) = &self.rate {
            if plant.has(rate) {
                return plant.get(rate);
            }
        }
        Ok((self.get(plant)? - before) / dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TablePlant;

    #[test]
    fn registry_component_metadata() {
        let c = Component::of(Quantity::Alpha);
        assert_eq!(c.name(), "Alpha");
        assert_eq!(c.unit(), "rad");
        assert_eq!(c.category(), Category::State);
        assert!(c.is_writable());
    }

    #[test]
    fn read_only_component_rejects_writes() {
        let mut plant = TablePlant::new(0.01).with_output(Quantity::VtDot, 1.0);
        let c = Component::of(Quantity::VtDot);
        assert_eq!(c.get(&plant).unwrap(), 1.0);
        assert!(matches!(
            c.set(&mut plant, 2.0),
            Err(PlantError::ReadOnly { .. })
        ));
    }

    #[test]
    fn rate_falls_back_to_difference_quotient() {
        let mut plant = TablePlant::new(0.5)
            .with_value(Quantity::named("x"), 1.0)
            .with_step(|values, dt| {
                if let Some(x) = values.get_mut(&Quantity::named("x")) {
                    *x += 4.0 * dt;
                }
                Ok(())
            });
        let c = Component::custom("x", "m", Category::State, Quantity::named("x"));
        let before = c.get(&plant).unwrap();
        plant.run_one_step().unwrap();
        assert!((c.rate(&plant, before, 0.5).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn rate_prefers_plant_rate_quantity() {
        let plant = TablePlant::new(0.5)
            .with_value(Quantity::Vt, 100.0)
            .with_output(Quantity::VtDot, -2.5);
        let c = Component::of(Quantity::Vt);
        assert_eq!(c.rate(&plant, 0.0, 0.5).unwrap(), -2.5);
    }
}
