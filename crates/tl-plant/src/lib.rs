//! Plant interface and named-quantity vectors.
//!
//! The trim and linearization code never sees the dynamics model directly. It
//! talks to a [`Plant`] through named scalar [`Quantity`] values, grouped into
//! ordered [`StateVector`]s whose order fixes matrix row/column indices.

pub mod component;
pub mod error;
pub mod plant;
pub mod quantity;
pub mod table;
pub mod vector;

pub use component::Component;
pub use error::{PlantError, PlantResult};
pub use plant::Plant;
pub use quantity::{Category, Quantity, QuantityInfo};
pub use table::TablePlant;
pub use vector::StateVector;
