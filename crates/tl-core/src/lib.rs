//! tl-core: shared foundation for trimlin.
//!
//! Contains:
//! - units (uom conversions at the configuration boundary + physical constants)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{TlError, TlResult};
pub use numeric::*;
pub use units::*;
