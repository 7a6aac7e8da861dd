//! Gravity and atmosphere.

use tl_core::constants::{GM_WGS84_FT3_S2, RADIUS_REFERENCE_FT, RHO0_SLUG_FT3};

/// Density scale height of the exponential atmosphere (ft).
pub const DENSITY_SCALE_HEIGHT_FT: f64 = 30_000.0;

/// Gravitational acceleration at altitude `alt_ft` (ft/s^2).
///
/// `g = GM / (R + h)^2`
pub fn gravity(alt_ft: f64) -> f64 {
    let r = RADIUS_REFERENCE_FT + alt_ft;
    GM_WGS84_FT3_S2 / (r * r)
}

/// Air density at altitude `alt_ft` (slug/ft^3).
pub fn density(alt_ft: f64) -> f64 {
    RHO0_SLUG_FT3 * (-alt_ft / DENSITY_SCALE_HEIGHT_FT).exp()
}

/// Density ratio rho / rho0.
pub fn density_ratio(alt_ft: f64) -> f64 {
    density(alt_ft) / RHO0_SLUG_FT3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sea_level_gravity() {
        let g = gravity(0.0);
        assert!((g - 32.146).abs() < 0.01, "g = {g}");
        assert!(gravity(10_000.0) < g);
    }

    #[test]
    fn gravity_inverse_square() {
        let r = RADIUS_REFERENCE_FT;
        let ratio = gravity(r) / gravity(0.0);
        assert!((ratio - 0.25).abs() < 1e-12);
    }

    #[test]
    fn density_decays() {
        assert!((density_ratio(0.0) - 1.0).abs() < 1e-15);
        assert!((density_ratio(DENSITY_SCALE_HEIGHT_FT) - (-1.0_f64).exp()).abs() < 1e-12);
    }
}
