//! Five-point finite difference derivatives.

/// Fourth-order central difference of four samples taken at x+h, x-h, x+2h, x-2h.
#[inline]
pub(crate) fn fourth_order_stencil(f1: f64, fn1: f64, f2: f64, fn2: f64, h: f64) -> f64 {
    (8.0 * (f1 - fn1) - (f2 - fn2)) / (12.0 * h)
}
