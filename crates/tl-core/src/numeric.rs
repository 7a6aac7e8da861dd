use crate::TlError;

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute/relative tolerance pair used for comparisons and convergence tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

/// Element-wise [`nearly_equal`] over two slices of equal length.
pub fn all_nearly_equal(a: &[Real], b: &[Real], tol: Tolerances) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| nearly_equal(x, y, tol))
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TlError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TlError::NonFinite { what, value: v })
    }
}

/// Fail on the first non-finite entry of `values`.
pub fn ensure_all_finite(values: &[Real], what: &'static str) -> Result<(), TlError> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(TlError::NonFinite { what, value }),
        None => Ok(()),
    }
}

pub fn ensure_len(values: &[Real], expected: usize, what: &'static str) -> Result<(), TlError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(TlError::DimensionMismatch {
            what,
            expected,
            got: values.len(),
        })
    }
}

/// Project `x` onto the box `[lower, upper]` component-wise.
pub fn clamp_to_box(x: &mut [Real], lower: &[Real], upper: &[Real]) {
    for ((xi, &lo), &hi) in x.iter_mut().zip(lower).zip(upper) {
        *xi = xi.clamp(lo, hi);
    }
}

/// True when every component of `x` lies inside `[lower, upper]`.
pub fn inside_box(x: &[Real], lower: &[Real], upper: &[Real]) -> bool {
    x.iter()
        .zip(lower)
        .zip(upper)
        .all(|((&xi, &lo), &hi)| xi >= lo && xi <= hi)
}
