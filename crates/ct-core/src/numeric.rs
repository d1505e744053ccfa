use crate::CtError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
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

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CtError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CtError::NonFinite { what, value: v })
    }
}

/// Relative change from `previous` to `current`, guarded against a zero reference.
pub fn relative_difference(current: Real, previous: Real) -> Real {
    let scale = previous.abs().max(current.abs()).max(Real::EPSILON);
    (current - previous).abs() / scale
}

/// Linear interpolation between `a` and `b` at fraction `t`.
pub fn lerp(a: Real, b: Real, t: Real) -> Real {
    a + (b - a) * t
}
