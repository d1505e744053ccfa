//! Closed numeric intervals and target-value constraints.
//!
//! `Boundary` bounds every independent variable a solver searches over
//! (shaft speed, recirculation rate, choke pressure drop). `FloatConstraint`
//! states a target value with an absolute tolerance, e.g. a discharge pressure.

use crate::error::{CtError, CtResult};
use crate::numeric::Real;

/// Closed interval `[min, max]` with `min <= max`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Boundary {
    min: Real,
    max: Real,
}

impl Boundary {
    /// Create a boundary, rejecting non-finite limits and `min > max`.
    pub fn new(min: Real, max: Real) -> CtResult<Self> {
        if !min.is_finite() {
            return Err(CtError::NonFinite {
                what: "boundary min",
                value: min,
            });
        }
        if !max.is_finite() {
            return Err(CtError::NonFinite {
                what: "boundary max",
                value: max,
            });
        }
        if min > max {
            return Err(CtError::InvalidBoundary { min, max });
        }
        Ok(Self { min, max })
    }

    /// Degenerate boundary containing a single value.
    pub fn point(value: Real) -> CtResult<Self> {
        Self::new(value, value)
    }

    pub fn min(&self) -> Real {
        self.min
    }

    pub fn max(&self) -> Real {
        self.max
    }

    pub fn width(&self) -> Real {
        self.max - self.min
    }

    pub fn midpoint(&self) -> Real {
        0.5 * (self.min + self.max)
    }

    pub fn contains(&self, value: Real) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: Real) -> Real {
        value.clamp(self.min, self.max)
    }

    /// Intersection of two boundaries, `None` when they do not overlap.
    pub fn intersect(&self, other: &Boundary) -> Option<Boundary> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min <= max).then_some(Boundary { min, max })
    }

    /// Same boundary with a new lower limit, clamped into the current interval.
    pub fn with_min(&self, min: Real) -> Boundary {
        Boundary {
            min: self.clamp(min),
            max: self.max,
        }
    }

    /// Same boundary with a new upper limit, clamped into the current interval.
    pub fn with_max(&self, max: Real) -> Boundary {
        Boundary {
            min: self.min,
            max: self.clamp(max),
        }
    }
}

/// "Must equal `value` within `abs_tol`".
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatConstraint {
    pub value: Real,
    pub abs_tol: Real,
}

impl FloatConstraint {
    pub fn new(value: Real, abs_tol: Real) -> CtResult<Self> {
        if !value.is_finite() {
            return Err(CtError::NonFinite {
                what: "constraint value",
                value,
            });
        }
        if !abs_tol.is_finite() || abs_tol < 0.0 {
            return Err(CtError::InvalidArg {
                what: "constraint tolerance must be finite and non-negative",
            });
        }
        Ok(Self { value, abs_tol })
    }

    /// Signed distance `candidate - value`.
    pub fn deviation(&self, candidate: Real) -> Real {
        candidate - self.value
    }

    pub fn is_met(&self, candidate: Real) -> bool {
        self.deviation(candidate).abs() <= self.abs_tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_boundary() {
        let err = Boundary::new(2.0, 1.0).unwrap_err();
        assert!(matches!(err, CtError::InvalidBoundary { .. }));
    }

    #[test]
    fn rejects_nan_limits() {
        assert!(Boundary::new(f64::NAN, 1.0).is_err());
        assert!(Boundary::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn clamp_and_contains() {
        let b = Boundary::new(0.0, 10.0).unwrap();
        assert!(b.contains(0.0));
        assert!(b.contains(10.0));
        assert!(!b.contains(10.5));
        assert_eq!(b.clamp(-3.0), 0.0);
        assert_eq!(b.clamp(12.0), 10.0);
        assert_eq!(b.midpoint(), 5.0);
    }

    #[test]
    fn intersection() {
        let a = Boundary::new(0.0, 10.0).unwrap();
        let b = Boundary::new(5.0, 20.0).unwrap();
        let c = Boundary::new(11.0, 12.0).unwrap();
        assert_eq!(a.intersect(&b), Some(Boundary::new(5.0, 10.0).unwrap()));
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn narrowing_stays_inside() {
        let b = Boundary::new(0.0, 10.0).unwrap();
        let narrowed = b.with_min(4.0).with_max(20.0);
        assert_eq!(narrowed.min(), 4.0);
        assert_eq!(narrowed.max(), 10.0);
    }

    #[test]
    fn constraint_tolerance() {
        let c = FloatConstraint::new(100.0, 0.01).unwrap();
        assert!(c.is_met(100.005));
        assert!(!c.is_met(100.02));
        assert!(FloatConstraint::new(100.0, -1.0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn constructed_boundaries_are_ordered(a in -1e6_f64..1e6, b in -1e6_f64..1e6) {
            match Boundary::new(a, b) {
                Ok(boundary) => prop_assert!(boundary.min() <= boundary.max()),
                Err(_) => prop_assert!(a > b),
            }
        }

        #[test]
        fn clamp_lands_inside(lo in -1e3_f64..0.0, hi in 0.0_f64..1e3, x in -1e4_f64..1e4) {
            let boundary = Boundary::new(lo, hi).unwrap();
            prop_assert!(boundary.contains(boundary.clamp(x)));
        }
    }
}
