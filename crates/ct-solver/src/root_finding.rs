//! Scalar root finding: Brent's method with a secant fallback.
//!
//! Brent runs when the boundary brackets a sign change. Without a bracket the
//! secant method is tried from the two end points, clamped to the boundary.
//! An iterate counts as converged only once `|g(x)|` is within the residual
//! tolerance; the relative x-tolerance alone never ends the search early.
//! Exhausting the iteration budget is not an error: the last iterate is
//! returned with `converged = false` and a warning is logged.

use crate::config::RootFindingConfig;
use ct_core::{Boundary, relative_difference};
use ct_process::ProcessResult;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootOutcome {
    pub x: f64,
    /// `g(x)` at the returned iterate
    pub residual: f64,
    pub converged: bool,
    pub iterations: usize,
}

pub trait RootFindingStrategy: Send + Sync {
    /// Find `x` in `boundary` with `|g(x)| <= residual_tolerance`. Errors from
    /// `g` propagate.
    fn find_root(
        &self,
        boundary: Boundary,
        residual_tolerance: f64,
        g: &mut dyn FnMut(f64) -> ProcessResult<f64>,
    ) -> ProcessResult<RootOutcome>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BrentRootFinding {
    config: RootFindingConfig,
}

impl BrentRootFinding {
    pub fn new(config: RootFindingConfig) -> Self {
        Self { config }
    }

    fn brent(
        &self,
        (mut a, mut fa): (f64, f64),
        (mut b, mut fb): (f64, f64),
        residual_tolerance: f64,
        g: &mut dyn FnMut(f64) -> ProcessResult<f64>,
    ) -> ProcessResult<RootOutcome> {
        let rtol = self.config.relative_tolerance;
        let floor = 1e-3 * a.abs().max(b.abs()).max(f64::MIN_POSITIVE);
        let (mut c, mut fc) = (b, fb);
        let mut d = b - a;
        let mut e = d;

        for iteration in 1..=self.config.max_iterations {
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let residual_met = fb.abs() <= residual_tolerance;
            let tol = if residual_met {
                2.0 * f64::EPSILON * b.abs() + 0.5 * rtol * b.abs().max(floor)
            } else {
                // x-tolerance reached but the residual is not: keep narrowing
                4.0 * f64::EPSILON * b.abs().max(floor)
            };
            let xm = 0.5 * (c - b);
            if xm.abs() <= tol || fb == 0.0 {
                if !residual_met {
                    tracing::warn!(
                        x = b,
                        residual = fb,
                        residual_tolerance,
                        "bracket collapsed without meeting the residual tolerance"
                    );
                }
                return Ok(RootOutcome {
                    x: b,
                    residual: fb,
                    converged: residual_met,
                    iterations: iteration,
                });
            }

            if e.abs() >= tol && fa.abs() > fb.abs() {
                // inverse quadratic interpolation, or secant when only two points
                let s = fb / fa;
                let (mut p, mut q) = if a == c {
                    (2.0 * xm * s, 1.0 - s)
                } else {
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                        (q - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * xm * q - (tol * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b += if d.abs() > tol { d } else { tol.copysign(xm) };
            fb = g(b)?;
        }

        tracing::warn!(
            x = b,
            residual = fb,
            max_iterations = self.config.max_iterations,
            "Brent root finding did not converge; using last iterate"
        );
        Ok(RootOutcome {
            x: b,
            residual: fb,
            converged: false,
            iterations: self.config.max_iterations,
        })
    }

    fn secant(
        &self,
        boundary: Boundary,
        (mut x0, mut f0): (f64, f64),
        (mut x1, mut f1): (f64, f64),
        residual_tolerance: f64,
        g: &mut dyn FnMut(f64) -> ProcessResult<f64>,
    ) -> ProcessResult<RootOutcome> {
        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            iterations += 1;
            let denominator = f1 - f0;
            if denominator == 0.0 || !denominator.is_finite() {
                break;
            }
            let x2 = boundary.clamp(x1 - f1 * (x1 - x0) / denominator);
            let f2 = g(x2)?;
            let settled = x2 != x1 && relative_difference(x2, x1) < self.config.relative_tolerance;
            if f2 == 0.0 || (settled && f2.abs() <= residual_tolerance) {
                return Ok(RootOutcome {
                    x: x2,
                    residual: f2,
                    converged: true,
                    iterations,
                });
            }
            if x2 == x1 {
                break;
            }
            (x0, f0) = (x1, f1);
            (x1, f1) = (x2, f2);
        }

        let (x, residual) = if f0.abs() < f1.abs() { (x0, f0) } else { (x1, f1) };
        let converged = residual.abs() <= residual_tolerance;
        if !converged {
            tracing::warn!(
                x,
                residual,
                iterations,
                "secant fallback did not converge; using best iterate"
            );
        }
        Ok(RootOutcome {
            x,
            residual,
            converged,
            iterations,
        })
    }
}

impl RootFindingStrategy for BrentRootFinding {
    fn find_root(
        &self,
        boundary: Boundary,
        residual_tolerance: f64,
        g: &mut dyn FnMut(f64) -> ProcessResult<f64>,
    ) -> ProcessResult<RootOutcome> {
        let (lo, hi) = (boundary.min(), boundary.max());
        let f_lo = g(lo)?;
        if f_lo == 0.0 || lo == hi {
            return Ok(RootOutcome {
                x: lo,
                residual: f_lo,
                converged: f_lo.abs() <= residual_tolerance,
                iterations: 0,
            });
        }
        let f_hi = g(hi)?;
        if f_hi == 0.0 {
            return Ok(RootOutcome {
                x: hi,
                residual: f_hi,
                converged: true,
                iterations: 0,
            });
        }

        if f_lo.signum() != f_hi.signum() {
            self.brent((lo, f_lo), (hi, f_hi), residual_tolerance, g)
        } else {
            tracing::debug!(lo, hi, f_lo, f_hi, "root not bracketed; trying secant");
            self.secant(boundary, (lo, f_lo), (hi, f_hi), residual_tolerance, g)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_process::ProcessError;
    use proptest::prelude::*;

    fn solve_within(
        min: f64,
        max: f64,
        residual_tolerance: f64,
        g: impl Fn(f64) -> f64,
    ) -> RootOutcome {
        BrentRootFinding::default()
            .find_root(Boundary::new(min, max).unwrap(), residual_tolerance, &mut |x| {
                Ok(g(x))
            })
            .unwrap()
    }

    fn solve(min: f64, max: f64, g: impl Fn(f64) -> f64) -> RootOutcome {
        solve_within(min, max, 1e-9, g)
    }

    #[test]
    fn finds_sqrt_two() {
        let result = solve(0.0, 2.0, |x| x * x - 2.0);
        assert!(result.converged);
        assert!((result.x - 2.0_f64.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn root_at_end_point() {
        let result = solve(1.0, 3.0, |x| x - 1.0);
        assert_eq!(result.x, 1.0);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn root_at_zero() {
        let result = solve(-1.0, 2.0, |x| x * 3.0);
        assert!(result.converged);
        assert!(result.x.abs() < 1e-6);
    }

    #[test]
    fn unbracketed_uses_secant() {
        // root at 1 lies outside [2, 3]
        let result = solve(2.0, 3.0, |x| x - 1.0);
        assert!(!result.converged);
        assert!(result.x >= 2.0 && result.x <= 3.0);
        assert_eq!(result.residual, result.x - 1.0);
    }

    #[test]
    fn steep_function_keeps_narrowing_past_x_tolerance() {
        // x-tolerance alone would stop around 0.05 away from the root
        let result = solve_within(7000.0, 10500.0, 1e-6, |x| 50.0 * (x - 8123.4));
        assert!(result.converged);
        assert!(result.residual.abs() <= 1e-6);
        assert!((result.x - 8123.4).abs() < 1e-7);
    }

    #[test]
    fn exhausted_budget_returns_last_iterate() {
        let finder = BrentRootFinding::new(RootFindingConfig {
            relative_tolerance: 0.0,
            max_iterations: 3,
        });
        let result = finder
            .find_root(Boundary::new(0.0, 10.0).unwrap(), 0.0, &mut |x| {
                Ok(x.powi(3) - 2.0)
            })
            .unwrap();
        assert!(!result.converged);
        assert!(result.x >= 0.0 && result.x <= 10.0);
    }

    #[test]
    fn errors_propagate() {
        let result = BrentRootFinding::default()
            .find_root(Boundary::new(0.0, 1.0).unwrap(), 1e-6, &mut |_| {
                Err(ProcessError::OutsideCapacity { what: "test" })
            });
        assert!(result.unwrap_err().is_outside_capacity());
    }

    proptest! {
        // g(speed) = outlet_pressure(speed) - target for a monotone pressure curve
        #[test]
        fn monotone_function_meets_tolerance(
            p_min in 20.0f64..60.0,
            rise in 5.0f64..80.0,
            curvature in 1.0f64..2.5,
            t in 0.05f64..0.95,
        ) {
            let (s_min, s_max) = (7000.0, 10500.0);
            let pressure = |s: f64| p_min + rise * ((s - s_min) / (s_max - s_min)).powf(curvature);
            let target = pressure(s_min) + t * (pressure(s_max) - pressure(s_min));
            let result = solve_within(s_min, s_max, 1e-2, |s| pressure(s) - target);
            prop_assert!(result.converged);
            prop_assert!(result.x >= s_min && result.x <= s_max);
            prop_assert!((pressure(result.x) - target).abs() <= 1e-2);
        }

        #[test]
        fn steep_monotone_function_meets_tight_tolerance(
            curvature in 1.0f64..2.5,
            t in 0.05f64..0.95,
        ) {
            let (s_min, s_max) = (7000.0, 10500.0);
            let pressure = |s: f64| 20.0 + 400.0 * ((s - s_min) / (s_max - s_min)).powf(curvature);
            let target = pressure(s_min) + t * (pressure(s_max) - pressure(s_min));
            let result = solve_within(s_min, s_max, 1e-3, |s| pressure(s) - target);
            prop_assert!(result.converged);
            prop_assert!((pressure(result.x) - target).abs() <= 1e-3);
        }
    }
}
