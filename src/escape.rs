// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The escape-time function.  A point `c` belongs to the Mandelbrot
//! set if repeatedly squaring `z` and adding `c` never carries `z`
//! further than 2 from the origin.  We can't iterate forever, so a
//! point that stays close for the whole iteration budget is called
//! converged; a point that leaves is tagged with the step at which it
//! left.
use num::Complex;

/// The squared escape radius.  Comparing `re² + im²` against 4 saves
/// a square root per step over comparing the magnitude against 2.
pub const ESCAPE_NORM_SQR: f64 = 4.0;

/// The outcome of evaluating a single point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Escape {
    /// The point has not been processed yet.
    Unevaluated,
    /// The orbit stayed bounded for the full iteration budget.
    Converged,
    /// The orbit crossed the escape radius at this (1-based) step.
    Diverged(u32),
}

impl Default for Escape {
    fn default() -> Self {
        Escape::Unevaluated
    }
}

impl Escape {
    /// True only for points that stayed bounded.
    pub fn is_converged(&self) -> bool {
        *self == Escape::Converged
    }

    /// The step at which the orbit escaped, if it did.
    pub fn iterations(&self) -> Option<u32> {
        match *self {
            Escape::Diverged(k) => Some(k),
            _ => None,
        }
    }

    /// The integer written to frame records: `-1` for converged, `0`
    /// for never evaluated, otherwise the escape step.
    pub fn record_value(&self) -> i64 {
        match *self {
            Escape::Unevaluated => 0,
            Escape::Converged => -1,
            Escape::Diverged(k) => i64::from(k),
        }
    }
}

/// This is our classic iterator function.  Starting from `seed`, it
/// iterates `z = z² + c` at most `max_iterations` times and reports the
/// first step at which `z` leaves the escape radius.  Non-finite values
/// count as escaped.
pub fn evaluate(c: Complex<f64>, seed: Complex<f64>, max_iterations: u32) -> Escape {
    let mut z = seed;
    for step in 1..=max_iterations {
        z = z * z + c;
        // NaN fails every comparison, so test for "inside" and negate.
        if !(z.norm_sqr() <= ESCAPE_NORM_SQR) {
            return Escape::Diverged(step);
        }
    }
    Escape::Converged
}

/// `evaluate` with the conventional zero seed.
#[inline]
pub fn evaluate_from_origin(c: Complex<f64>, max_iterations: u32) -> Escape {
    evaluate(c, Complex::new(0.0, 0.0), max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const ORIGIN: Complex<f64> = Complex { re: 0.0, im: 0.0 };

    #[test]
    fn origin_is_a_fixed_point() {
        for m in 1..64 {
            assert_eq!(evaluate(ORIGIN, ORIGIN, m), Escape::Converged);
        }
    }

    #[test]
    fn far_point_escapes_on_first_step() {
        assert_eq!(evaluate_from_origin(Complex::new(2.0, 2.0), 10), Escape::Diverged(1));
    }

    #[test]
    fn one_plus_i_escapes_on_second_step() {
        // 1+i -> 1+3i, |1+3i|² = 10
        assert_eq!(evaluate_from_origin(Complex::new(1.0, 1.0), 10), Escape::Diverged(2));
    }

    #[test]
    fn boundary_is_not_escape() {
        // -2 is in the set: -2 -> 2 -> 2 ... with |z|² exactly 4.
        assert_eq!(evaluate_from_origin(Complex::new(-2.0, 0.0), 100), Escape::Converged);
    }

    #[test]
    fn budget_caps_iterations() {
        // 0.26 escapes, slowly
        let slow = Complex::new(0.26, 0.0);
        let escaped = evaluate_from_origin(slow, 10_000);
        let k = escaped.iterations().unwrap();
        assert!(k > 10);
        assert_eq!(evaluate_from_origin(slow, k - 1), Escape::Converged);
        assert_eq!(evaluate_from_origin(slow, k), Escape::Diverged(k));
    }

    #[test]
    fn zero_budget_converges() {
        assert_eq!(evaluate_from_origin(Complex::new(10.0, 0.0), 0), Escape::Converged);
    }

    #[test]
    fn non_finite_points_diverge() {
        assert_eq!(evaluate_from_origin(Complex::new(std::f64::NAN, 0.0), 10), Escape::Diverged(1));
        assert_eq!(
            evaluate_from_origin(Complex::new(std::f64::INFINITY, 0.0), 10),
            Escape::Diverged(1)
        );
    }

    #[test]
    fn seed_changes_the_orbit() {
        let c = Complex::new(0.1, 0.1);
        assert_eq!(evaluate(c, ORIGIN, 50), Escape::Converged);
        assert_eq!(evaluate(c, Complex::new(3.0, 0.0), 50), Escape::Diverged(1));
    }

    #[test]
    fn matches_first_crossing_of_reference_orbit() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let c = Complex::new(rng.gen_range(-2.5..1.5), rng.gen_range(-1.5..1.5));
            let mut z = ORIGIN;
            let mut first = None;
            for k in 1..=200u32 {
                z = z * z + c;
                if z.re * z.re + z.im * z.im > 4.0 {
                    first = Some(k);
                    break;
                }
            }
            let expected = match first {
                Some(k) => Escape::Diverged(k),
                None => Escape::Converged,
            };
            assert_eq!(evaluate_from_origin(c, 200), expected, "c = {}", c);
        }
    }

    #[test]
    fn record_values() {
        assert_eq!(Escape::Unevaluated.record_value(), 0);
        assert_eq!(Escape::Converged.record_value(), -1);
        assert_eq!(Escape::Diverged(7).record_value(), 7);
        assert_eq!(Escape::default(), Escape::Unevaluated);
    }
}
