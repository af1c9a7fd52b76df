//! Mandelbrot escape-time kernel and the grid sampler built on it.

pub mod grid;
pub mod palette;

use num_complex::Complex64;

pub use grid::{FractalImage, GridSpec, Region};

/// `|z|² ≥ 4`, i.e. bailout radius 2.
pub const BAILOUT_SQR: f64 = 4.0;

/// Outcome of iterating `z ← z² + c` from `z = c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// `|z|² ≥ 4` held at the start of iteration `n` (`n == 0`: `c` itself
    /// is outside the bailout disc).
    Diverged(u32),
    /// No escape within the iteration bound.
    Bounded,
}

impl Escape {
    pub fn is_bounded(self) -> bool {
        matches!(self, Escape::Bounded)
    }
}

/// Iterates `z ← z² + c` starting at `z = c`, checking the bailout before
/// each update.
#[inline]
pub fn escape(c: Complex64, max_iter: u32) -> Escape {
    let mut z = c;
    for n in 0..max_iter {
        if z.norm_sqr() >= BAILOUT_SQR {
            return Escape::Diverged(n);
        }
        z = z * z + c;
    }
    Escape::Bounded
}

/// Escape count for `c`: the iteration at which `|z|² ≥ 4` first held, or 0
/// when the bound was reached. Points outside the bailout disc therefore
/// also report 0.
#[inline]
pub fn escape_time(c: Complex64, max_iter: u32) -> u32 {
    match escape(c, max_iter) {
        Escape::Diverged(n) => n,
        Escape::Bounded => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_never_escapes() {
        for max_iter in [1, 2, 80, 1000] {
            assert_eq!(escape_time(Complex64::new(0.0, 0.0), max_iter), 0);
            assert_eq!(escape(Complex64::new(0.0, 0.0), max_iter), Escape::Bounded);
        }
    }

    #[test]
    fn test_bailout_boundary_is_inclusive() {
        // |2|² == 4 escapes before the first update
        assert_eq!(escape(Complex64::new(2.0, 0.0), 80), Escape::Diverged(0));
        assert_eq!(escape_time(Complex64::new(2.0, 0.0), 80), 0);
        assert_eq!(escape(Complex64::new(-2.0, 0.0), 80), Escape::Diverged(0));
        assert_eq!(escape(Complex64::new(0.0, 2.0), 80), Escape::Diverged(0));
    }

    #[test]
    fn test_outside_radius_two_escapes_immediately() {
        for c in [
            Complex64::new(2.5, 0.0),
            Complex64::new(-3.0, 1.0),
            Complex64::new(1.5, 1.5),
            Complex64::new(0.0, -2.01),
        ] {
            assert_eq!(escape(c, 50), Escape::Diverged(0), "c = {c}");
        }
    }

    #[test]
    fn test_known_escape_counts() {
        // z: 1 -> 2, |2|² = 4 at n = 1
        assert_eq!(escape_time(Complex64::new(1.0, 0.0), 80), 1);
        // z: .5, .75, 1.0625, 1.6289.., 3.1533.. escapes at n = 4
        assert_eq!(escape_time(Complex64::new(0.5, 0.0), 80), 4);
        // bound too small to see the escape
        assert_eq!(escape(Complex64::new(0.5, 0.0), 4), Escape::Bounded);
    }

    #[test]
    fn test_interior_points_are_bounded() {
        for c in [
            Complex64::new(-1.0, 0.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(-0.1, 0.1),
            Complex64::new(0.25, 0.0),
        ] {
            assert!(escape(c, 500).is_bounded(), "c = {c}");
        }
    }

    #[test]
    fn test_zero_bound() {
        assert_eq!(escape(Complex64::new(5.0, 0.0), 0), Escape::Bounded);
        assert_eq!(escape_time(Complex64::new(5.0, 0.0), 0), 0);
    }
}
