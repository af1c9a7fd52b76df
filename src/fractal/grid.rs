use super::escape_time;
use crate::error::{NotebookError, NotebookResult};
use crate::numeric::linspace;
use log::debug;
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Axis-aligned rectangle of the complex plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Region {
    pub const fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn validate(&self) -> NotebookResult<()> {
        let bounds = [self.x_min, self.x_max, self.y_min, self.y_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(NotebookError::Region(format!("non-finite bounds {self:?}")));
        }
        Ok(())
    }
}

/// Everything needed to sample one fractal image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub region: Region,
    pub nx: usize,
    pub ny: usize,
    pub max_iter: u32,
}

impl GridSpec {
    /// Largest bound for which `3 * max_iter` still fits a channel.
    pub const MAX_ITER_LIMIT: u32 = u32::MAX / 3;

    pub fn validate(&self) -> NotebookResult<()> {
        self.region.validate()?;
        if self.max_iter > Self::MAX_ITER_LIMIT {
            return Err(NotebookError::Resolution(format!(
                "max_iter {} exceeds {}",
                self.max_iter,
                Self::MAX_ITER_LIMIT
            )));
        }
        Ok(())
    }

    fn axes(&self) -> (Vec<f64>, Vec<f64>) {
        (
            linspace(self.region.x_min, self.region.x_max, self.nx),
            linspace(self.region.y_min, self.region.y_max, self.ny),
        )
    }
}

/// `(nx, ny, 3)` array of `(m, 2m, 3m)` escape-count channels, stored with
/// the y index varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct FractalImage {
    pub spec: GridSpec,
    data: Vec<[u32; 3]>,
}

#[inline]
fn channels(m: u32) -> [u32; 3] {
    [m, 2 * m, 3 * m]
}

impl FractalImage {
    /// Row-parallel build; identical output to [`FractalImage::compute_serial`].
    pub fn compute(spec: &GridSpec) -> NotebookResult<Self> {
        spec.validate()?;
        let start = Instant::now();
        let (xs, ys) = spec.axes();
        let mut data = vec![[0u32; 3]; spec.nx * spec.ny];
        if !data.is_empty() {
            data.par_chunks_exact_mut(spec.ny)
                .zip(xs.par_iter())
                .for_each(|(column, &x)| {
                    for (cell, &y) in column.iter_mut().zip(&ys) {
                        *cell = channels(escape_time(Complex64::new(x, y), spec.max_iter));
                    }
                });
        }
        debug!(
            "sampled {}x{} grid (max_iter {}) in {:?}",
            spec.nx,
            spec.ny,
            spec.max_iter,
            start.elapsed()
        );
        Ok(Self { spec: *spec, data })
    }

    /// Plain double loop over x then y samples.
    pub fn compute_serial(spec: &GridSpec) -> NotebookResult<Self> {
        spec.validate()?;
        let (xs, ys) = spec.axes();
        let mut data = Vec::with_capacity(spec.nx * spec.ny);
        for &x in &xs {
            for &y in &ys {
                data.push(channels(escape_time(Complex64::new(x, y), spec.max_iter)));
            }
        }
        Ok(Self { spec: *spec, data })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.spec.nx, self.spec.ny, 3)
    }

    pub fn nx(&self) -> usize {
        self.spec.nx
    }

    pub fn ny(&self) -> usize {
        self.spec.ny
    }

    pub fn max_iter(&self) -> u32 {
        self.spec.max_iter
    }

    /// Channels at x index `i`, y index `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<[u32; 3]> {
        if i < self.spec.nx && j < self.spec.ny {
            Some(self.data[i * self.spec.ny + j])
        } else {
            None
        }
    }

    /// Raw escape count `m` at `(i, j)`.
    pub fn escape_count(&self, i: usize, j: usize) -> Option<u32> {
        self.get(i, j).map(|c| c[0])
    }

    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.data.iter().flatten().copied()
    }

    /// Fraction of samples reporting 0 (bounded, or outside the bailout disc).
    pub fn zero_fraction(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let zeros = self.data.iter().filter(|c| c[0] == 0).count();
        zeros as f64 / self.data.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(nx: usize, ny: usize) -> GridSpec {
        GridSpec {
            region: Region::new(-2.0, 0.5, -1.25, 1.25),
            nx,
            ny,
            max_iter: 80,
        }
    }

    #[test]
    fn test_shape_and_non_negative() {
        let img = FractalImage::compute(&spec(40, 30)).unwrap();
        assert_eq!(img.shape(), (40, 30, 3));
        assert_eq!(img.values().count(), 40 * 30 * 3);
        assert!(img.values().all(|v| v <= 3 * 80));
    }

    #[test]
    fn test_channel_encoding() {
        let img = FractalImage::compute(&spec(25, 25)).unwrap();
        for i in 0..25 {
            for j in 0..25 {
                let [a, b, c] = img.get(i, j).unwrap();
                assert_eq!(b, 2 * a);
                assert_eq!(c, 3 * a);
            }
        }
    }

    #[test]
    fn test_parallel_matches_serial_and_is_idempotent() {
        let s = spec(33, 17);
        let first = FractalImage::compute(&s).unwrap();
        let second = FractalImage::compute(&s).unwrap();
        let serial = FractalImage::compute_serial(&s).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, serial);
    }

    #[test]
    fn test_sample_positions_follow_linspace() {
        // 3x3 over [-2, 2]^2: corners sit on |c|² = 8, centre is the origin
        let s = GridSpec {
            region: Region::new(-2.0, 2.0, -2.0, 2.0),
            nx: 3,
            ny: 3,
            max_iter: 20,
        };
        let img = FractalImage::compute(&s).unwrap();
        assert_eq!(img.escape_count(1, 1), Some(0));
        // c = 0 + 2i escapes before the first update
        assert_eq!(img.escape_count(1, 2), Some(0));
        // c = -2 + 0i, likewise; c = 2 at the far x edge
        assert_eq!(img.escape_count(0, 1), Some(0));
        assert_eq!(img.escape_count(2, 1), Some(0));
    }

    #[test]
    fn test_real_axis_sample() {
        // single column at x = 1: escapes after one update
        let s = GridSpec {
            region: Region::new(1.0, 1.0, 0.0, 0.0),
            nx: 1,
            ny: 1,
            max_iter: 10,
        };
        let img = FractalImage::compute(&s).unwrap();
        assert_eq!(img.get(0, 0), Some([1, 2, 3]));
        assert_eq!(img.get(1, 0), None);
    }

    #[test]
    fn test_empty_grid() {
        let img = FractalImage::compute(&spec(0, 10)).unwrap();
        assert_eq!(img.shape(), (0, 10, 3));
        assert_eq!(img.values().count(), 0);
        let img = FractalImage::compute(&spec(10, 0)).unwrap();
        assert_eq!(img.values().count(), 0);
        assert_eq!(img.zero_fraction(), 0.0);
    }

    #[test]
    fn test_invalid_region() {
        let s = GridSpec {
            region: Region::new(f64::NAN, 1.0, 0.0, 1.0),
            nx: 2,
            ny: 2,
            max_iter: 10,
        };
        assert!(matches!(FractalImage::compute(&s), Err(NotebookError::Region(_))));
        let s = GridSpec {
            max_iter: u32::MAX,
            ..spec(2, 2)
        };
        assert!(matches!(FractalImage::compute(&s), Err(NotebookError::Resolution(_))));
        let s = GridSpec {
            max_iter: GridSpec::MAX_ITER_LIMIT,
            ..spec(1, 1)
        };
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_full_view_contains_interior_and_escaping_points() {
        let img = FractalImage::compute(&spec(60, 60)).unwrap();
        let frac = img.zero_fraction();
        assert!(frac > 0.1 && frac < 0.9, "zero fraction {frac}");
        assert!(img.values().any(|v| v > 0));
    }
}
