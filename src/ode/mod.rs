//! Initial value problem solver sampled on a caller-supplied time grid.
//!
//! The solver advances from one output time to the next. The adaptive
//! Dormand–Prince method carries its step size across output intervals and
//! clamps the final step of each interval so every requested time is hit
//! exactly. Fixed-step methods split each interval into equal substeps.

pub mod steppers;

use crate::error::{NotebookError, NotebookResult};
use log::debug;
use nalgebra::SVector;
use serde::{Deserialize, Serialize};

pub use steppers::{dopri_step, euler_step, rk4_step};

/// Right-hand side of `dy/dt = f(t, y)` for a `D`-dimensional state.
pub trait OdeSystem<const D: usize> {
    fn derivative(&self, t: f64, y: &SVector<f64, D>) -> SVector<f64, D>;
}

impl<F, const D: usize> OdeSystem<D> for F
where
    F: Fn(f64, &SVector<f64, D>) -> SVector<f64, D>,
{
    fn derivative(&self, t: f64, y: &SVector<f64, D>) -> SVector<f64, D> {
        self(t, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Euler,
    Rk4,
    DormandPrince,
}

/// Solver configuration. The tolerance defaults match the classic `odeint`
/// defaults; `dt` only applies to the fixed-step methods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    pub method: Method,
    pub rtol: f64,
    pub atol: f64,
    pub initial_step: f64,
    pub min_step: f64,
    pub max_step: f64,
    pub max_steps: usize,
    pub dt: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            method: Method::DormandPrince,
            rtol: 1.49012e-8,
            atol: 1.49012e-8,
            initial_step: 1e-3,
            min_step: 1e-12,
            max_step: 1.0,
            max_steps: 5_000_000,
            dt: 1e-3,
        }
    }
}

impl SolverOptions {
    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> NotebookResult<()> {
        let positive = [
            ("rtol", self.rtol),
            ("atol", self.atol),
            ("initial_step", self.initial_step),
            ("min_step", self.min_step),
            ("max_step", self.max_step),
            ("dt", self.dt),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(NotebookError::SolverOptions(format!(
                    "{name} must be a positive finite number, got {value}"
                )));
            }
        }
        if self.min_step > self.max_step {
            return Err(NotebookError::SolverOptions(format!(
                "min_step ({}) exceeds max_step ({})",
                self.min_step, self.max_step
            )));
        }
        if self.max_steps == 0 {
            return Err(NotebookError::SolverOptions("max_steps must be non-zero".into()));
        }
        Ok(())
    }
}

/// Per-component summary of a solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub abs_max: f64,
}

/// Sampled solution: one state per requested time.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<const D: usize> {
    pub times: Vec<f64>,
    pub states: Vec<SVector<f64, D>>,
    /// Number of integration steps taken (accepted and rejected).
    pub steps: usize,
}

impl<const D: usize> Solution<D> {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &SVector<f64, D>)> {
        self.times.iter().copied().zip(self.states.iter())
    }

    /// Values of component `k` over time.
    pub fn component(&self, k: usize) -> Vec<f64> {
        self.states.iter().map(|s| s[k]).collect()
    }

    pub fn last(&self) -> Option<(f64, &SVector<f64, D>)> {
        self.iter().last()
    }

    pub fn stats(&self) -> Vec<ComponentStats> {
        (0..D)
            .map(|k| {
                let mut stats = ComponentStats {
                    min: f64::INFINITY,
                    max: f64::NEG_INFINITY,
                    mean: 0.0,
                    abs_max: 0.0,
                };
                let mut sum = 0.0;
                for s in &self.states {
                    let v = s[k];
                    stats.min = stats.min.min(v);
                    stats.max = stats.max.max(v);
                    stats.abs_max = stats.abs_max.max(v.abs());
                    sum += v;
                }
                if self.states.is_empty() {
                    stats.min = 0.0;
                    stats.max = 0.0;
                } else {
                    stats.mean = sum / self.states.len() as f64;
                }
                stats
            })
            .collect()
    }
}

/// Integrate `system` from `y0` at `times[0]`, sampling the state at every
/// entry of `times`.
pub fn integrate<S, const D: usize>(
    system: &S,
    y0: SVector<f64, D>,
    times: &[f64],
    options: &SolverOptions,
) -> NotebookResult<Solution<D>>
where
    S: OdeSystem<D>,
{
    options.validate()?;
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(NotebookError::InitialState);
    }
    check_time_grid(times)?;

    let mut solution = Solution {
        times: times.to_vec(),
        states: Vec::with_capacity(times.len()),
        steps: 0,
    };
    if times.is_empty() {
        return Ok(solution);
    }

    let mut y = y0;
    solution.states.push(y);
    let mut h = options.initial_step.min(options.max_step);

    for window in times.windows(2) {
        let (t_a, t_b) = (window[0], window[1]);
        y = match options.method {
            Method::Euler => {
                fixed_interval(system, t_a, t_b, y, options, &mut solution.steps, euler_step)?
            }
            Method::Rk4 => {
                fixed_interval(system, t_a, t_b, y, options, &mut solution.steps, rk4_step)?
            }
            Method::DormandPrince => {
                adaptive_interval(system, t_a, t_b, y, &mut h, options, &mut solution.steps)?
            }
        };
        solution.states.push(y);
    }

    debug!(
        "integrated {} samples over [{}, {}] with {:?} in {} steps",
        solution.len(),
        times[0],
        times[times.len() - 1],
        options.method,
        solution.steps
    );
    Ok(solution)
}

fn check_time_grid(times: &[f64]) -> NotebookResult<()> {
    for (index, &value) in times.iter().enumerate() {
        if !value.is_finite() || (index > 0 && value <= times[index - 1]) {
            return Err(NotebookError::TimeGrid { index, value });
        }
    }
    Ok(())
}

type Stepper<S, const D: usize> = fn(&S, f64, &SVector<f64, D>, f64) -> SVector<f64, D>;

fn fixed_interval<S, const D: usize>(
    system: &S,
    t_a: f64,
    t_b: f64,
    mut y: SVector<f64, D>,
    options: &SolverOptions,
    steps: &mut usize,
    step: Stepper<S, D>,
) -> NotebookResult<SVector<f64, D>>
where
    S: OdeSystem<D>,
{
    let span = t_b - t_a;
    let substeps = (span / options.dt).ceil().max(1.0) as usize;
    let h = span / substeps as f64;
    for i in 0..substeps {
        if *steps >= options.max_steps {
            return Err(NotebookError::StepBudget {
                max_steps: options.max_steps,
                t: t_a + i as f64 * h,
            });
        }
        y = step(system, t_a + i as f64 * h, &y, h);
        *steps += 1;
    }
    Ok(y)
}

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

fn adaptive_interval<S, const D: usize>(
    system: &S,
    t_a: f64,
    t_b: f64,
    mut y: SVector<f64, D>,
    h: &mut f64,
    options: &SolverOptions,
    steps: &mut usize,
) -> NotebookResult<SVector<f64, D>>
where
    S: OdeSystem<D>,
{
    let mut t = t_a;
    while t < t_b {
        if *steps >= options.max_steps {
            return Err(NotebookError::StepBudget {
                max_steps: options.max_steps,
                t,
            });
        }
        let remaining = t_b - t;
        let clamped = *h >= remaining;
        let h_try = if clamped { remaining } else { *h };

        let (y_new, err) = dopri_step(system, t, &y, h_try);
        *steps += 1;
        let norm = steppers::error_norm(&err, &y, &y_new, options.rtol, options.atol);

        if norm <= 1.0 {
            t = if clamped { t_b } else { t + h_try };
            y = y_new;
            let factor = if norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
            };
            // A step shortened to land on t_b says nothing about the
            // attainable step size, so it may only grow h.
            let proposed = (h_try * factor).min(options.max_step);
            *h = if clamped { (*h).max(proposed) } else { proposed };
        } else {
            let factor = if norm.is_finite() {
                (SAFETY * norm.powf(-0.2)).max(MIN_FACTOR)
            } else {
                MIN_FACTOR
            };
            *h = h_try * factor;
            if *h < options.min_step {
                return Err(NotebookError::StepUnderflow { h: *h, t });
            }
        }
    }
    Ok(y)
}
