//! Lorenz system: right-hand side, parameter presets and trajectory
//! generation on an evenly spaced time grid.

pub mod trajectory;

use crate::error::NotebookResult;
use crate::numeric::linspace;
use crate::ode::{self, OdeSystem, SolverOptions};
use log::info;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub use trajectory::{Trajectory, TrajectorySummary};

/// Phase-space point `(u, v, w)`.
pub type State = Vector3<f64>;

pub const DEFAULT_T_START: f64 = 0.0;
pub const DEFAULT_T_END: f64 = 200.0;
pub const DEFAULT_SAMPLES: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorenzParams {
    pub sigma: f64,
    pub beta: f64,
    pub rho: f64,
}

impl LorenzParams {
    pub const fn new(sigma: f64, beta: f64, rho: f64) -> Self {
        Self { sigma, beta, rho }
    }

    /// Classic chaotic attractor.
    pub const fn chaotic() -> Self {
        Self::new(10.0, 2.667, 28.0)
    }

    /// Stable periodic orbit inside a periodic window of rho.
    pub const fn periodic() -> Self {
        Self::new(10.0, 2.667, 99.96)
    }

    /// Below the Hopf bifurcation: spirals into one of the two fixed points.
    pub const fn damped() -> Self {
        Self::new(10.0, 2.667, 14.0)
    }
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self::chaotic()
    }
}

/// The Lorenz equations with fixed parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lorenz {
    pub params: LorenzParams,
}

impl Lorenz {
    pub fn new(params: LorenzParams) -> Self {
        Self { params }
    }
}

impl OdeSystem<3> for Lorenz {
    fn derivative(&self, _t: f64, y: &State) -> State {
        derivative(y, &self.params)
    }
}

/// `(u', v', w') = (-σ(u - v), ρu - v - uw, -βw + uv)`
#[inline]
pub fn derivative(state: &State, params: &LorenzParams) -> State {
    let (u, v, w) = (state[0], state[1], state[2]);
    Vector3::new(
        -params.sigma * (u - v),
        params.rho * u - v - u * w,
        -params.beta * w + u * v,
    )
}

/// Integrate the Lorenz system from `initial`, sampling at `times`.
pub fn solve(
    params: LorenzParams,
    initial: State,
    times: &[f64],
    options: &SolverOptions,
) -> NotebookResult<Trajectory> {
    let solution = ode::integrate(&Lorenz::new(params), initial, times, options)?;
    let trajectory = Trajectory::new(params, solution);
    info!(
        "lorenz sigma={} beta={} rho={}: {} samples, {} steps, max |x| = {:.3}",
        params.sigma,
        params.beta,
        params.rho,
        trajectory.len(),
        trajectory.steps(),
        trajectory.summary().abs_max
    );
    Ok(trajectory)
}

/// Integrate over `linspace(t_start, t_end, samples)`.
pub fn solve_on_grid(
    params: LorenzParams,
    initial: State,
    t_start: f64,
    t_end: f64,
    samples: usize,
    options: &SolverOptions,
) -> NotebookResult<Trajectory> {
    solve(params, initial, &linspace(t_start, t_end, samples), options)
}
