use super::{LorenzParams, State};
use crate::ode::{ComponentStats, Solution};
use serde::{Deserialize, Serialize};

pub const COMPONENT_NAMES: [&str; 3] = ["u", "v", "w"];

/// Sampled Lorenz trajectory together with the parameters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub params: LorenzParams,
    solution: Solution<3>,
}

/// Summary statistics of a trajectory, one entry per phase-space component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySummary {
    pub samples: usize,
    pub components: Vec<ComponentStats>,
    /// Largest magnitude reached by any component.
    pub abs_max: f64,
}

impl Trajectory {
    pub fn new(params: LorenzParams, solution: Solution<3>) -> Self {
        Self { params, solution }
    }

    pub fn len(&self) -> usize {
        self.solution.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solution.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.solution.times
    }

    pub fn states(&self) -> &[State] {
        &self.solution.states
    }

    pub fn steps(&self) -> usize {
        self.solution.steps
    }

    pub fn last(&self) -> Option<(f64, &State)> {
        self.solution.last()
    }

    /// `(t, u, v, w)` rows in time order.
    pub fn rows(&self) -> impl Iterator<Item = [f64; 4]> + '_ {
        self.solution.iter().map(|(t, s)| [t, s[0], s[1], s[2]])
    }

    pub fn u(&self) -> Vec<f64> {
        self.solution.component(0)
    }

    pub fn v(&self) -> Vec<f64> {
        self.solution.component(1)
    }

    pub fn w(&self) -> Vec<f64> {
        self.solution.component(2)
    }

    pub fn summary(&self) -> TrajectorySummary {
        let components = self.solution.stats();
        let abs_max = components.iter().fold(0.0_f64, |acc, c| acc.max(c.abs_max));
        TrajectorySummary {
            samples: self.len(),
            components,
            abs_max,
        }
    }
}
