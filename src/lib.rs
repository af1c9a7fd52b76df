//! Two numerical demonstrations: Lorenz trajectories from an adaptive ODE
//! solver, and escape-time images of the Mandelbrot set.

pub mod config;
pub mod error;
pub mod export;
pub mod fractal;
pub mod lorenz;
pub mod numeric;
pub mod ode;
pub mod plot;

pub use config::NotebookConfig;
pub use error::{NotebookError, NotebookResult};
