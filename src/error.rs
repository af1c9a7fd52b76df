//! Error types shared by the solver, the fractal builder, plotting and export.

use std::path::PathBuf;

/// Errors raised by the notebook library.
#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    #[error("time grid must be strictly increasing (t[{index}] = {value})")]
    TimeGrid { index: usize, value: f64 },
    #[error("invalid solver option: {0}")]
    SolverOptions(String),
    #[error("initial state contains non-finite values")]
    InitialState,
    #[error("step budget of {max_steps} exhausted at t = {t}")]
    StepBudget { max_steps: usize, t: f64 },
    #[error("step size underflow ({h:e}) at t = {t}")]
    StepUnderflow { h: f64, t: f64 },
    #[error("invalid fractal region: {0}")]
    Region(String),
    #[error("invalid grid resolution: {0}")]
    Resolution(String),
    #[error("invalid plot options: {0}")]
    Plot(String),
    #[error("drawing failed: {0}")]
    Drawing(String),
    #[error("unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type NotebookResult<T> = Result<T, NotebookError>;
