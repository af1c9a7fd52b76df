//! Run configuration loaded from JSON or TOML.
//!
//! Every field is optional; missing sections fall back to the built-in
//! demonstration settings.

use crate::error::{NotebookError, NotebookResult};
use crate::export::FileFormat;
use crate::fractal::palette::ColorMode;
use crate::fractal::{GridSpec, Region};
use crate::lorenz::{self, LorenzParams, State};
use crate::ode::SolverOptions;
use crate::plot::{Aspect, ChartOptions, ImageOptions, LegendLocation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookConfig {
    /// Directory receiving PNG and export files.
    pub output_dir: PathBuf,
    pub lorenz: LorenzConfig,
    pub mandelbrot: MandelbrotConfig,
    pub plot: PlotConfig,
}

/// A named parameter set of the Lorenz system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    pub name: String,
    pub sigma: f64,
    pub beta: f64,
    pub rho: f64,
}

impl RegimeConfig {
    pub fn new(name: &str, params: LorenzParams) -> Self {
        Self {
            name: name.to_string(),
            sigma: params.sigma,
            beta: params.beta,
            rho: params.rho,
        }
    }

    pub fn params(&self) -> LorenzParams {
        LorenzParams::new(self.sigma, self.beta, self.rho)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LorenzConfig {
    pub initial: [f64; 3],
    pub t_start: f64,
    pub t_end: f64,
    pub samples: usize,
    pub regimes: Vec<RegimeConfig>,
    pub solver: SolverOptions,
    /// Also write each trajectory in this format.
    pub export: Option<FileFormat>,
}

impl Default for LorenzConfig {
    fn default() -> Self {
        Self {
            initial: [1.0, 0.0, 0.0],
            t_start: lorenz::DEFAULT_T_START,
            t_end: lorenz::DEFAULT_T_END,
            samples: lorenz::DEFAULT_SAMPLES,
            regimes: vec![
                RegimeConfig::new("periodic", LorenzParams::periodic()),
                RegimeConfig::new("chaotic", LorenzParams::chaotic()),
            ],
            solver: SolverOptions::default(),
            export: None,
        }
    }
}

impl LorenzConfig {
    pub fn initial_state(&self) -> State {
        State::from(self.initial)
    }
}

/// One sampled window of the complex plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub name: String,
    pub region: Region,
    pub nx: usize,
    pub ny: usize,
    pub max_iter: u32,
    /// Tick-label extent when it should differ from `region`.
    pub extent: Option<Region>,
}

impl ViewConfig {
    pub fn full() -> Self {
        Self {
            name: "full".into(),
            region: Region::new(-2.0, 0.5, -1.25, 1.25),
            nx: 1000,
            ny: 1000,
            max_iter: 80,
            extent: None,
        }
    }

    pub fn zoom() -> Self {
        Self {
            name: "zoom".into(),
            region: Region::new(-0.74877, -0.74872, 0.06505, 0.06510),
            nx: 1000,
            ny: 1000,
            max_iter: 2048,
            extent: None,
        }
    }

    pub fn grid_spec(&self) -> GridSpec {
        GridSpec {
            region: self.region,
            nx: self.nx,
            ny: self.ny,
            max_iter: self.max_iter,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::full()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MandelbrotConfig {
    pub views: Vec<ViewConfig>,
    pub color_mode: ColorMode,
    pub clip: (f64, f64),
    pub aspect: Aspect,
}

impl Default for MandelbrotConfig {
    fn default() -> Self {
        Self {
            views: vec![ViewConfig::full(), ViewConfig::zoom()],
            color_mode: ColorMode::Channels,
            clip: (0.0, 1.0),
            aspect: Aspect::Equal,
        }
    }
}

impl MandelbrotConfig {
    pub fn image_options(&self, view: &ViewConfig) -> ImageOptions {
        ImageOptions {
            title: format!("Mandelbrot {} (max_iter={})", view.name, view.max_iter),
            aspect: self.aspect,
            clip: self.clip,
            color_mode: self.color_mode,
            extent: view.extent,
            ..ImageOptions::default()
        }
    }
}

/// Fixed axis ranges for one kind of chart; unset axes follow the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisLimits {
    pub x: Option<(f64, f64)>,
    pub y: Option<(f64, f64)>,
}

/// Line chart settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    pub legend: LegendLocation,
    pub legend_font_size: u32,
    pub grid: bool,
    /// Limits of the `u, v, w` against `t` charts.
    pub time_series: AxisLimits,
    /// Limits of the `(u, w)` phase portraits.
    pub phase_portrait: AxisLimits,
}

impl Default for PlotConfig {
    fn default() -> Self {
        let chart = ChartOptions::default();
        Self {
            width: chart.width,
            height: chart.height,
            legend: chart.legend,
            legend_font_size: chart.legend_font_size,
            grid: chart.grid,
            time_series: AxisLimits::default(),
            phase_portrait: AxisLimits::default(),
        }
    }
}

impl PlotConfig {
    pub fn chart_options(&self, limits: &AxisLimits) -> ChartOptions {
        ChartOptions {
            width: self.width,
            height: self.height,
            x_limits: limits.x,
            y_limits: limits.y,
            legend: self.legend,
            legend_font_size: self.legend_font_size,
            grid: self.grid,
            ..ChartOptions::default()
        }
    }
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            lorenz: LorenzConfig::default(),
            mandelbrot: MandelbrotConfig::default(),
            plot: PlotConfig::default(),
        }
    }
}

impl NotebookConfig {
    /// Reads a `.json` or `.toml` file.
    pub fn load<P: AsRef<Path>>(path: P) -> NotebookResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        let content = match ext.as_deref() {
            Some("json") | Some("toml") => std::fs::read_to_string(path)?,
            _ => return Err(NotebookError::UnsupportedFormat(path.to_path_buf())),
        };
        if ext.as_deref() == Some("json") {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    pub fn from_json(content: &str) -> NotebookResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml(content: &str) -> NotebookResult<Self> {
        Ok(toml::from_str(content)?)
    }
}
