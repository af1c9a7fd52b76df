//! PNG plots drawn with plotters.
//!
//! Line charts for Lorenz trajectories and framed images for fractal arrays.
//! Figures are drawn into an in-memory RGB buffer and handed back as an
//! `image::RgbImage`, so callers can inspect pixels before saving. Text uses a
//! bundled DejaVu Sans face registered with plotters' `ab_glyph` backend.

pub mod chart;
pub mod image_plot;

pub use chart::{ChartOptions, LegendLocation, LineChart};
pub use image_plot::{Aspect, ImageOptions};

use crate::error::{NotebookError, NotebookResult};
use crate::lorenz::trajectory::COMPONENT_NAMES;
use crate::lorenz::Trajectory;
use image::RgbImage;
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::sync::OnceLock;

/// Family name every plot text style refers to.
pub const FONT_FAMILY: &str = "sans-serif";

static FONT_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Registers the bundled face under [`FONT_FAMILY`] once per process.
pub fn register_fonts() -> NotebookResult<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok());
    if ok {
        Ok(())
    } else {
        Err(NotebookError::Drawing("bundled font could not be parsed".into()))
    }
}

pub(crate) fn drawing_error<E: std::fmt::Display>(err: E) -> NotebookError {
    NotebookError::Drawing(err.to_string())
}

/// Runs `draw` on a white `width × height` bitmap and returns the pixels.
pub(crate) fn draw_to_image<F>(width: u32, height: u32, draw: F) -> NotebookResult<RgbImage>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> NotebookResult<()>,
{
    register_fonts()?;
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing_error)?;
        draw(&root)?;
        root.present().map_err(drawing_error)?;
    }
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| NotebookError::Drawing("bitmap buffer size mismatch".into()))
}

fn regime_caption(trajectory: &Trajectory) -> String {
    let p = trajectory.params;
    format!("σ={} β={} ρ={}", p.sigma, p.beta, p.rho)
}

/// `u`, `v` and `w` against time.
pub fn time_series_chart(trajectory: &Trajectory, base: &ChartOptions) -> LineChart {
    let options = ChartOptions {
        title: format!("Lorenz {}", regime_caption(trajectory)),
        x_label: "t".into(),
        y_label: "state".into(),
        ..base.clone()
    };
    let mut chart = LineChart::new(options);
    let times = trajectory.times();
    let columns = [trajectory.u(), trajectory.v(), trajectory.w()];
    for (name, values) in COMPONENT_NAMES.iter().zip(columns.iter()) {
        chart.add_series(name, times, values);
    }
    chart
}

/// Projection of the trajectory onto the `(u, w)` plane.
pub fn phase_portrait_chart(trajectory: &Trajectory, base: &ChartOptions) -> LineChart {
    let options = ChartOptions {
        title: format!("Phase portrait {}", regime_caption(trajectory)),
        x_label: "u".into(),
        y_label: "w".into(),
        ..base.clone()
    };
    let mut chart = LineChart::new(options);
    chart.add_series("trajectory", &trajectory.u(), &trajectory.w());
    chart
}
