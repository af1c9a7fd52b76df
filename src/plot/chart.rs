//! Multi-series line charts.

use super::{draw_to_image, drawing_error, FONT_FAMILY};
use crate::error::{NotebookError, NotebookResult};
use image::RgbImage;
use plotters::chart::SeriesLabelPosition;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const BLUE_RGB: [u8; 3] = [31, 119, 180];
pub const ORANGE_RGB: [u8; 3] = [255, 127, 14];
pub const GREEN_RGB: [u8; 3] = [44, 160, 44];
pub const RED_RGB: [u8; 3] = [214, 39, 40];

/// Default colors assigned to series in insertion order.
pub const CYCLE: [[u8; 3]; 4] = [BLUE_RGB, ORANGE_RGB, GREEN_RGB, RED_RGB];

const MARGIN: u32 = 12;
const X_LABEL_AREA: u32 = 45;
const Y_LABEL_AREA: u32 = 65;
const TITLE_SIZE: u32 = 22;
const TICK_LABEL_SIZE: u32 = 14;
const AXIS_LABEL_SIZE: u32 = 16;
const MIN_WIDTH: u32 = Y_LABEL_AREA + 2 * MARGIN + 40;
const MIN_HEIGHT: u32 = X_LABEL_AREA + 2 * MARGIN + 40;
/// Fraction of the data span added above and below the series.
const DATA_MARGIN: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendLocation {
    #[default]
    UpperRight,
    UpperLeft,
    LowerLeft,
    LowerRight,
}

impl From<LegendLocation> for SeriesLabelPosition {
    fn from(location: LegendLocation) -> Self {
        match location {
            LegendLocation::UpperRight => SeriesLabelPosition::UpperRight,
            LegendLocation::UpperLeft => SeriesLabelPosition::UpperLeft,
            LegendLocation::LowerLeft => SeriesLabelPosition::LowerLeft,
            LegendLocation::LowerRight => SeriesLabelPosition::LowerRight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_limits: Option<(f64, f64)>,
    pub y_limits: Option<(f64, f64)>,
    pub legend: LegendLocation,
    /// Legend text height in pixels.
    pub legend_font_size: u32,
    pub grid: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            x_limits: None,
            y_limits: None,
            legend: LegendLocation::UpperRight,
            legend_font_size: 15,
            grid: true,
        }
    }
}

impl ChartOptions {
    pub fn validate(&self) -> NotebookResult<()> {
        if self.width < MIN_WIDTH || self.height < MIN_HEIGHT {
            return Err(NotebookError::Plot(format!(
                "figure {}x{} is smaller than {MIN_WIDTH}x{MIN_HEIGHT}",
                self.width, self.height
            )));
        }
        if self.legend_font_size == 0 {
            return Err(NotebookError::Plot("legend_font_size must be at least 1".into()));
        }
        for (lo, hi) in self.x_limits.iter().chain(self.y_limits.iter()) {
            checked_range(*lo, *hi)?;
        }
        Ok(())
    }
}

fn checked_range(lo: f64, hi: f64) -> NotebookResult<(f64, f64)> {
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(NotebookError::Plot(format!("invalid axis limits [{lo}, {hi}]")));
    }
    Ok((lo, hi))
}

/// Range covering the finite `values`, padded by `margin` times the span.
/// A flat range is widened around its value; no values gives `[0, 1]`.
pub fn data_range<I: IntoIterator<Item = f64>>(values: I, margin: f64) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.5 };
        (lo - pad, hi + pad)
    } else {
        let pad = (hi - lo) * margin;
        (lo - pad, hi + pad)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: [u8; 3],
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Default)]
pub struct LineChart {
    pub options: ChartOptions,
    series: Vec<Series>,
}

impl LineChart {
    pub fn new(options: ChartOptions) -> Self {
        Self {
            options,
            series: Vec::new(),
        }
    }

    /// Adds a series from parallel x/y slices; extra values on either side
    /// are ignored. The color cycles through [`CYCLE`].
    pub fn add_series(&mut self, label: &str, xs: &[f64], ys: &[f64]) -> &mut Self {
        let color = CYCLE[self.series.len() % CYCLE.len()];
        self.add_series_colored(label, color, xs, ys)
    }

    pub fn add_series_colored(
        &mut self,
        label: &str,
        color: [u8; 3],
        xs: &[f64],
        ys: &[f64],
    ) -> &mut Self {
        self.series.push(Series {
            label: label.to_string(),
            color,
            points: xs.iter().copied().zip(ys.iter().copied()).collect(),
        });
        self
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Axis ranges: explicit limits, else the data with a small margin.
    pub fn ranges(&self) -> NotebookResult<((f64, f64), (f64, f64))> {
        let points = || self.series.iter().flat_map(|s| s.points.iter().copied());
        let x = match self.options.x_limits {
            Some((lo, hi)) => checked_range(lo, hi)?,
            None => data_range(points().map(|p| p.0), 0.0),
        };
        let y = match self.options.y_limits {
            Some((lo, hi)) => checked_range(lo, hi)?,
            None => data_range(points().map(|p| p.1), DATA_MARGIN),
        };
        Ok((x, y))
    }

    pub fn render(&self) -> NotebookResult<RgbImage> {
        let options = &self.options;
        options.validate()?;
        let (x, y) = self.ranges()?;

        draw_to_image(options.width, options.height, |root| {
            let mut builder = ChartBuilder::on(root);
            builder
                .margin(MARGIN)
                .x_label_area_size(X_LABEL_AREA)
                .y_label_area_size(Y_LABEL_AREA);
            if !options.title.is_empty() {
                builder.caption(&options.title, (FONT_FAMILY, TITLE_SIZE));
            }
            let mut chart = builder
                .build_cartesian_2d(x.0..x.1, y.0..y.1)
                .map_err(drawing_error)?;

            {
                let mut mesh = chart.configure_mesh();
                mesh.x_desc(options.x_label.as_str())
                    .y_desc(options.y_label.as_str())
                    .label_style((FONT_FAMILY, TICK_LABEL_SIZE))
                    .axis_desc_style((FONT_FAMILY, AXIS_LABEL_SIZE));
                if !options.grid {
                    mesh.disable_mesh();
                }
                mesh.draw().map_err(drawing_error)?;
            }

            for series in &self.series {
                let [r, g, b] = series.color;
                let color = RGBColor(r, g, b);
                let points = series
                    .points
                    .iter()
                    .copied()
                    .filter(|(px, py)| px.is_finite() && py.is_finite());
                let drawn = chart
                    .draw_series(LineSeries::new(points, color.stroke_width(1)))
                    .map_err(drawing_error)?;
                if !series.label.is_empty() {
                    drawn.label(series.label.as_str()).legend(move |(lx, ly)| {
                        PathElement::new(vec![(lx, ly), (lx + 20, ly)], color.stroke_width(2))
                    });
                }
            }

            if self.series.iter().any(|s| !s.label.is_empty()) {
                chart
                    .configure_series_labels()
                    .position(options.legend.into())
                    .label_font((FONT_FAMILY, options.legend_font_size))
                    .background_style(WHITE.mix(0.85))
                    .border_style(BLACK)
                    .draw()
                    .map_err(drawing_error)?;
            }
            Ok(())
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> NotebookResult<()> {
        self.render()?.save(path)?;
        Ok(())
    }
}
