//! Renders a sampled fractal array as an image inside plotters axes.

use super::{draw_to_image, drawing_error, FONT_FAMILY};
use crate::error::{NotebookError, NotebookResult};
use crate::fractal::palette::{ColorMode, Gradient};
use crate::fractal::{FractalImage, Region};
use image::{Rgb, RgbImage};
use plotters::element::BitMapElement;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

const MARGIN: u32 = 12;
const X_LABEL_AREA: u32 = 45;
const Y_LABEL_AREA: u32 = 90;
const TITLE_SIZE: u32 = 22;
/// Vertical space reserved for the caption when a title is set.
const TITLE_AREA: u32 = TITLE_SIZE + 2 * MARGIN;
const TICK_LABEL_SIZE: u32 = 14;
const AXIS_LABEL_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    /// Pixel proportions follow the region's proportions.
    #[default]
    Equal,
    /// One pixel per grid sample.
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Axis extent used for tick labels; defaults to the sampled region.
    /// A bound pair given high-to-low flips the image along that axis.
    pub extent: Option<Region>,
    pub aspect: Aspect,
    /// Normalized channel values are clipped to `[vmin, vmax]`.
    pub clip: (f64, f64),
    pub color_mode: ColorMode,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: "Re(c)".into(),
            y_label: "Im(c)".into(),
            extent: None,
            aspect: Aspect::Equal,
            clip: (0.0, 1.0),
            color_mode: ColorMode::Channels,
        }
    }
}

impl ImageOptions {
    pub fn validate(&self) -> NotebookResult<()> {
        let (vmin, vmax) = self.clip;
        if !(vmin.is_finite() && vmax.is_finite() && vmin < vmax) {
            return Err(NotebookError::Plot(format!("invalid clip range [{vmin}, {vmax}]")));
        }
        if let Some(extent) = &self.extent {
            extent.validate()?;
        }
        Ok(())
    }
}

/// Maps channel triples to RGB: divide by `max_iter`, clip, rescale to 0..255.
fn channel_color(channels: [u32; 3], max_iter: u32, clip: (f64, f64)) -> [u8; 3] {
    let (vmin, vmax) = clip;
    channels.map(|c| {
        let v = if max_iter == 0 { 0.0 } else { c as f64 / max_iter as f64 };
        let t = ((v - vmin) / (vmax - vmin)).clamp(0.0, 1.0);
        (t * 255.0).round() as u8
    })
}

/// Plot-area size for `image` under `aspect`.
///
/// With [`Aspect::Equal`] the longer side gets `max(nx, ny)` pixels and the
/// other side follows the region's proportions, never dropping below one.
pub fn raster_size(image: &FractalImage, aspect: Aspect) -> (u32, u32) {
    let (nx, ny) = (image.nx() as u32, image.ny() as u32);
    let region = image.spec.region;
    let (width, height) = (region.width().abs(), region.height().abs());
    match aspect {
        Aspect::Equal if nx > 0 && ny > 0 && width > 0.0 && height > 0.0 => {
            let long = nx.max(ny) as f64;
            let scaled = |side: f64| (side.round() as u32).clamp(1, nx.max(ny));
            if width >= height {
                (nx.max(ny), scaled(long * height / width))
            } else {
                (scaled(long * width / height), nx.max(ny))
            }
        }
        _ => (nx, ny),
    }
}

/// Ascending axis range for the bounds `a`, `b`; a flat pair is widened.
fn axis_range(a: f64, b: f64) -> (f64, f64) {
    if a == b {
        let pad = if a == 0.0 { 1.0 } else { a.abs() * 0.5 };
        (a - pad, a + pad)
    } else {
        (a.min(b), a.max(b))
    }
}

/// Index of the sample covering pixel `p` of `pixels`, counted from the
/// low end of the axis.
fn sample_index(p: u32, pixels: u32, samples: usize, flipped: bool) -> usize {
    let mut f = (p as f64 + 0.5) / pixels as f64;
    if flipped {
        f = 1.0 - f;
    }
    ((f * samples as f64) as usize).min(samples - 1)
}

/// Nearest-sample `width × height` raster of `image`. Columns follow the
/// ascending x axis and rows the ascending y axis (upward), so a region or
/// extent given high-to-low is mirrored to match its tick labels.
pub fn rasterize(
    image: &FractalImage,
    options: &ImageOptions,
    (width, height): (u32, u32),
) -> NotebookResult<RgbImage> {
    options.validate()?;
    let (nx, ny) = (image.nx(), image.ny());
    if width == 0 || height == 0 || nx == 0 || ny == 0 {
        return Err(NotebookError::Plot(format!(
            "cannot render a {nx}x{ny} grid into {width}x{height} pixels"
        )));
    }
    let extent = options.extent.unwrap_or(image.spec.region);
    let flip_x = extent.x_min > extent.x_max;
    let flip_y = extent.y_min > extent.y_max;
    let gradient = match options.color_mode {
        ColorMode::Gradient => Some(Gradient::new(image.max_iter())),
        ColorMode::Channels => None,
    };

    let columns: Vec<usize> = (0..width).map(|px| sample_index(px, width, nx, flip_x)).collect();
    let mut raster = RgbImage::new(width, height);
    for (px, py, pixel) in raster.enumerate_pixels_mut() {
        let i = columns[px as usize];
        let j = sample_index(height - 1 - py, height, ny, flip_y);
        let channels = image.get(i, j).unwrap_or([0; 3]);
        let color = match &gradient {
            Some(g) => g.color(channels[0]),
            None => channel_color(channels, image.max_iter(), options.clip),
        };
        *pixel = Rgb(color);
    }
    Ok(raster)
}

/// Figure size that leaves roughly `raster` pixels for the plot area.
pub fn figure_size(raster: (u32, u32), titled: bool) -> (u32, u32) {
    let title = if titled { TITLE_AREA } else { 0 };
    (
        raster.0 + Y_LABEL_AREA + 2 * MARGIN,
        raster.1 + X_LABEL_AREA + 2 * MARGIN + title,
    )
}

/// Full figure: axes with tick labels and title, raster filling the plot area.
pub fn render(image: &FractalImage, options: &ImageOptions) -> NotebookResult<RgbImage> {
    options.validate()?;
    if image.nx() == 0 || image.ny() == 0 {
        return Err(NotebookError::Plot(format!(
            "cannot render an empty {}x{} grid",
            image.nx(),
            image.ny()
        )));
    }
    let extent = options.extent.unwrap_or(image.spec.region);
    extent.validate()?;
    let x = axis_range(extent.x_min, extent.x_max);
    let y = axis_range(extent.y_min, extent.y_max);
    let (fw, fh) = figure_size(raster_size(image, options.aspect), !options.title.is_empty());

    draw_to_image(fw, fh, |root| {
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
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(options.x_label.as_str())
            .y_desc(options.y_label.as_str())
            .label_style((FONT_FAMILY, TICK_LABEL_SIZE))
            .axis_desc_style((FONT_FAMILY, AXIS_LABEL_SIZE))
            .draw()
            .map_err(drawing_error)?;

        let area = chart.plotting_area().dim_in_pixel();
        let raster = rasterize(image, options, area)?;
        // anchored at the upper-left corner of the plot area
        let element: BitMapElement<(f64, f64)> =
            BitMapElement::with_owned_buffer((x.0, y.1), area, raster.into_raw())
            .ok_or_else(|| NotebookError::Drawing("raster does not match the plot area".into()))?;
        chart
            .draw_series(std::iter::once(element))
            .map_err(drawing_error)?;
        Ok(())
    })
}

pub fn save<P: AsRef<Path>>(image: &FractalImage, options: &ImageOptions, path: P) -> NotebookResult<()> {
    render(image, options)?.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractal::GridSpec;
    use tempfile::tempdir;

    fn image(nx: usize, ny: usize) -> FractalImage {
        FractalImage::compute(&GridSpec {
            region: Region::new(-2.0, 0.5, -1.25, 1.25),
            nx,
            ny,
            max_iter: 50,
        })
        .unwrap()
    }

    /// Two samples on the real axis: `c = -2.5` escapes at once (black),
    /// `c = 0.5` escapes at n = 4.
    fn real_axis_pair(x_min: f64, x_max: f64) -> FractalImage {
        FractalImage::compute(&GridSpec {
            region: Region::new(x_min, x_max, 0.0, 0.0),
            nx: 2,
            ny: 1,
            max_iter: 10,
        })
        .unwrap()
    }

    const ESCAPED_AT_4: [u8; 3] = [102, 204, 255];

    #[test]
    fn test_channel_normalization_and_clipping() {
        assert_eq!(channel_color([0, 0, 0], 50, (0.0, 1.0)), [0, 0, 0]);
        assert_eq!(channel_color([25, 50, 75], 50, (0.0, 1.0)), [128, 255, 255]);
        assert_eq!(channel_color([10, 20, 30], 40, (0.0, 0.5)), [128, 255, 255]);
        assert_eq!(channel_color([7, 14, 21], 0, (0.0, 1.0)), [0, 0, 0]);
    }

    #[test]
    fn test_raster_size_follows_aspect() {
        let img = image(50, 20);
        assert_eq!(raster_size(&img, Aspect::Auto), (50, 20));
        // region is square, so equal aspect gives a square raster
        assert_eq!(raster_size(&img, Aspect::Equal), (50, 50));
        let wide = FractalImage::compute(&GridSpec {
            region: Region::new(0.0, 2.0, 0.0, 1.0),
            nx: 40,
            ny: 40,
            max_iter: 5,
        })
        .unwrap();
        assert_eq!(raster_size(&wide, Aspect::Equal), (40, 20));
    }

    #[test]
    fn test_raster_size_is_bounded_for_thin_regions() {
        let thin = FractalImage::compute(&GridSpec {
            region: Region::new(-0.75, -0.75 + 1e-9, 0.0, 1.0),
            nx: 10,
            ny: 10,
            max_iter: 10,
        })
        .unwrap();
        assert_eq!(raster_size(&thin, Aspect::Equal), (1, 10));
        let flat = FractalImage::compute(&GridSpec {
            region: Region::new(0.0, 1.0, 0.0, 1e-12),
            nx: 30,
            ny: 8,
            max_iter: 10,
        })
        .unwrap();
        assert_eq!(raster_size(&flat, Aspect::Equal), (30, 1));
        assert_eq!(raster_size(&image(0, 5), Aspect::Equal), (0, 5));
        let figure = render(&thin, &ImageOptions::default()).unwrap();
        assert_eq!(figure.dimensions(), figure_size((1, 10), false));
    }

    #[test]
    fn test_raster_orientation() {
        // single column at x = 0.5: y = 0 escapes at n = 4, y = 2 before
        // the first update
        let img = FractalImage::compute(&GridSpec {
            region: Region::new(0.5, 0.5, 0.0, 2.0),
            nx: 1,
            ny: 2,
            max_iter: 10,
        })
        .unwrap();
        let raster = rasterize(&img, &ImageOptions::default(), (1, 2)).unwrap();
        assert_eq!(raster.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(raster.get_pixel(0, 1).0, ESCAPED_AT_4);
    }

    #[test]
    fn test_descending_region_matches_axis_direction() {
        let ascending = rasterize(&real_axis_pair(-2.5, 0.5), &ImageOptions::default(), (2, 1))
            .unwrap();
        let descending = rasterize(&real_axis_pair(0.5, -2.5), &ImageOptions::default(), (2, 1))
            .unwrap();
        // x = -2.5 sits on the left of the ascending axis either way
        for raster in [&ascending, &descending] {
            assert_eq!(raster.get_pixel(0, 0).0, [0, 0, 0]);
            assert_eq!(raster.get_pixel(1, 0).0, ESCAPED_AT_4);
        }
        // an explicit high-to-low extent mirrors the image
        let mirrored = ImageOptions {
            extent: Some(Region::new(0.5, -2.5, 0.0, 1.0)),
            ..ImageOptions::default()
        };
        let raster = rasterize(&real_axis_pair(-2.5, 0.5), &mirrored, (2, 1)).unwrap();
        assert_eq!(raster.get_pixel(0, 0).0, ESCAPED_AT_4);
    }

    #[test]
    fn test_rasterize_resamples_to_requested_size() {
        let img = image(10, 10);
        let raster = rasterize(&img, &ImageOptions::default(), (40, 25)).unwrap();
        assert_eq!(raster.dimensions(), (40, 25));
        // bottom-left pixel shows sample (0, 0)
        let expected = channel_color(img.get(0, 0).unwrap(), 50, (0.0, 1.0));
        assert_eq!(raster.get_pixel(0, 24).0, expected);
    }

    #[test]
    fn test_gradient_mode_blackens_zero_counts() {
        let img = image(30, 30);
        let options = ImageOptions {
            color_mode: ColorMode::Gradient,
            ..ImageOptions::default()
        };
        let raster = rasterize(&img, &options, (30, 30)).unwrap();
        // centre column crosses the main cardioid
        let (i, j) = (24, 15);
        assert_eq!(img.escape_count(i, j), Some(0));
        assert_eq!(raster.get_pixel(i as u32, (29 - j) as u32).0, [0, 0, 0]);
    }

    #[test]
    fn test_render_adds_axes_around_raster() {
        let img = image(64, 64);
        let options = ImageOptions {
            title: "Mandelbrot".into(),
            ..ImageOptions::default()
        };
        let figure = render(&img, &options).unwrap();
        assert_eq!(figure.dimensions(), figure_size((64, 64), true));
        // interior points of the set are drawn black somewhere in the figure
        assert!(figure.pixels().any(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_rejects_empty_grid_and_bad_options() {
        let empty = image(0, 0);
        assert!(matches!(render(&empty, &ImageOptions::default()), Err(NotebookError::Plot(_))));
        assert!(rasterize(&image(4, 4), &ImageOptions::default(), (0, 3)).is_err());
        let bad = ImageOptions {
            clip: (1.0, 1.0),
            ..ImageOptions::default()
        };
        assert!(matches!(
            rasterize(&image(4, 4), &bad, (4, 4)),
            Err(NotebookError::Plot(_))
        ));
        let bad_extent = ImageOptions {
            extent: Some(Region::new(f64::NAN, 1.0, 0.0, 1.0)),
            ..ImageOptions::default()
        };
        assert!(matches!(render(&image(4, 4), &bad_extent), Err(NotebookError::Region(_))));
    }

    #[test]
    fn test_save_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mandelbrot.png");
        save(&image(32, 32), &ImageOptions::default(), &path).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), figure_size((32, 32), false));
    }
}
