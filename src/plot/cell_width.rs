//! Diagnostic plot of a global cell-width field.
//!
//! Renders the field on a plate carrée projection covering the whole globe
//! (north up), overlays a lat/lon graticule, and appends a vertical colorbar.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Rgb};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::colormap::{lerp_rgb, Colormap};
use crate::field::DensityField;

const GRID_COLOR: [u8; 3] = [128, 128, 128];
const BORDER_COLOR: [u8; 3] = [0, 0, 0];
const BACKGROUND: [u8; 3] = [255, 255, 255];

/// Horizontal space reserved right of the map for the colorbar.
const COLORBAR_GAP: u32 = 24;
const COLORBAR_WIDTH: u32 = 28;
const COLORBAR_MARGIN: u32 = 24;

/// Errors that can occur while plotting.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid plot dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),
}

/// `[plot]` section: layout of the diagnostic image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Width of the map area in pixels.
    pub width: u32,
    /// Height of the map area in pixels.
    pub height: u32,
    /// Draw a colorbar right of the map.
    pub colorbar: bool,
    /// Graticule spacing in degrees; 0 disables it.
    pub gridline_spacing_deg: f64,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 800,
            colorbar: true,
            gridline_spacing_deg: 30.0,
        }
    }
}

/// What was plotted.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSummary {
    pub path: PathBuf,
    pub min: f64,
    pub max: f64,
    pub width: u32,
    pub height: u32,
}

impl PlotSummary {
    /// Caption for the plot. The PNG carries no text, so this goes to the log.
    pub fn title(&self) -> String {
        format!("Grid cell size, km, min: {:.1} max: {:.1}", self.min, self.max)
    }
}

fn on_gridline(coord: f64, spacing: f64, half_pixel: f64) -> bool {
    let nearest = (coord / spacing).round() * spacing;
    (coord - nearest).abs() <= half_pixel
}

fn render_map_row(
    field: &DensityField,
    cmap: &Colormap,
    options: &PlotOptions,
    y: u32,
    min: f64,
    range: f64,
) -> Vec<[u8; 3]> {
    let (w, h) = (options.width, options.height);
    let lat = 90.0 - (y as f64 + 0.5) / h as f64 * 180.0;
    let half_px_lat = 90.0 / h as f64;
    let half_px_lon = 180.0 / w as f64;
    let spacing = options.gridline_spacing_deg;
    let lat_line = spacing > 0.0 && on_gridline(lat, spacing, half_px_lat);

    (0..w)
        .map(|x| {
            let lon = -180.0 + (x as f64 + 0.5) / w as f64 * 360.0;
            let v = field.sample_nearest(lat, lon);
            let color = cmap.sample((v - min) / range);
            if lat_line || (spacing > 0.0 && on_gridline(lon, spacing, half_px_lon)) {
                lerp_rgb(color, GRID_COLOR, 0.5)
            } else {
                color
            }
        })
        .collect()
}

fn render_colorbar_row(cmap: &Colormap, options: &PlotOptions, y: u32) -> Vec<[u8; 3]> {
    let total = COLORBAR_GAP + COLORBAR_WIDTH + COLORBAR_MARGIN;
    let mut row = vec![BACKGROUND; total as usize];

    // Bar spans the middle 60% of the map height, maximum at the top.
    let bar_h = ((options.height as f64) * 0.6).round().max(2.0) as u32;
    let top = (options.height - bar_h.min(options.height)) / 2;
    if y < top || y >= top + bar_h {
        return row;
    }

    let t = 1.0 - (y - top) as f64 / (bar_h - 1) as f64;
    let color = cmap.sample(t);
    let is_edge_row = y == top || y == top + bar_h - 1;
    for x in 0..COLORBAR_WIDTH {
        let is_edge_col = x == 0 || x == COLORBAR_WIDTH - 1;
        row[(COLORBAR_GAP + x) as usize] = if is_edge_row || is_edge_col { BORDER_COLOR } else { color };
    }
    row
}

/// Plots `field` as an RGB PNG at `path`.
pub fn plot_cell_width(
    field: &DensityField,
    path: &Path,
    options: &PlotOptions,
) -> Result<PlotSummary, PlotError> {
    if options.width < 2 || options.height < 2 {
        return Err(PlotError::InvalidDimensions(options.width, options.height));
    }

    let (min, max) = field.min_max();
    let range = if max > min { max - min } else { 1.0 };
    let cmap = Colormap::white_blue_green_yellow();

    let extra = if options.colorbar { COLORBAR_GAP + COLORBAR_WIDTH + COLORBAR_MARGIN } else { 0 };
    let width = options.width + extra;
    let height = options.height;

    let rows: Vec<Vec<[u8; 3]>> = (0..height)
        .into_par_iter()
        .map(|y| {
            let mut row = render_map_row(field, &cmap, options, y, min, range);
            if options.colorbar {
                row.extend(render_colorbar_row(&cmap, options, y));
            }
            row
        })
        .collect();

    let raw: Vec<u8> = rows.into_iter().flatten().flatten().collect();
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, raw)
        .ok_or(PlotError::InvalidDimensions(width, height))?;

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive);
    encoder.write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)?;

    let summary = PlotSummary {
        path: path.to_path_buf(),
        min,
        max,
        width,
        height,
    };
    info!("{}", summary.title());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Axis;
    use tempfile::tempdir;

    fn banded_field() -> DensityField {
        let lat = Axis::linspace("lat", -90.0, 90.0, 10.0).unwrap();
        let lon = Axis::linspace("lon", -180.0, 180.0, 10.0).unwrap();
        DensityField::from_fn(lat, lon, |lat, _| 30.0 + lat.abs()).unwrap()
    }

    #[test]
    fn writes_png_with_colorbar_width() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cellWidthGlobal.png");
        let options = PlotOptions { width: 72, height: 36, ..Default::default() };

        let summary = plot_cell_width(&banded_field(), &path, &options).unwrap();
        assert_eq!(summary.min, 30.0);
        assert_eq!(summary.max, 120.0);
        assert_eq!(summary.title(), "Grid cell size, km, min: 30.0 max: 120.0");

        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 72 + COLORBAR_GAP + COLORBAR_WIDTH + COLORBAR_MARGIN);
        assert_eq!(img.height(), 36);
    }

    #[test]
    fn poles_and_equator_use_colormap_ends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plot.png");
        let options = PlotOptions {
            width: 40,
            height: 20,
            colorbar: false,
            gridline_spacing_deg: 0.0,
        };
        plot_cell_width(&banded_field(), &path, &options).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        let cmap = Colormap::white_blue_green_yellow();
        // Top row samples the north pole (largest width), row 9 the equator.
        assert_eq!(img.get_pixel(5, 0).0, cmap.sample(1.0));
        assert_eq!(img.get_pixel(5, 9).0, cmap.sample(0.0));
        assert_eq!(img.width(), 40);
    }

    #[test]
    fn constant_field_and_bad_dimensions() {
        let field = DensityField::new(
            vec![50.0; 4],
            Axis::new("lat", vec![-90.0, 90.0]),
            Axis::new("lon", vec![-180.0, 180.0]),
        )
        .unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("flat.png");
        plot_cell_width(&field, &path, &PlotOptions { width: 8, height: 4, ..Default::default() }).unwrap();
        assert!(path.exists());

        let err = plot_cell_width(&field, &path, &PlotOptions { width: 1, ..Default::default() }).unwrap_err();
        assert!(matches!(err, PlotError::InvalidDimensions(1, 800)));
    }
}
