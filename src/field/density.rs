//! The density (cell-width) field and its coordinate axes.

use rayon::prelude::*;
use thiserror::Error;

use crate::geometry::{GeometryError, GeometryMode};

/// Errors raised while building or validating a density field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("axis '{0}' is empty")]
    EmptyAxis(String),
    #[error("axis '{0}' is not strictly monotonic")]
    NonMonotonicAxis(String),
    #[error("axis '{name}' has a non-finite value at index {index}")]
    NonFiniteAxis { name: String, index: usize },
    #[error("field has {values} values but axes '{rows}' x '{cols}' imply {expected}")]
    ShapeMismatch {
        rows: String,
        cols: String,
        values: usize,
        expected: usize,
    },
    #[error("cell width at index {index} must be finite and strictly positive, got {value}")]
    NonPositiveValue { index: usize, value: f64 },
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("invalid boundary polygon: {0}")]
    Boundary(#[from] GeometryError),
    #[error("density generator failed: {0}")]
    Generator(String),
}

/// A named, strictly monotonic 1D coordinate array.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub values: Vec<f64>,
}

impl Axis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self { name: name.into(), values }
    }

    /// Evenly spaced axis from `start` to `end` inclusive.
    ///
    /// The number of points is `round((end - start) / step) + 1`, so the last
    /// point lands exactly on `end`.
    pub fn linspace(name: impl Into<String>, start: f64, end: f64, step: f64) -> Result<Self, FieldError> {
        if !(step > 0.0) || !step.is_finite() {
            return Err(FieldError::InvalidParameter {
                name: "step",
                reason: format!("must be a positive number, got {}", step),
            });
        }
        if !(end > start) {
            return Err(FieldError::InvalidParameter {
                name: "range",
                reason: format!("end ({}) must exceed start ({})", end, start),
            });
        }

        let intervals = ((end - start) / step).round().max(1.0) as usize;
        let values = (0..=intervals)
            .map(|i| start + (end - start) * (i as f64 / intervals as f64))
            .collect();
        Ok(Self::new(name, values))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_increasing(&self) -> bool {
        self.values.windows(2).all(|w| w[1] > w[0])
    }

    pub fn is_decreasing(&self) -> bool {
        self.values.windows(2).all(|w| w[1] < w[0])
    }

    fn validate(&self) -> Result<(), FieldError> {
        if self.values.is_empty() {
            return Err(FieldError::EmptyAxis(self.name.clone()));
        }
        if let Some(index) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(FieldError::NonFiniteAxis { name: self.name.clone(), index });
        }
        if !self.is_increasing() && !self.is_decreasing() {
            return Err(FieldError::NonMonotonicAxis(self.name.clone()));
        }
        Ok(())
    }

    /// Index of the coordinate closest to `v`.
    pub fn nearest(&self, v: f64) -> usize {
        let n = self.values.len();
        if n <= 1 {
            return 0;
        }

        let increasing = self.values[1] > self.values[0];
        // First index whose coordinate is on the far side of `v`.
        let upper = self.values.partition_point(|&c| if increasing { c < v } else { c > v });
        if upper == 0 {
            return 0;
        }
        if upper >= n {
            return n - 1;
        }
        let lower = upper - 1;
        if (self.values[upper] - v).abs() < (v - self.values[lower]).abs() {
            upper
        } else {
            lower
        }
    }
}

/// Desired local mesh-cell size over a 2D coordinate grid.
///
/// Values are stored row-major: `values[row * cols.len() + col]`, where rows
/// follow the latitude (or y) axis and columns the longitude (or x) axis.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityField {
    values: Vec<f64>,
    rows: Axis,
    cols: Axis,
}

impl DensityField {
    /// Builds a validated field.
    ///
    /// Fails if either axis is empty or non-monotonic, if the number of values
    /// does not match the axes, or if any value is not strictly positive.
    pub fn new(values: Vec<f64>, rows: Axis, cols: Axis) -> Result<Self, FieldError> {
        rows.validate()?;
        cols.validate()?;

        let expected = rows.len() * cols.len();
        if values.len() != expected {
            return Err(FieldError::ShapeMismatch {
                rows: rows.name.clone(),
                cols: cols.name.clone(),
                values: values.len(),
                expected,
            });
        }

        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(v.is_finite() && **v > 0.0))
        {
            return Err(FieldError::NonPositiveValue { index, value });
        }

        Ok(Self { values, rows, cols })
    }

    /// Evaluates `f(row_coord, col_coord)` at every grid point.
    pub fn from_fn<F>(rows: Axis, cols: Axis, f: F) -> Result<Self, FieldError>
    where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        let ncols = cols.len();
        let values: Vec<f64> = (0..rows.len() * ncols)
            .into_par_iter()
            .map(|idx| f(rows.values[idx / ncols], cols.values[idx % ncols]))
            .collect();
        Self::new(values, rows, cols)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Latitude (sphere) or y (plane) axis.
    pub fn rows(&self) -> &Axis {
        &self.rows
    }

    /// Longitude (sphere) or x (plane) axis.
    pub fn cols(&self) -> &Axis {
        &self.cols
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols.len() + col]
    }

    /// Smallest and largest cell width.
    pub fn min_max(&self) -> (f64, f64) {
        self.values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Cell width at the grid point nearest to `(row_coord, col_coord)`.
    pub fn sample_nearest(&self, row_coord: f64, col_coord: f64) -> f64 {
        self.get(self.rows.nearest(row_coord), self.cols.nearest(col_coord))
    }

    /// Whether the axis names match the convention for `geometry`.
    pub fn matches_geometry(&self, geometry: GeometryMode) -> bool {
        let (r, c) = geometry.axis_names();
        self.rows.name == r && self.cols.name == c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes() -> (Axis, Axis) {
        (Axis::new("lat", vec![-45.0, 0.0, 45.0]), Axis::new("lon", vec![-90.0, 0.0, 90.0, 180.0]))
    }

    #[test]
    fn new_accepts_matching_shape() {
        let (rows, cols) = axes();
        let field = DensityField::new(vec![30.0; 12], rows, cols).unwrap();
        assert_eq!(field.shape(), (3, 4));
        assert_eq!(field.get(2, 3), 30.0);
        assert!(field.matches_geometry(GeometryMode::Sphere));
        assert!(!field.matches_geometry(GeometryMode::Plane));
    }

    #[test]
    fn shape_mismatch_rejected() {
        let (rows, cols) = axes();
        let err = DensityField::new(vec![30.0; 11], rows, cols).unwrap_err();
        assert!(matches!(err, FieldError::ShapeMismatch { values: 11, expected: 12, .. }));
    }

    #[test]
    fn non_positive_values_rejected() {
        let (rows, cols) = axes();
        let mut values = vec![30.0; 12];
        values[5] = 0.0;
        let err = DensityField::new(values, rows, cols).unwrap_err();
        assert_eq!(err, FieldError::NonPositiveValue { index: 5, value: 0.0 });
    }

    #[test]
    fn non_monotonic_axis_rejected() {
        let rows = Axis::new("lat", vec![0.0, 10.0, 5.0]);
        let cols = Axis::new("lon", vec![0.0]);
        let err = DensityField::new(vec![1.0; 3], rows, cols).unwrap_err();
        assert_eq!(err, FieldError::NonMonotonicAxis("lat".to_string()));
    }

    #[test]
    fn from_fn_evaluates_row_major() {
        let rows = Axis::new("y", vec![0.0, 1.0]);
        let cols = Axis::new("x", vec![10.0, 20.0, 30.0]);
        let field = DensityField::from_fn(rows, cols, |y, x| x + 100.0 * y).unwrap();
        assert_eq!(field.values(), &[10.0, 20.0, 30.0, 110.0, 120.0, 130.0]);
        assert_eq!(field.min_max(), (10.0, 130.0));
    }

    #[test]
    fn linspace_hits_both_ends() {
        let axis = Axis::linspace("lon", -180.0, 180.0, 1.0).unwrap();
        assert_eq!(axis.len(), 361);
        assert_eq!(axis.values[0], -180.0);
        assert_eq!(axis.values[360], 180.0);
        assert!(Axis::linspace("lon", 0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn nearest_handles_both_directions() {
        let inc = Axis::new("a", vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(inc.nearest(-5.0), 0);
        assert_eq!(inc.nearest(1.4), 1);
        assert_eq!(inc.nearest(1.6), 2);
        assert_eq!(inc.nearest(9.0), 3);

        let dec = Axis::new("b", vec![3.0, 2.0, 1.0, 0.0]);
        assert_eq!(dec.nearest(2.9), 0);
        assert_eq!(dec.nearest(0.4), 3);
    }
}
