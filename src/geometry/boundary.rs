//! Bounding polygon for planar meshes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors describing an invalid geometry selection or boundary polygon.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("unknown geometry '{0}' (expected 'sphere' or 'plane')")]
    UnknownMode(String),
    #[error("boundary polygon has no points")]
    EmptyPoints,
    #[error("boundary polygon has no edges")]
    EmptyEdges,
    #[error("boundary point {0} is not finite")]
    NonFinitePoint(usize),
    #[error("boundary edge {edge} references vertex {vertex}, but only {num_points} points exist")]
    EdgeOutOfRange {
        edge: usize,
        vertex: usize,
        num_points: usize,
    },
    #[error("boundary edge {0} connects a vertex to itself")]
    DegenerateEdge(usize),
}

/// Closed outline of a planar domain: an ordered vertex list plus the edges
/// joining them (zero-based vertex indices).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundaryPolygon {
    pub points: Vec<[f64; 2]>,
    pub edges: Vec<[usize; 2]>,
}

impl BoundaryPolygon {
    pub fn new(points: Vec<[f64; 2]>, edges: Vec<[usize; 2]>) -> Self {
        Self { points, edges }
    }

    /// Axis-aligned rectangle, vertices counter-clockwise from `(x_min, y_min)`.
    pub fn rectangle(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            points: vec![[x_min, y_min], [x_max, y_min], [x_max, y_max], [x_min, y_max]],
            edges: vec![[0, 1], [1, 2], [2, 3], [3, 0]],
        }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Checks that the polygon is usable as mesh-engine geometry.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.points.is_empty() {
            return Err(GeometryError::EmptyPoints);
        }
        if self.edges.is_empty() {
            return Err(GeometryError::EmptyEdges);
        }

        for (i, p) in self.points.iter().enumerate() {
            if !p[0].is_finite() || !p[1].is_finite() {
                return Err(GeometryError::NonFinitePoint(i));
            }
        }

        let num_points = self.points.len();
        for (i, &[a, b]) in self.edges.iter().enumerate() {
            for vertex in [a, b] {
                if vertex >= num_points {
                    return Err(GeometryError::EdgeOutOfRange { edge: i, vertex, num_points });
                }
            }
            if a == b {
                return Err(GeometryError::DegenerateEdge(i));
            }
        }

        Ok(())
    }
}
