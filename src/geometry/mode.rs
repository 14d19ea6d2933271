//! Geometry mode: spherical (lat/lon) or planar (x/y) meshes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GeometryError;

/// Which surface the mesh is built on. Fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryMode {
    /// Global mesh on the sphere; density indexed by (lat, lon).
    #[default]
    Sphere,
    /// Regional mesh on a plane; density indexed by (y, x) and bounded by a polygon.
    Plane,
}

impl GeometryMode {
    /// Returns the lowercase name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            GeometryMode::Sphere => "sphere",
            GeometryMode::Plane => "plane",
        }
    }

    pub fn on_sphere(&self) -> bool {
        matches!(self, GeometryMode::Sphere)
    }

    /// Names of the (row, column) axes of a density field in this mode.
    pub fn axis_names(&self) -> (&'static str, &'static str) {
        match self {
            GeometryMode::Sphere => ("lat", "lon"),
            GeometryMode::Plane => ("y", "x"),
        }
    }

    /// Whether a bounding polygon must accompany the density field.
    pub fn requires_boundary(&self) -> bool {
        matches!(self, GeometryMode::Plane)
    }
}

impl fmt::Display for GeometryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GeometryMode {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sphere" => Ok(GeometryMode::Sphere),
            "plane" => Ok(GeometryMode::Plane),
            _ => Err(GeometryError::UnknownMode(s.to_string())),
        }
    }
}
