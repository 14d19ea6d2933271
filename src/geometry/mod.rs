//! Mesh geometry: the sphere/plane selector and planar boundary polygons.

mod boundary;
mod mode;

pub use boundary::{BoundaryPolygon, GeometryError};
pub use mode::GeometryMode;
