//! Capability interfaces for user-supplied density generators.
//!
//! The host application picks a concrete generator at startup and hands it to
//! the pipeline wrapped in [`DensityFieldProvider`]. The variant must agree
//! with the run's [`GeometryMode`].

use crate::geometry::{BoundaryPolygon, GeometryMode};

use super::{Axis, DensityField, FieldError};

/// Raw output of a spherical generator: cell widths indexed `[lat][lon]`
/// (row-major) plus the 1D longitude and latitude axes in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereField {
    pub cell_width: Vec<f64>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

impl SphereField {
    /// Validates shape and values and converts to a [`DensityField`].
    pub fn into_density_field(self) -> Result<DensityField, FieldError> {
        let (rows, cols) = GeometryMode::Sphere.axis_names();
        DensityField::new(self.cell_width, Axis::new(rows, self.lat), Axis::new(cols, self.lon))
    }
}

/// Raw output of a planar generator: cell widths indexed `[y][x]` (row-major),
/// the 1D x and y axes, and the domain's bounding polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneField {
    pub cell_width: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub boundary: BoundaryPolygon,
}

impl PlaneField {
    /// Validates the field and the boundary polygon.
    pub fn into_parts(self) -> Result<(DensityField, BoundaryPolygon), FieldError> {
        let (rows, cols) = GeometryMode::Plane.axis_names();
        let field = DensityField::new(self.cell_width, Axis::new(rows, self.y), Axis::new(cols, self.x))?;
        self.boundary.validate()?;
        Ok((field, self.boundary))
    }
}

/// Generator for global meshes.
pub trait SphereProvider {
    /// Returns cell width as a function of latitude and longitude.
    fn cell_width_vs_lat_lon(&self) -> Result<SphereField, FieldError>;
}

/// Generator for planar meshes.
pub trait PlaneProvider {
    /// Returns cell width as a function of x and y, plus the domain boundary.
    fn cell_width_vs_xy(&self) -> Result<PlaneField, FieldError>;
}

/// The density generator selected for a run.
pub enum DensityFieldProvider {
    Sphere(Box<dyn SphereProvider>),
    Plane(Box<dyn PlaneProvider>),
}

impl DensityFieldProvider {
    pub fn sphere<P: SphereProvider + 'static>(provider: P) -> Self {
        DensityFieldProvider::Sphere(Box::new(provider))
    }

    pub fn plane<P: PlaneProvider + 'static>(provider: P) -> Self {
        DensityFieldProvider::Plane(Box::new(provider))
    }

    /// Geometry this provider generates for.
    pub fn geometry(&self) -> GeometryMode {
        match self {
            DensityFieldProvider::Sphere(_) => GeometryMode::Sphere,
            DensityFieldProvider::Plane(_) => GeometryMode::Plane,
        }
    }
}

impl std::fmt::Debug for DensityFieldProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DensityFieldProvider::{}", self.geometry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryError;

    #[test]
    fn sphere_field_uses_lat_rows() {
        let field = SphereField {
            cell_width: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            lon: vec![-180.0, 0.0, 180.0],
            lat: vec![-90.0, 90.0],
        }
        .into_density_field()
        .unwrap();
        assert_eq!(field.rows().name, "lat");
        assert_eq!(field.cols().name, "lon");
        assert_eq!(field.get(1, 0), 4.0);
    }

    #[test]
    fn sphere_field_shape_mismatch() {
        let err = SphereField {
            cell_width: vec![1.0; 5],
            lon: vec![-180.0, 0.0, 180.0],
            lat: vec![-90.0, 90.0],
        }
        .into_density_field()
        .unwrap_err();
        assert!(matches!(err, FieldError::ShapeMismatch { .. }));
    }

    #[test]
    fn plane_field_requires_edges() {
        let err = PlaneField {
            cell_width: vec![1.0; 4],
            x: vec![0.0, 1.0],
            y: vec![0.0, 1.0],
            boundary: BoundaryPolygon::new(vec![[0.0, 0.0], [1.0, 1.0]], vec![]),
        }
        .into_parts()
        .unwrap_err();
        assert_eq!(err, FieldError::Boundary(GeometryError::EmptyEdges));
    }
}
