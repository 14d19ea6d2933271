//! Analytic cell-width functions used by the built-in generators.

use super::config::{DensityConfig, EddyClosure, QuasiUniform, RossbyRadius, UniformPlane};
use super::provider::{DensityFieldProvider, PlaneField, PlaneProvider, SphereField, SphereProvider};
use super::{Axis, DensityField, FieldError};
use crate::geometry::BoundaryPolygon;

/// Global lon/lat axes in degrees, both endpoints included.
pub fn lon_lat_axes(grid_spacing_deg: f64) -> Result<(Axis, Axis), FieldError> {
    let lon = Axis::linspace("lon", -180.0, 180.0, grid_spacing_deg)?;
    let lat = Axis::linspace("lat", -90.0, 90.0, grid_spacing_deg)?;
    Ok((lon, lat))
}

fn require_positive(name: &'static str, value: f64) -> Result<(), FieldError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FieldError::InvalidParameter {
            name,
            reason: format!("must be positive, got {}", value),
        })
    }
}

/// Eddy-closure cell width (km) at latitude `lat` (degrees).
///
/// Densities are `(w_min / w)^4`; the equatorial and polar blends are each a
/// tanh step, and `lat_transition` picks which blend applies.
pub fn eddy_closure_cell_width(p: &EddyClosure, lat: f64) -> f64 {
    let min_width = p.cell_width_eq.min(p.cell_width_mid_lat).min(p.cell_width_pole);
    let density = |w: f64| (min_width / w).powi(4);
    let density_eq = density(p.cell_width_eq);
    let density_mid = density(p.cell_width_mid_lat);
    let density_pole = density(p.cell_width_pole);

    let abs_lat = lat.abs();
    let blended = if abs_lat < p.lat_transition {
        (density_eq - density_mid) * (1.0 + ((p.lat_pos_eq - abs_lat) / p.lat_width_eq).tanh()) / 2.0
            + density_mid
    } else {
        (density_mid - density_pole) * (1.0 + ((p.lat_pos_pole - abs_lat) / p.lat_width_pole).tanh())
            / 2.0
            + density_pole
    };

    min_width / blended.powf(0.25)
}

/// Rossby-radius-scaled cell width (km) at latitude `lat` (degrees).
pub fn rossby_radius_cell_width(p: &RossbyRadius, lat: f64) -> f64 {
    let gamma = (p.cell_width_pole / p.cell_width_eq).powi(4);
    let density = (1.0 - gamma) * lat.abs().to_radians().sin().powi(4) + gamma;
    p.cell_width_pole / density.powf(0.25)
}

fn sphere_field_from_lat<F>(grid_spacing_deg: f64, width_at: F) -> Result<SphereField, FieldError>
where
    F: Fn(f64) -> f64 + Sync,
{
    let (lon, lat) = lon_lat_axes(grid_spacing_deg)?;
    let field = DensityField::from_fn(lat, lon, |lat, _lon| width_at(lat))?;
    Ok(SphereField {
        cell_width: field.values().to_vec(),
        lon: field.cols().values.clone(),
        lat: field.rows().values.clone(),
    })
}

impl SphereProvider for QuasiUniform {
    fn cell_width_vs_lat_lon(&self) -> Result<SphereField, FieldError> {
        require_positive("cell_width_km", self.cell_width_km)?;
        let width = self.cell_width_km;
        sphere_field_from_lat(self.grid_spacing_deg, move |_| width)
    }
}

impl SphereProvider for EddyClosure {
    fn cell_width_vs_lat_lon(&self) -> Result<SphereField, FieldError> {
        require_positive("cell_width_eq", self.cell_width_eq)?;
        require_positive("cell_width_mid_lat", self.cell_width_mid_lat)?;
        require_positive("cell_width_pole", self.cell_width_pole)?;
        require_positive("lat_width_eq", self.lat_width_eq)?;
        require_positive("lat_width_pole", self.lat_width_pole)?;
        sphere_field_from_lat(self.grid_spacing_deg, |lat| eddy_closure_cell_width(self, lat))
    }
}

impl SphereProvider for RossbyRadius {
    fn cell_width_vs_lat_lon(&self) -> Result<SphereField, FieldError> {
        require_positive("cell_width_eq", self.cell_width_eq)?;
        require_positive("cell_width_pole", self.cell_width_pole)?;
        sphere_field_from_lat(self.grid_spacing_deg, |lat| rossby_radius_cell_width(self, lat))
    }
}

impl PlaneProvider for UniformPlane {
    fn cell_width_vs_xy(&self) -> Result<PlaneField, FieldError> {
        require_positive("cell_width", self.cell_width)?;
        let x = Axis::linspace("x", self.x_min, self.x_max, self.spacing)?;
        let y = Axis::linspace("y", self.y_min, self.y_max, self.spacing)?;
        let cell_width = vec![self.cell_width; x.len() * y.len()];

        Ok(PlaneField {
            cell_width,
            x: x.values,
            y: y.values,
            boundary: BoundaryPolygon::rectangle(self.x_min, self.x_max, self.y_min, self.y_max),
        })
    }
}

impl From<DensityConfig> for DensityFieldProvider {
    fn from(config: DensityConfig) -> Self {
        match config {
            DensityConfig::QuasiUniform(p) => DensityFieldProvider::sphere(p),
            DensityConfig::EddyClosure(p) => DensityFieldProvider::sphere(p),
            DensityConfig::RossbyRadius(p) => DensityFieldProvider::sphere(p),
            DensityConfig::UniformPlane(p) => DensityFieldProvider::plane(p),
        }
    }
}
