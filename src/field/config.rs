//! Parameters for the built-in analytic density generators.

use serde::{Deserialize, Serialize};

use crate::geometry::GeometryMode;

/// Constant cell width over the whole sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuasiUniform {
    /// Cell width in km.
    pub cell_width_km: f64,
    /// Spacing of the lat/lon grid the field is tabulated on, in degrees.
    pub grid_spacing_deg: f64,
}

impl Default for QuasiUniform {
    fn default() -> Self {
        Self {
            cell_width_km: 240.0,
            grid_spacing_deg: 1.0,
        }
    }
}

/// Eddy-closure style resolution: fine at the equator, coarse at mid
/// latitudes, moderate toward the poles, blended with tanh transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EddyClosure {
    /// Cell width at the equator (km).
    pub cell_width_eq: f64,
    /// Cell width at mid latitudes (km).
    pub cell_width_mid_lat: f64,
    /// Cell width near the poles (km).
    pub cell_width_pole: f64,
    /// Latitude of the equatorial transition center (degrees).
    pub lat_pos_eq: f64,
    /// Latitude of the polar transition center (degrees).
    pub lat_pos_pole: f64,
    /// Latitude where the equatorial blend hands over to the polar one (degrees).
    pub lat_transition: f64,
    /// Width of the equatorial transition (degrees).
    pub lat_width_eq: f64,
    /// Width of the polar transition (degrees).
    pub lat_width_pole: f64,
    pub grid_spacing_deg: f64,
}

impl Default for EddyClosure {
    fn default() -> Self {
        Self {
            cell_width_eq: 30.0,
            cell_width_mid_lat: 60.0,
            cell_width_pole: 35.0,
            lat_pos_eq: 15.0,
            lat_pos_pole: 73.0,
            lat_transition: 40.0,
            lat_width_eq: 6.0,
            lat_width_pole: 9.0,
            grid_spacing_deg: 1.0,
        }
    }
}

/// Resolution scaling with the Rossby radius: coarse at the equator and
/// refining toward the poles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RossbyRadius {
    /// Cell width at the equator (km).
    pub cell_width_eq: f64,
    /// Cell width at the poles (km).
    pub cell_width_pole: f64,
    pub grid_spacing_deg: f64,
}

impl Default for RossbyRadius {
    fn default() -> Self {
        Self {
            cell_width_eq: 30.0,
            cell_width_pole: 6.0,
            grid_spacing_deg: 1.0,
        }
    }
}

/// Constant cell width over a rectangular planar domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformPlane {
    pub cell_width: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Spacing of the x/y grid the field is tabulated on.
    pub spacing: f64,
}

impl Default for UniformPlane {
    fn default() -> Self {
        Self {
            cell_width: 10.0,
            x_min: 0.0,
            x_max: 500.0,
            y_min: 0.0,
            y_max: 500.0,
            spacing: 10.0,
        }
    }
}

/// `[density]` section: which analytic generator to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "snake_case")]
pub enum DensityConfig {
    QuasiUniform(QuasiUniform),
    EddyClosure(EddyClosure),
    RossbyRadius(RossbyRadius),
    UniformPlane(UniformPlane),
}

impl DensityConfig {
    /// Default generator for a geometry when none is configured.
    pub fn default_for(geometry: GeometryMode) -> Self {
        match geometry {
            GeometryMode::Sphere => DensityConfig::QuasiUniform(QuasiUniform::default()),
            GeometryMode::Plane => DensityConfig::UniformPlane(UniformPlane::default()),
        }
    }

    /// Geometry the configured generator produces.
    pub fn geometry(&self) -> GeometryMode {
        match self {
            DensityConfig::QuasiUniform(_)
            | DensityConfig::EddyClosure(_)
            | DensityConfig::RossbyRadius(_) => GeometryMode::Sphere,
            DensityConfig::UniformPlane(_) => GeometryMode::Plane,
        }
    }
}
