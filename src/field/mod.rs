//! Density (cell-width) fields and the generators that produce them.
//!
//! A density field tabulates the desired mesh-cell size over a rectangular
//! coordinate grid: (lat, lon) in degrees on the sphere, (y, x) on the plane.

mod config;
mod density;
pub mod presets;
mod provider;

pub use config::{DensityConfig, EddyClosure, QuasiUniform, RossbyRadius, UniformPlane};
pub use density::{Axis, DensityField, FieldError};
pub use provider::{DensityFieldProvider, PlaneField, PlaneProvider, SphereField, SphereProvider};
