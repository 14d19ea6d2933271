//! Base-mesh builder for ocean and climate models.
//!
//! This crate sequences the construction of an unstructured spherical or
//! planar mesh from a cell-width field: it generates and persists the field,
//! drives the JIGSAW mesh generator, and hands the result through the
//! MPAS-Tools converters, field injectors and visualization export.

pub mod collab;
pub mod field;
pub mod geometry;
pub mod io;
pub mod pipeline;
pub mod plot;
pub mod settings;

pub use collab::{Collaborators, FinalMesh, MeshField};
pub use field::{DensityConfig, DensityField, DensityFieldProvider};
pub use geometry::{BoundaryPolygon, GeometryMode};
pub use pipeline::{run, BuildOptions, BuildOutcome, ExportStatus, Pipeline, PipelineError, RunContext};
pub use settings::Settings;
