//! External collaborators of the pipeline.
//!
//! Mesh generation, format conversion, field injection and visualization are
//! performed by other tools. Each is reached through a trait so the pipeline
//! can be driven by the real command-line tools or by in-process stand-ins.
//! Artifacts passed between them are handles to files in the run's working
//! directory.

mod command;
mod config;
mod jigsaw;
mod tools;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::field::DensityField;
use crate::geometry::{BoundaryPolygon, GeometryMode};
use crate::io::JigsawFileError;
use crate::pipeline::RunContext;

pub use command::{run_tool, ToolCommand};
pub use config::{EngineConfig, ToolsConfig};
pub use jigsaw::JigsawEngine;
pub use tools::MpasTools;

/// Errors reported by collaborators.
#[derive(Error, Debug)]
pub enum CollabError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("expected output {} was not produced", .0.display())]
    MissingOutput(PathBuf),
    #[error("required input not found: {0}")]
    MissingInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine input error: {0}")]
    EngineInput(#[from] JigsawFileError),
    #[error("{0}")]
    Other(String),
}

/// Triangulated output of the mesh engine, in the engine's native format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMesh {
    pub path: PathBuf,
}

/// Tool-neutral triangle mesh, tagged with the geometry that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateMesh {
    pub path: PathBuf,
    pub geometry: GeometryMode,
}

/// A field merged into the final mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshField {
    Density,
    Bathymetry,
    FloodplainMask { elevation: f64 },
}

/// The polygonal mesh deliverable. Injection stages update the file in place;
/// `fields` records which merges have completed.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalMesh {
    pub path: PathBuf,
    pub fields: Vec<MeshField>,
}

impl FinalMesh {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), fields: Vec::new() }
    }

    pub fn record_field(&mut self, field: MeshField) {
        self.fields.push(field);
    }

    pub fn has_density(&self) -> bool {
        self.fields.contains(&MeshField::Density)
    }
}

/// Triangulates a density field.
pub trait MeshEngine {
    /// Produces a raw mesh whose local resolution follows `field`.
    /// `boundary` is required on the plane and ignored on the sphere.
    fn generate_mesh(
        &self,
        ctx: &RunContext,
        field: &DensityField,
        geometry: GeometryMode,
        boundary: Option<&BoundaryPolygon>,
    ) -> Result<RawMesh, CollabError>;
}

/// Converts the engine's native output into the intermediate triangle mesh.
pub trait TriangleConverter {
    fn convert_raw_to_intermediate(
        &self,
        ctx: &RunContext,
        raw: &RawMesh,
        geometry: GeometryMode,
    ) -> Result<IntermediateMesh, CollabError>;
}

/// Builds the polygonal mesh from the triangles and persists it at the
/// context's base-mesh path.
pub trait TopologyConverter {
    fn convert_intermediate_to_final(
        &self,
        ctx: &RunContext,
        mesh: IntermediateMesh,
    ) -> Result<FinalMesh, CollabError>;
}

/// Merges fields into the final mesh file.
pub trait FieldInjector {
    fn inject_density(
        &self,
        ctx: &RunContext,
        density_field: &Path,
        mesh: &mut FinalMesh,
        geometry: GeometryMode,
    ) -> Result<(), CollabError>;

    /// Fails with [`CollabError::MissingInput`] when no bathymetry source is
    /// available.
    fn inject_bathymetry(&self, ctx: &RunContext, mesh: &mut FinalMesh) -> Result<(), CollabError>;

    fn inject_floodplain_mask(
        &self,
        ctx: &RunContext,
        mesh: &mut FinalMesh,
        elevation: f64,
    ) -> Result<(), CollabError>;
}

/// Exports the final mesh for viewing tools; returns the export directory.
pub trait VisualizationExporter {
    fn export_visualization(&self, ctx: &RunContext, mesh: &FinalMesh) -> Result<PathBuf, CollabError>;
}

/// The full set of collaborators a run needs.
pub struct Collaborators {
    pub engine: Box<dyn MeshEngine>,
    pub triangles: Box<dyn TriangleConverter>,
    pub topology: Box<dyn TopologyConverter>,
    pub injector: Box<dyn FieldInjector>,
    pub exporter: Box<dyn VisualizationExporter>,
}

impl Collaborators {
    /// JIGSAW for meshing and the MPAS-Tools command line for everything else.
    pub fn external(engine: EngineConfig, tools: ToolsConfig) -> Self {
        let tools = MpasTools::new(tools);
        Self {
            engine: Box::new(JigsawEngine::new(engine)),
            triangles: Box::new(tools.clone()),
            topology: Box::new(tools.clone()),
            injector: Box::new(tools.clone()),
            exporter: Box::new(tools),
        }
    }
}
