//! Mesh stage trait and pipeline orchestration.

use std::fmt;
use std::path::PathBuf;

use log::info;
use thiserror::Error;

use super::context::RunContext;
use super::run::ExportStatus;
use crate::collab::{CollabError, FinalMesh, IntermediateMesh, RawMesh};
use crate::field::{DensityField, FieldError};
use crate::geometry::BoundaryPolygon;
use crate::io::NetcdfError;
use crate::plot::PlotError;

/// Unique identifier for mesh-building stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Generate and persist the cell-width field.
    DensityField,
    /// Triangulate with the mesh engine.
    MeshGeneration,
    /// Engine output to intermediate triangles.
    TriangleConversion,
    /// Triangles to the final polygonal mesh.
    TopologyConversion,
    DensityInjection,
    BathymetryInjection,
    FloodplainInjection,
    /// Visualization export.
    Export,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::DensityField => "density_field",
            StageId::MeshGeneration => "mesh_generation",
            StageId::TriangleConversion => "triangle_conversion",
            StageId::TopologyConversion => "topology_conversion",
            StageId::DensityInjection => "density_injection",
            StageId::BathymetryInjection => "bathymetry_injection",
            StageId::FloodplainInjection => "floodplain_injection",
            StageId::Export => "export",
        }
    }

    /// Position in the full sequence, starting at 1.
    pub fn step(&self) -> u32 {
        match self {
            StageId::DensityField => 1,
            StageId::MeshGeneration => 2,
            StageId::TriangleConversion => 3,
            StageId::TopologyConversion => 4,
            StageId::DensityInjection => 5,
            StageId::BathymetryInjection => 6,
            StageId::FloodplainInjection => 7,
            StageId::Export => 8,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StageId::DensityField => "Build cellWidth array as function of horizontal coordinates",
            StageId::MeshGeneration => "Generate mesh with JIGSAW",
            StageId::TriangleConversion => "Convert triangles from jigsaw format to netcdf",
            StageId::TopologyConversion => "Convert from triangles to MPAS mesh",
            StageId::DensityInjection => "Inject correct meshDensity variable into base mesh file",
            StageId::BathymetryInjection => "Injecting bathymetry",
            StageId::FloodplainInjection => "Injecting flag to preserve floodplain",
            StageId::Export => "Create vtk file for visualization",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Broad class of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input: generator output, geometry, options.
    Configuration,
    /// An external stage failed.
    Collaborator,
    /// A required external input was absent at point of use.
    Precondition,
    /// Stages were assembled or run out of order.
    Ordering,
}

/// Errors that can occur while running the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Stage '{stage}' failed: {source}")]
    Collaborator {
        stage: StageId,
        #[source]
        source: CollabError,
    },
    #[error("Stage '{stage}' cannot run: {reason}")]
    PreconditionNotMet { stage: StageId, reason: String },
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error("Stage '{stage}' requires {artifact}, which no earlier stage produced")]
    MissingArtifact { stage: StageId, artifact: &'static str },
    #[error("Invalid density field: {0}")]
    Field(#[from] FieldError),
    #[error("Density field serialization failed: {0}")]
    Netcdf(#[from] NetcdfError),
    #[error("Cell width plot failed: {0}")]
    Plot(#[from] PlotError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Wraps a collaborator failure raised by `stage`. Missing external
    /// inputs become precondition failures.
    pub fn from_collab(stage: StageId, source: CollabError) -> Self {
        match source {
            CollabError::MissingInput(reason) => PipelineError::PreconditionNotMet { stage, reason },
            source => PipelineError::Collaborator { stage, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Configuration(_) | PipelineError::Field(_) => ErrorKind::Configuration,
            PipelineError::PreconditionNotMet { .. } => ErrorKind::Precondition,
            PipelineError::MissingDependency(..) | PipelineError::MissingArtifact { .. } => {
                ErrorKind::Ordering
            }
            PipelineError::Collaborator { .. }
            | PipelineError::Netcdf(_)
            | PipelineError::Plot(_)
            | PipelineError::Io(_) => ErrorKind::Collaborator,
        }
    }

    /// The stage that failed, when known.
    pub fn stage(&self) -> Option<StageId> {
        match self {
            PipelineError::Collaborator { stage, .. }
            | PipelineError::PreconditionNotMet { stage, .. }
            | PipelineError::MissingArtifact { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Artifacts handed from stage to stage during one run.
///
/// Each slot is filled by exactly one stage. Raw and intermediate meshes are
/// taken out when consumed.
#[derive(Debug, Default)]
pub struct RunState {
    pub field: Option<DensityField>,
    pub boundary: Option<BoundaryPolygon>,
    pub density_file: Option<PathBuf>,
    pub plot: Option<PathBuf>,
    pub raw_mesh: Option<RawMesh>,
    pub intermediate: Option<IntermediateMesh>,
    pub final_mesh: Option<FinalMesh>,
    pub export: Option<ExportStatus>,
}

/// Trait for implementing mesh-building stages.
///
/// Each stage consumes artifacts left in the [`RunState`] by earlier stages
/// and adds its own.
pub trait MeshStage {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str {
        self.id().name()
    }

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the stage.
    fn execute(&self, state: &mut RunState, ctx: &RunContext) -> Result<(), PipelineError>;
}

/// Orchestrates mesh stages into a complete build.
pub struct Pipeline<'a> {
    stages: Vec<Box<dyn MeshStage + 'a>>,
    ctx: RunContext,
}

impl<'a> Pipeline<'a> {
    /// Creates a new empty pipeline working in `ctx`.
    pub fn new(ctx: RunContext) -> Self {
        Self {
            stages: Vec::new(),
            ctx,
        }
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: MeshStage + 'a>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Stage IDs in execution order.
    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|s| s.id()).collect()
    }

    /// Executes all stages in order. The first failure aborts the run.
    pub fn run(&self, state: &mut RunState) -> Result<(), PipelineError> {
        self.run_with_callbacks(state, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// # Arguments
    /// * `state` - Artifacts shared between stages
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        state: &mut RunState,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(StageId, usize, usize),
        F2: FnMut(StageId, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            let id = stage.id();

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            on_stage_start(id, i, total);
            info!("Step {}. {}", id.step(), id.description());

            stage.execute(state, &self.ctx)?;
            completed.push(id);

            on_stage_complete(id, i, total);
        }

        Ok(())
    }
}
