//! Pipeline module for orchestrating mesh-building stages.
//!
//! A run branches once on the geometry, then walks a linear chain of stages
//! that hand artifacts to each other through files in the working directory.

mod context;
mod options;
mod run;
mod stage;
mod stages;

pub use context::{ArtifactPaths, RunContext};
pub use options::BuildOptions;
pub use run::{build_pipeline, run, BuildOutcome, ExportStatus};
pub use stage::{ErrorKind, MeshStage, Pipeline, PipelineError, RunState, StageId};
pub use stages::{
    BathymetryInjectionStage, DensityFieldStage, DensityInjectionStage, ExportStage,
    FloodplainInjectionStage, MeshGenerationStage, TopologyConversionStage, TriangleConversionStage,
};
