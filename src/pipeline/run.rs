//! Entry point: assemble the stage sequence for a set of options and run it.

use std::fs;
use std::path::PathBuf;

use log::info;

use super::context::RunContext;
use super::options::BuildOptions;
use super::stage::{Pipeline, PipelineError, RunState, StageId};
use super::stages::{
    BathymetryInjectionStage, DensityFieldStage, DensityInjectionStage, ExportStage,
    FloodplainInjectionStage, MeshGenerationStage, TopologyConversionStage, TriangleConversionStage,
};
use crate::collab::{Collaborators, MeshField};
use crate::field::DensityFieldProvider;

/// Result of the visualization export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    /// Directory holding the exported files.
    Exported(PathBuf),
    /// Export failed without failing the run.
    Failed(String),
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    /// The final mesh file, the primary deliverable.
    pub final_mesh: PathBuf,
    /// Fields merged into the final mesh, in merge order.
    pub fields: Vec<MeshField>,
    pub plot: Option<PathBuf>,
    pub export: ExportStatus,
}

/// Assembles the stage sequence for `options`: five fixed stages, the two
/// optional injections when enabled, then export.
pub fn build_pipeline<'a>(
    options: &BuildOptions,
    ctx: &RunContext,
    provider: &'a DensityFieldProvider,
    collaborators: &'a Collaborators,
) -> Pipeline<'a> {
    let geometry = options.geometry;
    let mut pipeline = Pipeline::new(ctx.clone());

    pipeline
        .add_stage(DensityFieldStage {
            provider,
            geometry,
            plot: options.effective_plot(),
            plot_options: options.plot_options.clone(),
        })
        .add_stage(MeshGenerationStage {
            engine: collaborators.engine.as_ref(),
            geometry,
        })
        .add_stage(TriangleConversionStage {
            converter: collaborators.triangles.as_ref(),
            geometry,
        })
        .add_stage(TopologyConversionStage {
            converter: collaborators.topology.as_ref(),
        })
        .add_stage(DensityInjectionStage {
            injector: collaborators.injector.as_ref(),
            geometry,
        });

    if options.inject_bathymetry {
        pipeline.add_stage(BathymetryInjectionStage {
            injector: collaborators.injector.as_ref(),
        });
    }
    if options.preserve_floodplain {
        pipeline.add_stage(FloodplainInjectionStage {
            injector: collaborators.injector.as_ref(),
            elevation: options.floodplain_elevation,
        });
    }

    pipeline.add_stage(ExportStage {
        exporter: collaborators.exporter.as_ref(),
        strict: options.strict_export,
    });
    pipeline
}

/// Builds a mesh in `ctx`'s working directory.
///
/// The provider's variant must match `options.geometry`. Stages run strictly
/// in order and the first failure aborts the run, leaving earlier artifacts
/// on disk.
pub fn run(
    options: &BuildOptions,
    ctx: &RunContext,
    provider: &DensityFieldProvider,
    collaborators: &Collaborators,
) -> Result<BuildOutcome, PipelineError> {
    options.validate()?;
    if provider.geometry() != options.geometry {
        return Err(PipelineError::Configuration(format!(
            "geometry is {} but the density provider generates for {}",
            options.geometry,
            provider.geometry()
        )));
    }

    fs::create_dir_all(ctx.work_dir())?;
    info!("Building {} mesh in {}", options.geometry, ctx.work_dir().display());

    let pipeline = build_pipeline(options, ctx, provider, collaborators);
    let mut state = RunState::default();
    pipeline.run_with_callbacks(
        &mut state,
        |_, _, _| {},
        |id, i, total| info!("[{}/{}] Completed: {}", i + 1, total, id),
    )?;

    let final_mesh = state.final_mesh.ok_or(PipelineError::MissingArtifact {
        stage: StageId::Export,
        artifact: "a final mesh",
    })?;
    let export = state.export.ok_or(PipelineError::MissingArtifact {
        stage: StageId::Export,
        artifact: "an export status",
    })?;

    Ok(BuildOutcome {
        final_mesh: final_mesh.path,
        fields: final_mesh.fields,
        plot: state.plot,
        export,
    })
}
