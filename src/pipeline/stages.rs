//! The eight mesh-building stages.

use log::{info, warn};

use super::context::RunContext;
use super::run::ExportStatus;
use super::stage::{MeshStage, PipelineError, RunState, StageId};
use crate::collab::{FieldInjector, MeshEngine, TopologyConverter, TriangleConverter, VisualizationExporter};
use crate::field::DensityFieldProvider;
use crate::geometry::GeometryMode;
use crate::io::write_density_field;
use crate::plot::{plot_cell_width, PlotOptions};

fn missing(stage: StageId, artifact: &'static str) -> PipelineError {
    PipelineError::MissingArtifact { stage, artifact }
}

/// Step 1: obtain the density field from the provider, persist it, and plot
/// it when requested.
pub struct DensityFieldStage<'a> {
    pub provider: &'a DensityFieldProvider,
    pub geometry: GeometryMode,
    pub plot: bool,
    pub plot_options: PlotOptions,
}

impl MeshStage for DensityFieldStage<'_> {
    fn id(&self) -> StageId {
        StageId::DensityField
    }

    fn execute(&self, state: &mut RunState, ctx: &RunContext) -> Result<(), PipelineError> {
        if self.provider.geometry() != self.geometry {
            return Err(PipelineError::Configuration(format!(
                "{} density provider supplied for {} geometry",
                self.provider.geometry(),
                self.geometry
            )));
        }

        let (field, boundary) = match self.provider {
            DensityFieldProvider::Sphere(p) => (p.cell_width_vs_lat_lon()?.into_density_field()?, None),
            DensityFieldProvider::Plane(p) => {
                let (field, boundary) = p.cell_width_vs_xy()?.into_parts()?;
                (field, Some(boundary))
            }
        };

        let (rows, cols) = field.shape();
        let path = ctx.cell_width_path(self.geometry);
        write_density_field(&path, &field)?;
        info!("Wrote {}x{} cell width field to {}", rows, cols, path.display());

        if self.plot {
            let summary = plot_cell_width(&field, &ctx.plot_path(), &self.plot_options)?;
            state.plot = Some(summary.path);
        }

        state.field = Some(field);
        state.boundary = boundary;
        state.density_file = Some(path);
        Ok(())
    }
}

/// Step 2: triangulate the persisted density field.
pub struct MeshGenerationStage<'a> {
    pub engine: &'a dyn MeshEngine,
    pub geometry: GeometryMode,
}

impl MeshStage for MeshGenerationStage<'_> {
    fn id(&self) -> StageId {
        StageId::MeshGeneration
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::DensityField]
    }

    fn execute(&self, state: &mut RunState, ctx: &RunContext) -> Result<(), PipelineError> {
        let id = self.id();
        let persisted = state.density_file.as_ref().is_some_and(|p| p.exists());
        if !persisted {
            return Err(missing(id, "a persisted density field"));
        }
        let field = state.field.as_ref().ok_or_else(|| missing(id, "the density field"))?;

        let boundary = if self.geometry.requires_boundary() {
            Some(state.boundary.as_ref().ok_or_else(|| missing(id, "a boundary polygon"))?)
        } else {
            None
        };

        let raw = self
            .engine
            .generate_mesh(ctx, field, self.geometry, boundary)
            .map_err(|e| PipelineError::from_collab(id, e))?;
        state.raw_mesh = Some(raw);
        Ok(())
    }
}

/// Step 3: engine output to intermediate triangles.
pub struct TriangleConversionStage<'a> {
    pub converter: &'a dyn TriangleConverter,
    pub geometry: GeometryMode,
}

impl MeshStage for TriangleConversionStage<'_> {
    fn id(&self) -> StageId {
        StageId::TriangleConversion
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::MeshGeneration]
    }

    fn execute(&self, state: &mut RunState, ctx: &RunContext) -> Result<(), PipelineError> {
        let id = self.id();
        let raw = state.raw_mesh.take().ok_or_else(|| missing(id, "a raw mesh"))?;
        let intermediate = self
            .converter
            .convert_raw_to_intermediate(ctx, &raw, self.geometry)
            .map_err(|e| PipelineError::from_collab(id, e))?;
        state.intermediate = Some(intermediate);
        Ok(())
    }
}

/// Step 4: triangles to the final polygonal mesh.
pub struct TopologyConversionStage<'a> {
    pub converter: &'a dyn TopologyConverter,
}

impl MeshStage for TopologyConversionStage<'_> {
    fn id(&self) -> StageId {
        StageId::TopologyConversion
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::TriangleConversion]
    }

    fn execute(&self, state: &mut RunState, ctx: &RunContext) -> Result<(), PipelineError> {
        let id = self.id();
        let intermediate = state
            .intermediate
            .take()
            .ok_or_else(|| missing(id, "an intermediate mesh"))?;
        let mesh = self
            .converter
            .convert_intermediate_to_final(ctx, intermediate)
            .map_err(|e| PipelineError::from_collab(id, e))?;
        state.final_mesh = Some(mesh);
        Ok(())
    }
}

/// Step 5: merge the persisted density field into the final mesh.
pub struct DensityInjectionStage<'a> {
    pub injector: &'a dyn FieldInjector,
    pub geometry: GeometryMode,
}

impl MeshStage for DensityInjectionStage<'_> {
    fn id(&self) -> StageId {
        StageId::DensityInjection
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::TopologyConversion]
    }

    fn execute(&self, state: &mut RunState, ctx: &RunContext) -> Result<(), PipelineError> {
        let id = self.id();
        let density_file = state
            .density_file
            .clone()
            .ok_or_else(|| missing(id, "a persisted density field"))?;
        let mesh = state
            .final_mesh
            .as_mut()
            .filter(|m| m.path.exists())
            .ok_or_else(|| missing(id, "a final mesh file"))?;

        self.injector
            .inject_density(ctx, &density_file, mesh, self.geometry)
            .map_err(|e| PipelineError::from_collab(id, e))
    }
}

/// Step 6 (optional): merge bathymetry.
pub struct BathymetryInjectionStage<'a> {
    pub injector: &'a dyn FieldInjector,
}

impl MeshStage for BathymetryInjectionStage<'_> {
    fn id(&self) -> StageId {
        StageId::BathymetryInjection
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::DensityInjection]
    }

    fn execute(&self, state: &mut RunState, ctx: &RunContext) -> Result<(), PipelineError> {
        let id = self.id();
        let mesh = state
            .final_mesh
            .as_mut()
            .filter(|m| m.has_density())
            .ok_or_else(|| missing(id, "a density-injected final mesh"))?;
        self.injector
            .inject_bathymetry(ctx, mesh)
            .map_err(|e| PipelineError::from_collab(id, e))
    }
}

/// Step 7 (optional): mark the floodplain to preserve.
pub struct FloodplainInjectionStage<'a> {
    pub injector: &'a dyn FieldInjector,
    pub elevation: f64,
}

impl MeshStage for FloodplainInjectionStage<'_> {
    fn id(&self) -> StageId {
        StageId::FloodplainInjection
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::DensityInjection]
    }

    fn execute(&self, state: &mut RunState, ctx: &RunContext) -> Result<(), PipelineError> {
        let id = self.id();
        let mesh = state
            .final_mesh
            .as_mut()
            .filter(|m| m.has_density())
            .ok_or_else(|| missing(id, "a density-injected final mesh"))?;
        self.injector
            .inject_floodplain_mask(ctx, mesh, self.elevation)
            .map_err(|e| PipelineError::from_collab(id, e))
    }
}

/// Step 8: export for viewing tools.
///
/// Unless `strict`, a failed export is logged and recorded but does not fail
/// the run; the final mesh is already complete at this point.
pub struct ExportStage<'a> {
    pub exporter: &'a dyn VisualizationExporter,
    pub strict: bool,
}

impl MeshStage for ExportStage<'_> {
    fn id(&self) -> StageId {
        StageId::Export
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::DensityInjection]
    }

    fn execute(&self, state: &mut RunState, ctx: &RunContext) -> Result<(), PipelineError> {
        let id = self.id();
        let mesh = state.final_mesh.as_ref().ok_or_else(|| missing(id, "a final mesh"))?;

        let status = match self.exporter.export_visualization(ctx, mesh) {
            Ok(dir) => ExportStatus::Exported(dir),
            Err(e) if self.strict => return Err(PipelineError::from_collab(id, e)),
            Err(e) => {
                warn!("Visualization export failed; {} is still valid: {}", mesh.path.display(), e);
                ExportStatus::Failed(e.to_string())
            }
        };
        state.export = Some(status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    use tempfile::tempdir;

    use crate::collab::{CollabError, FinalMesh, MeshField, RawMesh};
    use crate::field::{Axis, DensityField};
    use crate::geometry::BoundaryPolygon;
    use crate::pipeline::ErrorKind;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<&'static str>>,
    }

    impl MeshEngine for Recorder {
        fn generate_mesh(
            &self,
            ctx: &RunContext,
            _field: &DensityField,
            _geometry: GeometryMode,
            _boundary: Option<&BoundaryPolygon>,
        ) -> Result<RawMesh, CollabError> {
            self.calls.borrow_mut().push("generate_mesh");
            Ok(RawMesh { path: ctx.raw_mesh_path() })
        }
    }

    impl FieldInjector for Recorder {
        fn inject_density(
            &self,
            _ctx: &RunContext,
            _density_field: &Path,
            mesh: &mut FinalMesh,
            _geometry: GeometryMode,
        ) -> Result<(), CollabError> {
            self.calls.borrow_mut().push("inject_density");
            mesh.record_field(MeshField::Density);
            Ok(())
        }

        fn inject_bathymetry(&self, _ctx: &RunContext, mesh: &mut FinalMesh) -> Result<(), CollabError> {
            self.calls.borrow_mut().push("inject_bathymetry");
            mesh.record_field(MeshField::Bathymetry);
            Ok(())
        }

        fn inject_floodplain_mask(
            &self,
            _ctx: &RunContext,
            mesh: &mut FinalMesh,
            elevation: f64,
        ) -> Result<(), CollabError> {
            self.calls.borrow_mut().push("inject_floodplain_mask");
            mesh.record_field(MeshField::FloodplainMask { elevation });
            Ok(())
        }
    }

    fn field() -> DensityField {
        let lat = Axis::new("lat", vec![-90.0, 90.0]);
        let lon = Axis::new("lon", vec![-180.0, 180.0]);
        DensityField::new(vec![240.0; 4], lat, lon).unwrap()
    }

    fn assert_missing(err: PipelineError, expected: StageId) {
        assert_eq!(err.kind(), ErrorKind::Ordering);
        assert!(
            matches!(err, PipelineError::MissingArtifact { stage, .. } if stage == expected),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn mesh_generation_requires_persisted_field() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path());
        let engine = Recorder::default();
        let stage = MeshGenerationStage { engine: &engine, geometry: GeometryMode::Sphere };

        let mut state = RunState::default();
        assert_missing(stage.execute(&mut state, &ctx).unwrap_err(), StageId::MeshGeneration);

        // Field in memory but its file never written.
        let mut state = RunState {
            field: Some(field()),
            density_file: Some(ctx.cell_width_path(GeometryMode::Sphere)),
            ..Default::default()
        };
        assert_missing(stage.execute(&mut state, &ctx).unwrap_err(), StageId::MeshGeneration);
        assert!(engine.calls.borrow().is_empty());
        assert!(state.raw_mesh.is_none());
    }

    #[test]
    fn density_injection_requires_final_mesh_file() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path());
        let density_file = ctx.cell_width_path(GeometryMode::Sphere);
        std::fs::write(&density_file, b"").unwrap();

        let injector = Recorder::default();
        let stage = DensityInjectionStage { injector: &injector, geometry: GeometryMode::Sphere };
        let mut state = RunState {
            density_file: Some(density_file),
            final_mesh: Some(FinalMesh::new(ctx.base_mesh_path())),
            ..Default::default()
        };

        assert_missing(stage.execute(&mut state, &ctx).unwrap_err(), StageId::DensityInjection);
        assert!(injector.calls.borrow().is_empty());

        std::fs::write(ctx.base_mesh_path(), b"").unwrap();
        stage.execute(&mut state, &ctx).unwrap();
        assert_eq!(*injector.calls.borrow(), vec!["inject_density"]);
    }

    #[test]
    fn optional_injections_require_density() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path());
        let injector = Recorder::default();
        let mesh = || Some(FinalMesh::new(PathBuf::from("base_mesh.nc")));

        let bathymetry = BathymetryInjectionStage { injector: &injector };
        let mut state = RunState { final_mesh: mesh(), ..Default::default() };
        assert_missing(bathymetry.execute(&mut state, &ctx).unwrap_err(), StageId::BathymetryInjection);

        let floodplain = FloodplainInjectionStage { injector: &injector, elevation: 20.0 };
        assert_missing(floodplain.execute(&mut state, &ctx).unwrap_err(), StageId::FloodplainInjection);
        assert!(injector.calls.borrow().is_empty());

        if let Some(m) = state.final_mesh.as_mut() {
            m.record_field(MeshField::Density);
        }
        bathymetry.execute(&mut state, &ctx).unwrap();
        floodplain.execute(&mut state, &ctx).unwrap();
        assert_eq!(*injector.calls.borrow(), vec!["inject_bathymetry", "inject_floodplain_mask"]);
    }
}
