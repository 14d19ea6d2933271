//! The JIGSAW mesh engine.

use log::info;

use super::command::{clear_output, run_tool, ToolCommand};
use super::config::EngineConfig;
use super::{CollabError, MeshEngine, RawMesh};
use crate::field::DensityField;
use crate::geometry::{BoundaryPolygon, GeometryMode};
use crate::io::{write_geometry, write_hfun_grid, write_jig, JigConfig};
use crate::pipeline::RunContext;

/// Drives the `jigsaw` executable through its input files.
#[derive(Debug, Clone, Default)]
pub struct JigsawEngine {
    config: EngineConfig,
}

impl JigsawEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    fn jig_config(&self, ctx: &RunContext) -> JigConfig {
        let paths = ctx.paths();
        JigConfig {
            geom_file: paths.geometry.to_string_lossy().into_owned(),
            hfun_file: paths.hfun.to_string_lossy().into_owned(),
            mesh_file: paths.raw_mesh.to_string_lossy().into_owned(),
            hfun_hmax: f64::INFINITY,
            hfun_hmin: 0.0,
            mesh_dims: 2,
            optm_qlim: self.config.optm_qlim,
            verbosity: self.config.verbosity,
        }
    }

    /// Writes the geometry, mesh-size and configuration files.
    pub fn write_inputs(
        &self,
        ctx: &RunContext,
        field: &DensityField,
        geometry: GeometryMode,
        boundary: Option<&BoundaryPolygon>,
    ) -> Result<(), CollabError> {
        write_hfun_grid(&ctx.hfun_path(), field, geometry)?;
        let radius_km = self.config.earth_radius_m / 1.0e3;
        write_geometry(&ctx.geometry_path(), geometry, radius_km, boundary)?;
        write_jig(&ctx.jig_path(), &self.jig_config(ctx))?;
        Ok(())
    }
}

impl MeshEngine for JigsawEngine {
    fn generate_mesh(
        &self,
        ctx: &RunContext,
        field: &DensityField,
        geometry: GeometryMode,
        boundary: Option<&BoundaryPolygon>,
    ) -> Result<RawMesh, CollabError> {
        self.write_inputs(ctx, field, geometry, boundary)?;

        let (rows, cols) = field.shape();
        info!("Meshing {} geometry from a {}x{} cell-width grid", geometry, rows, cols);

        let path = ctx.raw_mesh_path();
        clear_output(&path)?;

        let command = ToolCommand::new(&self.config.program, &["{input}"]);
        let jig = ctx.paths().jig_config.to_string_lossy().into_owned();
        run_tool("jigsaw", &command, ctx.work_dir(), &[("input", jig)])?;

        if !path.exists() {
            return Err(CollabError::MissingOutput(path));
        }
        Ok(RawMesh { path })
    }
}
