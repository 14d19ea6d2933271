//! Converters, injectors and exporter backed by the MPAS-Tools command line.

use std::path::{Path, PathBuf};

use log::debug;

use super::command::{clear_output, run_tool};
use super::config::ToolsConfig;
use super::{
    CollabError, FieldInjector, FinalMesh, IntermediateMesh, MeshField, RawMesh, TopologyConverter,
    TriangleConverter, VisualizationExporter,
};
use crate::geometry::GeometryMode;
use crate::pipeline::RunContext;

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn require_output(path: PathBuf) -> Result<PathBuf, CollabError> {
    if path.exists() {
        Ok(path)
    } else {
        Err(CollabError::MissingOutput(path))
    }
}

/// Runs each collaborator as an external command in the working directory.
#[derive(Debug, Clone, Default)]
pub struct MpasTools {
    config: ToolsConfig,
}

impl MpasTools {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    /// First configured bathymetry dataset present in the working directory.
    pub fn bathymetry_source(&self, ctx: &RunContext) -> Option<PathBuf> {
        self.config
            .bathymetry_sources
            .iter()
            .map(|name| ctx.resolve(Path::new(name)))
            .find(|path| path.exists())
    }
}

impl TriangleConverter for MpasTools {
    fn convert_raw_to_intermediate(
        &self,
        ctx: &RunContext,
        raw: &RawMesh,
        geometry: GeometryMode,
    ) -> Result<IntermediateMesh, CollabError> {
        let output = ctx.triangles_path();
        clear_output(&output)?;
        let spherical_flag = if geometry.on_sphere() { "-s" } else { "" };
        run_tool(
            "jigsaw_to_netcdf",
            &self.config.triangles,
            ctx.work_dir(),
            &[
                ("input", arg(&raw.path)),
                ("output", arg(&output)),
                ("spherical_flag", spherical_flag.to_string()),
                ("geometry", geometry.name().to_string()),
            ],
        )?;
        Ok(IntermediateMesh {
            path: require_output(output)?,
            geometry,
        })
    }
}

impl TopologyConverter for MpasTools {
    fn convert_intermediate_to_final(
        &self,
        ctx: &RunContext,
        mesh: IntermediateMesh,
    ) -> Result<FinalMesh, CollabError> {
        let output = ctx.base_mesh_path();
        clear_output(&output)?;
        run_tool(
            "mesh_converter",
            &self.config.topology,
            ctx.work_dir(),
            &[
                ("input", arg(&mesh.path)),
                ("output", arg(&output)),
                ("geometry", mesh.geometry.name().to_string()),
            ],
        )?;
        Ok(FinalMesh::new(require_output(output)?))
    }
}

impl FieldInjector for MpasTools {
    fn inject_density(
        &self,
        ctx: &RunContext,
        density_field: &Path,
        mesh: &mut FinalMesh,
        geometry: GeometryMode,
    ) -> Result<(), CollabError> {
        if !density_field.exists() {
            return Err(CollabError::MissingInput(arg(density_field)));
        }
        run_tool(
            "inject_mesh_density",
            &self.config.density,
            ctx.work_dir(),
            &[
                ("cell_width", arg(density_field)),
                ("mesh", arg(&mesh.path)),
                ("geometry", geometry.name().to_string()),
            ],
        )?;
        mesh.record_field(MeshField::Density);
        Ok(())
    }

    fn inject_bathymetry(&self, ctx: &RunContext, mesh: &mut FinalMesh) -> Result<(), CollabError> {
        let source = self.bathymetry_source(ctx).ok_or_else(|| {
            CollabError::MissingInput(format!(
                "no bathymetry dataset ({}) in {}",
                self.config.bathymetry_sources.join(", "),
                ctx.work_dir().display()
            ))
        })?;
        debug!("Using bathymetry from {}", source.display());

        run_tool(
            "inject_bathymetry",
            &self.config.bathymetry,
            ctx.work_dir(),
            &[("mesh", arg(&mesh.path)), ("input", arg(&source))],
        )?;
        mesh.record_field(MeshField::Bathymetry);
        Ok(())
    }

    fn inject_floodplain_mask(
        &self,
        ctx: &RunContext,
        mesh: &mut FinalMesh,
        elevation: f64,
    ) -> Result<(), CollabError> {
        run_tool(
            "inject_preserve_floodplain",
            &self.config.floodplain,
            ctx.work_dir(),
            &[("mesh", arg(&mesh.path)), ("elevation", elevation.to_string())],
        )?;
        mesh.record_field(MeshField::FloodplainMask { elevation });
        Ok(())
    }
}

impl VisualizationExporter for MpasTools {
    fn export_visualization(&self, ctx: &RunContext, mesh: &FinalMesh) -> Result<PathBuf, CollabError> {
        let out_dir = ctx.vtk_dir();
        clear_output(&out_dir)?;
        run_tool(
            "vtk_extractor",
            &self.config.export,
            ctx.work_dir(),
            &[("mesh", arg(&mesh.path)), ("out_dir", arg(&out_dir))],
        )?;
        require_output(out_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::ToolCommand;
    use tempfile::tempdir;

    #[test]
    fn bathymetry_without_source_is_missing_input() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path());
        let tools = MpasTools::default();
        let mut mesh = FinalMesh::new(ctx.base_mesh_path());

        let err = tools.inject_bathymetry(&ctx, &mut mesh).unwrap_err();
        assert!(matches!(err, CollabError::MissingInput(_)));
        assert!(mesh.fields.is_empty());
    }

    #[test]
    fn bathymetry_source_found_in_order() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path());
        std::fs::write(dir.path().join("topo.msh"), b"").unwrap();
        let tools = MpasTools::default();
        assert_eq!(tools.bathymetry_source(&ctx), Some(dir.path().join("topo.msh")));

        std::fs::write(dir.path().join("earth_relief_15s.nc"), b"").unwrap();
        assert_eq!(tools.bathymetry_source(&ctx), Some(dir.path().join("earth_relief_15s.nc")));
    }

    #[cfg(unix)]
    fn shell(script: &str) -> ToolCommand {
        ToolCommand::new("sh", &["-c", script, "sh", "{input}", "{output}", "{spherical_flag}"])
    }

    #[cfg(unix)]
    #[test]
    fn triangle_converter_passes_spherical_flag() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path());
        let config = ToolsConfig {
            triangles: shell("echo \"$3\" > \"$2\""),
            ..Default::default()
        };
        let tools = MpasTools::new(config);
        let raw = RawMesh { path: ctx.raw_mesh_path() };

        let mesh = tools
            .convert_raw_to_intermediate(&ctx, &raw, GeometryMode::Sphere)
            .unwrap();
        assert_eq!(mesh.path, ctx.triangles_path());
        assert_eq!(std::fs::read_to_string(&mesh.path).unwrap().trim(), "-s");

        tools.convert_raw_to_intermediate(&ctx, &raw, GeometryMode::Plane).unwrap();
        assert_eq!(std::fs::read_to_string(ctx.triangles_path()).unwrap().trim(), "");
    }

    #[cfg(unix)]
    #[test]
    fn converter_without_output_is_missing_output() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path());
        let config = ToolsConfig {
            topology: ToolCommand::new("true", &[]),
            ..Default::default()
        };
        let tools = MpasTools::new(config);
        let intermediate = IntermediateMesh {
            path: ctx.triangles_path(),
            geometry: GeometryMode::Sphere,
        };
        std::fs::write(ctx.base_mesh_path(), b"stale").unwrap();

        let err = tools.convert_intermediate_to_final(&ctx, intermediate).unwrap_err();
        assert!(matches!(err, CollabError::MissingOutput(_)));
        assert!(!ctx.base_mesh_path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn stale_vtk_dir_is_not_accepted() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path());
        std::fs::create_dir_all(ctx.vtk_dir()).unwrap();
        let config = ToolsConfig {
            export: ToolCommand::new("true", &[]),
            ..Default::default()
        };
        let tools = MpasTools::new(config);
        let mesh = FinalMesh::new(ctx.base_mesh_path());

        let err = tools.export_visualization(&ctx, &mesh).unwrap_err();
        assert!(matches!(err, CollabError::MissingOutput(p) if p == ctx.vtk_dir()));
    }

    #[cfg(unix)]
    #[test]
    fn tools_resolve_artifacts_in_relative_work_dir() {
        // Relative to the test's current directory.
        let dir = tempfile::tempdir_in(".").unwrap();
        let rel = dir.path().strip_prefix(".").unwrap_or(dir.path()).to_path_buf();
        assert!(rel.is_relative());

        let ctx = RunContext::new(&rel);
        std::fs::write(ctx.raw_mesh_path(), b"MSH").unwrap();
        let config = ToolsConfig {
            triangles: ToolCommand::new("sh", &["-c", "cp \"$1\" \"$2\"", "sh", "{input}", "{output}"]),
            ..Default::default()
        };
        let tools = MpasTools::new(config);
        let raw = RawMesh { path: ctx.raw_mesh_path() };

        let mesh = tools
            .convert_raw_to_intermediate(&ctx, &raw, GeometryMode::Plane)
            .unwrap();
        assert_eq!(std::fs::read(&mesh.path).unwrap(), b"MSH");
        assert_eq!(mesh.path, std::env::current_dir().unwrap().join(&rel).join("mesh_triangles.nc"));
    }

    #[cfg(unix)]
    #[test]
    fn floodplain_receives_elevation() {
        let dir = tempdir().unwrap();
        let ctx = RunContext::new(dir.path());
        let config = ToolsConfig {
            floodplain: ToolCommand::new("sh", &["-c", "echo \"$1\" > elevation.txt", "sh", "{elevation}"]),
            ..Default::default()
        };
        let tools = MpasTools::new(config);
        let mut mesh = FinalMesh::new(ctx.base_mesh_path());
        tools.inject_floodplain_mask(&ctx, &mut mesh, 12.5).unwrap();

        let written = std::fs::read_to_string(dir.path().join("elevation.txt")).unwrap();
        assert_eq!(written.trim(), "12.5");
        assert_eq!(mesh.fields, vec![MeshField::FloodplainMask { elevation: 12.5 }]);
    }
}
