use serde::{Deserialize, Serialize};

use super::command::ToolCommand;

/// `[engine]` section: the JIGSAW mesh generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable invoked as `<program> mesh.jig`.
    pub program: String,
    /// Sphere radius in meters; written to the geometry file in km.
    pub earth_radius_m: f64,
    /// Element quality threshold for the optimiser.
    pub optm_qlim: f64,
    pub verbosity: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "jigsaw".to_string(),
            earth_radius_m: 6371.0e3,
            optm_qlim: 0.9375,
            verbosity: 1,
        }
    }
}

/// `[tools]` section: command lines for the converters, injectors and the
/// exporter.
///
/// Available placeholders: `{input}`, `{output}`, `{mesh}`, `{cell_width}`,
/// `{elevation}`, `{geometry}`, `{spherical_flag}` and `{out_dir}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub triangles: ToolCommand,
    pub topology: ToolCommand,
    pub density: ToolCommand,
    pub bathymetry: ToolCommand,
    pub floodplain: ToolCommand,
    pub export: ToolCommand,
    /// Bathymetry datasets looked up in the working directory; at least one
    /// must exist for bathymetry injection.
    pub bathymetry_sources: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            triangles: ToolCommand::new(
                "jigsaw_to_netcdf",
                &["-m", "{input}", "-o", "{output}", "{spherical_flag}"],
            ),
            topology: ToolCommand::new("MpasMeshConverter.x", &["{input}", "{output}"]),
            density: ToolCommand::new(
                "inject_meshDensity",
                &["--cell-width", "{cell_width}", "--mesh", "{mesh}", "--geometry", "{geometry}"],
            ),
            bathymetry: ToolCommand::new("inject_bathymetry", &["{mesh}"]),
            floodplain: ToolCommand::new("inject_preserve_floodplain", &["{mesh}", "{elevation}"]),
            export: ToolCommand::new(
                "paraview_vtk_field_extractor.py",
                &[
                    "--ignore_time",
                    "-l",
                    "-d",
                    "maxEdges=",
                    "-v",
                    "allOnCells",
                    "-f",
                    "{mesh}",
                    "-o",
                    "{out_dir}",
                ],
            ),
            bathymetry_sources: vec!["earth_relief_15s.nc".to_string(), "topo.msh".to_string()],
        }
    }
}
