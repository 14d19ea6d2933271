//! Settings file.
//!
//! A TOML document with optional `[density]`, `[engine]`, `[tools]` and
//! `[plot]` sections. Missing sections and keys take their defaults, so an
//! empty file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collab::{Collaborators, EngineConfig, ToolsConfig};
use crate::field::{DensityConfig, DensityFieldProvider};
use crate::geometry::GeometryMode;
use crate::plot::PlotOptions;

/// Errors that can occur while loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("[density] preset generates for {preset} but geometry is {geometry}")]
    GeometryMismatch {
        preset: GeometryMode,
        geometry: GeometryMode,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Density generator; the geometry's default preset when absent.
    pub density: Option<DensityConfig>,
    pub engine: EngineConfig,
    pub tools: ToolsConfig,
    pub plot: PlotOptions,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// The configured density generator for `geometry`.
    pub fn density_provider(&self, geometry: GeometryMode) -> Result<DensityFieldProvider, SettingsError> {
        let config = self
            .density
            .clone()
            .unwrap_or_else(|| DensityConfig::default_for(geometry));
        if config.geometry() != geometry {
            return Err(SettingsError::GeometryMismatch {
                preset: config.geometry(),
                geometry,
            });
        }
        Ok(config.into())
    }

    /// Command-backed collaborators built from `[engine]` and `[tools]`.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::external(self.engine.clone(), self.tools.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::EddyClosure;
    use tempfile::tempdir;

    #[test]
    fn empty_document_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.engine.program, "jigsaw");
        assert_eq!(settings.tools.bathymetry_sources, vec!["earth_relief_15s.nc", "topo.msh"]);

        let provider = settings.density_provider(GeometryMode::Plane).unwrap();
        assert_eq!(provider.geometry(), GeometryMode::Plane);
    }

    #[test]
    fn sections_override_defaults() {
        let text = r#"
            [density]
            preset = "eddy_closure"
            cell_width_eq = 20.0

            [engine]
            program = "/opt/jigsaw/bin/jigsaw"

            [tools.topology]
            program = "convert_mesh"
            args = ["{input}", "{output}"]

            [plot]
            width = 800
            height = 400
        "#;
        let settings = Settings::from_toml_str(text).unwrap();

        assert_eq!(
            settings.density,
            Some(DensityConfig::EddyClosure(EddyClosure {
                cell_width_eq: 20.0,
                ..Default::default()
            }))
        );
        assert_eq!(settings.engine.program, "/opt/jigsaw/bin/jigsaw");
        assert_eq!(settings.engine.optm_qlim, 0.9375);
        assert_eq!(settings.tools.topology.program, "convert_mesh");
        assert_eq!(settings.tools.triangles, ToolsConfig::default().triangles);
        assert_eq!((settings.plot.width, settings.plot.height), (800, 400));
        assert!(settings.plot.colorbar);
    }

    #[test]
    fn preset_must_match_geometry() {
        let settings = Settings::from_toml_str("[density]\npreset = \"rossby_radius\"\n").unwrap();
        assert!(settings.density_provider(GeometryMode::Sphere).is_ok());
        let err = settings.density_provider(GeometryMode::Plane).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::GeometryMismatch { preset: GeometryMode::Sphere, geometry: GeometryMode::Plane }
        ));
    }

    #[test]
    fn unknown_preset_is_parse_error() {
        let err = Settings::from_toml_str("[density]\npreset = \"hexagons\"\n").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("basemesh.toml");
        assert!(matches!(Settings::load(&path), Err(SettingsError::Read { .. })));

        std::fs::write(&path, "[engine]\nverbosity = 2\n").unwrap();
        assert_eq!(Settings::load(&path).unwrap().engine.verbosity, 2);
    }
}
