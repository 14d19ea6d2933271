//! Run context: the working directory and the names of every artifact
//! exchanged between stages.

use std::path::{Path, PathBuf};

use crate::geometry::GeometryMode;

/// File names of the artifacts stages hand to each other, relative to the
/// working directory. The defaults are the names downstream tools expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub sphere_cell_width: PathBuf,
    pub plane_cell_width: PathBuf,
    pub cell_width_plot: PathBuf,
    pub jig_config: PathBuf,
    pub geometry: PathBuf,
    pub hfun: PathBuf,
    pub raw_mesh: PathBuf,
    pub triangles: PathBuf,
    pub base_mesh: PathBuf,
    pub vtk_dir: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            sphere_cell_width: "cellWidthVsLatLon.nc".into(),
            plane_cell_width: "cellWidthVsXY.nc".into(),
            cell_width_plot: "cellWidthGlobal.png".into(),
            jig_config: "mesh.jig".into(),
            geometry: "mesh.msh".into(),
            hfun: "mesh-HFUN.msh".into(),
            raw_mesh: "mesh-MESH.msh".into(),
            triangles: "mesh_triangles.nc".into(),
            base_mesh: "base_mesh.nc".into(),
            vtk_dir: "base_mesh_vtk".into(),
        }
    }
}

/// Immutable per-run settings shared by every stage.
///
/// Two runs with different working directories never touch each other's
/// files; a single directory must not host concurrent runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    work_dir: PathBuf,
    paths: ArtifactPaths,
}

impl RunContext {
    /// Context with the default artifact names under `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::with_paths(work_dir, ArtifactPaths::default())
    }

    /// A relative `work_dir` is anchored to the current directory, since
    /// external tools run inside the working directory and receive resolved
    /// artifact paths.
    pub fn with_paths(work_dir: impl Into<PathBuf>, paths: ArtifactPaths) -> Self {
        let work_dir = work_dir.into();
        let work_dir = std::path::absolute(&work_dir).unwrap_or(work_dir);
        Self { work_dir, paths }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Resolves a path relative to the working directory.
    pub fn resolve(&self, rel: &Path) -> PathBuf {
        self.work_dir.join(rel)
    }

    /// Serialized density field for `geometry`.
    pub fn cell_width_path(&self, geometry: GeometryMode) -> PathBuf {
        match geometry {
            GeometryMode::Sphere => self.resolve(&self.paths.sphere_cell_width),
            GeometryMode::Plane => self.resolve(&self.paths.plane_cell_width),
        }
    }

    pub fn plot_path(&self) -> PathBuf {
        self.resolve(&self.paths.cell_width_plot)
    }

    pub fn jig_path(&self) -> PathBuf {
        self.resolve(&self.paths.jig_config)
    }

    pub fn geometry_path(&self) -> PathBuf {
        self.resolve(&self.paths.geometry)
    }

    pub fn hfun_path(&self) -> PathBuf {
        self.resolve(&self.paths.hfun)
    }

    pub fn raw_mesh_path(&self) -> PathBuf {
        self.resolve(&self.paths.raw_mesh)
    }

    pub fn triangles_path(&self) -> PathBuf {
        self.resolve(&self.paths.triangles)
    }

    pub fn base_mesh_path(&self) -> PathBuf {
        self.resolve(&self.paths.base_mesh)
    }

    pub fn vtk_dir(&self) -> PathBuf {
        self.resolve(&self.paths.vtk_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_resolve_under_work_dir() {
        let ctx = RunContext::new("/tmp/run1");
        assert_eq!(ctx.cell_width_path(GeometryMode::Sphere), Path::new("/tmp/run1/cellWidthVsLatLon.nc"));
        assert_eq!(ctx.cell_width_path(GeometryMode::Plane), Path::new("/tmp/run1/cellWidthVsXY.nc"));
        assert_eq!(ctx.base_mesh_path(), Path::new("/tmp/run1/base_mesh.nc"));
        assert_eq!(ctx.raw_mesh_path(), Path::new("/tmp/run1/mesh-MESH.msh"));
        assert_eq!(ctx.vtk_dir(), Path::new("/tmp/run1/base_mesh_vtk"));
    }

    #[test]
    fn relative_work_dir_is_anchored() {
        let ctx = RunContext::new("out");
        let cwd = std::env::current_dir().unwrap();
        assert!(ctx.work_dir().is_absolute());
        assert_eq!(ctx.work_dir(), cwd.join("out"));
        assert_eq!(ctx.triangles_path(), cwd.join("out").join("mesh_triangles.nc"));
    }
}
