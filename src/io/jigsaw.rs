//! Input files for the JIGSAW mesh generator.
//!
//! JIGSAW is driven entirely through files: a `.jig` configuration naming the
//! geometry, mesh-size function and output paths, plus `.msh` files holding
//! the geometry and the mesh-size grid. Only writers are needed here; the
//! generated mesh is handed to the triangle converter unparsed.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::field::DensityField;
use crate::geometry::{BoundaryPolygon, GeometryMode};

/// Version tag written in every `MSHID` line.
const MSH_VERSION: u32 = 3;

/// Errors that can occur while writing JIGSAW input files.
#[derive(Error, Debug)]
pub enum JigsawFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("planar geometry requires a boundary polygon")]
    MissingBoundary,
    #[error("density field axes ({0}) do not match {1} geometry")]
    AxisMismatch(String, GeometryMode),
}

/// Contents of a `.jig` configuration file.
#[derive(Debug, Clone)]
pub struct JigConfig {
    pub geom_file: String,
    pub hfun_file: String,
    pub mesh_file: String,
    pub hfun_hmax: f64,
    pub hfun_hmin: f64,
    /// Topological dimension of generated simplexes.
    pub mesh_dims: u32,
    /// Element quality threshold for the optimiser.
    pub optm_qlim: f64,
    pub verbosity: i32,
}

impl Default for JigConfig {
    fn default() -> Self {
        Self {
            geom_file: "mesh.msh".to_string(),
            hfun_file: "mesh-HFUN.msh".to_string(),
            mesh_file: "mesh-MESH.msh".to_string(),
            hfun_hmax: f64::INFINITY,
            hfun_hmin: 0.0,
            mesh_dims: 2,
            optm_qlim: 0.9375,
            verbosity: 1,
        }
    }
}

fn fmt_real(v: f64) -> String {
    if v.is_infinite() {
        if v > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else {
        format!("{}", v)
    }
}

/// Writes the `.jig` configuration.
pub fn write_jig(path: &Path, config: &JigConfig) -> Result<(), JigsawFileError> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "# {}; created by basemesh", file_label(path))?;
    writeln!(w, "GEOM_FILE={}", config.geom_file)?;
    writeln!(w, "MESH_FILE={}", config.mesh_file)?;
    writeln!(w, "HFUN_FILE={}", config.hfun_file)?;
    // Mesh-size values are absolute lengths.
    writeln!(w, "HFUN_SCAL=ABSOLUTE")?;
    writeln!(w, "HFUN_HMAX={}", fmt_real(config.hfun_hmax))?;
    writeln!(w, "HFUN_HMIN={}", fmt_real(config.hfun_hmin))?;
    writeln!(w, "MESH_DIMS={}", config.mesh_dims)?;
    writeln!(w, "OPTM_QLIM={}", fmt_real(config.optm_qlim))?;
    writeln!(w, "VERBOSITY={}", config.verbosity)?;
    w.flush()?;
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Writes the mesh-size function as a structured grid.
///
/// On the sphere the grid is `ELLIPSOID-GRID` with axes converted to radians;
/// on the plane it is `EUCLIDEAN-GRID` with axes as given. Values are written
/// column-major over `(rows, cols)`, i.e. the row (lat/y) index varies fastest.
pub fn write_hfun_grid(
    path: &Path,
    field: &DensityField,
    geometry: GeometryMode,
) -> Result<(), JigsawFileError> {
    if !field.matches_geometry(geometry) {
        let axes = format!("{}, {}", field.rows().name, field.cols().name);
        return Err(JigsawFileError::AxisMismatch(axes, geometry));
    }

    let (kind, scale): (&str, fn(f64) -> f64) = match geometry {
        GeometryMode::Sphere => ("ELLIPSOID-GRID", f64::to_radians),
        GeometryMode::Plane => ("EUCLIDEAN-GRID", |v| v),
    };

    let (nrows, ncols) = field.shape();
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "# {}; created by basemesh", file_label(path))?;
    writeln!(w, "MSHID={};{}", MSH_VERSION, kind)?;
    writeln!(w, "NDIMS=2")?;

    writeln!(w, "COORD=1;{}", ncols)?;
    for &x in &field.cols().values {
        writeln!(w, "{}", fmt_real(scale(x)))?;
    }
    writeln!(w, "COORD=2;{}", nrows)?;
    for &y in &field.rows().values {
        writeln!(w, "{}", fmt_real(scale(y)))?;
    }

    writeln!(w, "VALUE={};1", nrows * ncols)?;
    for col in 0..ncols {
        for row in 0..nrows {
            writeln!(w, "{}", fmt_real(field.get(row, col)))?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Writes the domain geometry.
///
/// Spheres become an `ELLIPSOID-MESH` with three equal radii (km); planes an
/// `EUCLIDEAN-MESH` made of the boundary polygon's points and edges.
pub fn write_geometry(
    path: &Path,
    geometry: GeometryMode,
    radius_km: f64,
    boundary: Option<&BoundaryPolygon>,
) -> Result<(), JigsawFileError> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "# {}; created by basemesh", file_label(path))?;

    match geometry {
        GeometryMode::Sphere => {
            writeln!(w, "MSHID={};ELLIPSOID-MESH", MSH_VERSION)?;
            writeln!(w, "NDIMS=3")?;
            let r = fmt_real(radius_km);
            writeln!(w, "RADII={};{};{}", r, r, r)?;
        }
        GeometryMode::Plane => {
            let boundary = boundary.ok_or(JigsawFileError::MissingBoundary)?;
            writeln!(w, "MSHID={};EUCLIDEAN-MESH", MSH_VERSION)?;
            writeln!(w, "NDIMS=2")?;
            writeln!(w, "POINT={}", boundary.points.len())?;
            for p in &boundary.points {
                writeln!(w, "{};{};0", fmt_real(p[0]), fmt_real(p[1]))?;
            }
            writeln!(w, "EDGE2={}", boundary.edges.len())?;
            for e in &boundary.edges {
                writeln!(w, "{};{};0", e[0], e[1])?;
            }
        }
    }

    w.flush()?;
    Ok(())
}
