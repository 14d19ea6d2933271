//! build_mesh CLI - base-mesh builder.
//!
//! Builds a spherical or planar base mesh in the working directory and
//! leaves the final mesh in `base_mesh.nc`.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::info;

use basemesh::pipeline::{run, BuildOptions, ExportStatus, RunContext};
use basemesh::{GeometryMode, Settings};

/// Build a base mesh for ocean and climate models.
#[derive(Parser)]
#[command(name = "build_mesh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Whether a flood plain (bathymetry above z = 0) should be preserved in the mesh.
    #[arg(long = "preserve_floodplain")]
    preserve_floodplain: bool,

    /// The elevation in meters to which the flood plain is preserved.
    #[arg(long = "floodplain_elevation", default_value = "20.0")]
    floodplain_elevation: f64,

    /// Whether one of the default bathymetry datasets, earth_relief_15s.nc or
    /// topo.msh, should be added to the mesh.
    #[arg(long = "inject_bathymetry")]
    inject_bathymetry: bool,

    /// Whether the mesh is on a sphere or a plane.
    #[arg(long, default_value = "sphere")]
    geometry: GeometryMode,

    /// Whether to produce a plot of cellWidth (always on for spheres).
    #[arg(long = "plot_cellWidth")]
    plot_cell_width: bool,

    /// Directory holding every artifact of the run.
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail the run when the visualization export fails.
    #[arg(long)]
    strict_export: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path),
        None => Ok(Settings::default()),
    }
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let provider = settings.density_provider(cli.geometry).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let options = BuildOptions {
        preserve_floodplain: cli.preserve_floodplain,
        floodplain_elevation: cli.floodplain_elevation,
        inject_bathymetry: cli.inject_bathymetry,
        geometry: cli.geometry,
        plot_cell_width: cli.plot_cell_width,
        strict_export: cli.strict_export,
        plot_options: settings.plot.clone(),
    };
    let ctx = RunContext::new(cli.work_dir);
    let collaborators = settings.collaborators();

    let start = Instant::now();
    let outcome = run(&options, &ctx, &provider, &collaborators).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    info!("Mesh built in {:.2?}", start.elapsed());

    if let ExportStatus::Failed(reason) = &outcome.export {
        eprintln!("Warning: visualization export failed: {}", reason);
    }

    let name = outcome
        .final_mesh
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| outcome.final_mesh.display().to_string());
    let banner = format!("**    The global mesh file is {}   **", name);
    let rule = "*".repeat(banner.len());
    println!("{}", rule);
    println!("{}", banner);
    println!("{}", rule);
}
