//! File formats the pipeline writes for itself and its collaborators.

pub mod jigsaw;
pub mod netcdf;

pub use jigsaw::{write_geometry, write_hfun_grid, write_jig, JigConfig, JigsawFileError};
pub use netcdf::{read_density_field, write_density_field, NetcdfError};
