//! NetCDF I/O for the serialized density field.
//!
//! The file holds two coordinate variables and a 2D `cellWidth` variable,
//! all doubles, with each axis stored as the coordinate variable of its
//! dimension. Files are written in the 64-bit offset classic format; the
//! reader accepts any classic-format file with the same variables and
//! widens integer or float storage to `f64`.

use std::fs;
use std::path::Path;

use netcdf3::error::{InvalidDataSet, ReadError, WriteError};
use netcdf3::{DataSet, DataVector, FileReader, FileWriter, Version};
use thiserror::Error;

use crate::field::{Axis, DensityField, FieldError};

/// Name of the cell-width variable inside the file.
pub const CELL_WIDTH_VAR: &str = "cellWidth";

/// Errors that can occur while reading or writing NetCDF files.
#[derive(Error, Debug)]
pub enum NetcdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid NetCDF definition: {0:?}")]
    Definition(InvalidDataSet),
    #[error("NetCDF read error: {0:?}")]
    Read(ReadError),
    #[error("NetCDF write error: {0:?}")]
    Write(WriteError),
    #[error("variable '{0}' not found")]
    MissingVariable(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid density field: {0}")]
    Field(#[from] FieldError),
}

impl From<InvalidDataSet> for NetcdfError {
    fn from(e: InvalidDataSet) -> Self {
        NetcdfError::Definition(e)
    }
}

impl From<ReadError> for NetcdfError {
    fn from(e: ReadError) -> Self {
        NetcdfError::Read(e)
    }
}

impl From<WriteError> for NetcdfError {
    fn from(e: WriteError) -> Self {
        NetcdfError::Write(e)
    }
}

fn axis_units(name: &str) -> &'static str {
    match name {
        "lat" => "degrees_north",
        "lon" => "degrees_east",
        _ => "m",
    }
}

fn definition(field: &DensityField) -> Result<DataSet, NetcdfError> {
    let rows = field.rows();
    let cols = field.cols();
    let mut data_set = DataSet::new();

    for axis in [rows, cols] {
        let name = axis.name.as_str();
        data_set.add_fixed_dim(name, axis.len())?;
        data_set.add_var_f64(name, &[name])?;
        data_set.add_var_attr_string(name, "units", axis_units(name))?;
    }
    data_set.add_var_f64(CELL_WIDTH_VAR, &[rows.name.as_str(), cols.name.as_str()])?;
    data_set.add_var_attr_string(CELL_WIDTH_VAR, "units", "km")?;
    data_set.add_var_attr_string(CELL_WIDTH_VAR, "long_name", "mesh cell width")?;
    Ok(data_set)
}

/// Writes `field` to `path`, replacing any existing file.
pub fn write_density_field(path: &Path, field: &DensityField) -> Result<(), NetcdfError> {
    let data_set = definition(field)?;
    if path.exists() {
        fs::remove_file(path)?;
    }

    let mut writer = FileWriter::open(path)?;
    writer.set_def(&data_set, Version::Offset64Bit, 0)?;
    writer.write_var_f64(&field.rows().name, &field.rows().values)?;
    writer.write_var_f64(&field.cols().name, &field.cols().values)?;
    writer.write_var_f64(CELL_WIDTH_VAR, field.values())?;
    writer.close()?;
    Ok(())
}

fn to_f64(data: DataVector) -> Vec<f64> {
    match data {
        DataVector::I8(v) => v.into_iter().map(f64::from).collect(),
        DataVector::U8(v) => v.into_iter().map(f64::from).collect(),
        DataVector::I16(v) => v.into_iter().map(f64::from).collect(),
        DataVector::I32(v) => v.into_iter().map(f64::from).collect(),
        DataVector::F32(v) => v.into_iter().map(f64::from).collect(),
        DataVector::F64(v) => v,
    }
}

/// Reads a density field previously written by [`write_density_field`] (or
/// any classic-format file with the same variables).
pub fn read_density_field(path: &Path) -> Result<DensityField, NetcdfError> {
    let mut reader = FileReader::open(path)?;

    let dims = reader
        .data_set()
        .get_var(CELL_WIDTH_VAR)
        .ok_or_else(|| NetcdfError::MissingVariable(CELL_WIDTH_VAR.to_string()))?
        .dim_names();
    if dims.len() != 2 {
        return Err(NetcdfError::InvalidData(format!(
            "'{}' has {} dimensions, expected 2",
            CELL_WIDTH_VAR,
            dims.len()
        )));
    }
    for name in &dims {
        if reader.data_set().get_var(name).is_none() {
            return Err(NetcdfError::MissingVariable(name.clone()));
        }
    }

    let rows = to_f64(reader.read_var(&dims[0])?);
    let cols = to_f64(reader.read_var(&dims[1])?);
    let values = to_f64(reader.read_var(CELL_WIDTH_VAR)?);

    Ok(DensityField::new(
        values,
        Axis::new(dims[0].clone(), rows),
        Axis::new(dims[1].clone(), cols),
    )?)
}
