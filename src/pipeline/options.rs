use log::debug;

use super::stage::PipelineError;
use crate::geometry::GeometryMode;
use crate::plot::PlotOptions;

/// Caller-facing switches for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// Add a mask preserving the floodplain above `floodplain_elevation`.
    pub preserve_floodplain: bool,
    /// Elevation in meters up to which the floodplain is preserved.
    pub floodplain_elevation: f64,
    /// Merge an external bathymetry dataset into the final mesh.
    pub inject_bathymetry: bool,
    pub geometry: GeometryMode,
    /// Requested diagnostic plot; see [`BuildOptions::effective_plot`].
    pub plot_cell_width: bool,
    /// Treat a failed visualization export as fatal.
    pub strict_export: bool,
    /// Layout of the diagnostic plot.
    pub plot_options: PlotOptions,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            preserve_floodplain: false,
            floodplain_elevation: 20.0,
            inject_bathymetry: false,
            geometry: GeometryMode::Sphere,
            plot_cell_width: true,
            strict_export: false,
            plot_options: PlotOptions::default(),
        }
    }
}

impl BuildOptions {
    /// Whether the diagnostic plot is produced.
    ///
    /// Sphere runs always plot and plane runs never do; the requested value
    /// only shows up in the log when it is overridden.
    pub fn effective_plot(&self) -> bool {
        let plot = self.geometry.on_sphere();
        if plot != self.plot_cell_width {
            debug!(
                "plot_cellWidth={} overridden to {} for {} geometry",
                self.plot_cell_width, plot, self.geometry
            );
        }
        plot
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.preserve_floodplain && !self.floodplain_elevation.is_finite() {
            return Err(PipelineError::Configuration(format!(
                "floodplain elevation must be finite, got {}",
                self.floodplain_elevation
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_always_plots() {
        let options = BuildOptions { plot_cell_width: false, ..Default::default() };
        assert!(options.effective_plot());
    }

    #[test]
    fn plane_never_plots() {
        let options = BuildOptions {
            geometry: GeometryMode::Plane,
            plot_cell_width: true,
            ..Default::default()
        };
        assert!(!options.effective_plot());
    }

    #[test]
    fn non_finite_elevation_rejected_only_when_used() {
        let mut options = BuildOptions { floodplain_elevation: f64::NAN, ..Default::default() };
        assert!(options.validate().is_ok());
        options.preserve_floodplain = true;
        assert!(matches!(options.validate(), Err(PipelineError::Configuration(_))));
    }
}
