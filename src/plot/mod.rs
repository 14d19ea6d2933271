//! Diagnostic plotting of density fields.

mod cell_width;
mod colormap;

pub use cell_width::{plot_cell_width, PlotError, PlotOptions, PlotSummary};
pub use colormap::{lerp_rgb, Colormap};
