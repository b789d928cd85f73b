//! Terminal rendering of the analysis figures.

mod error;
mod figure_viewer;

pub use error::ViewerError;
pub use figure_viewer::view_figures;
