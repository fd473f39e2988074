pub mod axes;
pub mod basemap;
pub mod gauges;
pub mod layer;
pub mod legend;
pub mod links;
pub mod map_plot;
pub mod plots;
pub mod symbology;
pub mod tooltip;

pub use layer::*;
pub use map_plot::*;
