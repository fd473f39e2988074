pub mod distribution;
pub mod hydrograph;
pub mod statistics;

pub use distribution::*;
pub use hydrograph::*;
pub use statistics::*;
