pub mod event_bus;
pub mod params;

pub use event_bus::*;
pub use params::*;
