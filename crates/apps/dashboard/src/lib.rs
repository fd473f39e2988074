pub mod config;
pub mod controller;
pub mod error;
pub mod snapshot;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use snapshot::*;
