pub mod geometry;
pub mod topology;
pub mod variables;

pub use geometry::*;
pub use topology::*;
pub use variables::*;
