pub mod precision;
pub mod projection;
pub mod scale;
pub mod ticks;
pub mod vec;
pub mod zoom;

pub use precision::*;
pub use projection::*;
pub use scale::*;
pub use ticks::*;
pub use vec::*;
pub use zoom::*;
