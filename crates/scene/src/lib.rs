pub mod element;
pub mod entity;
pub mod picking;
pub mod svg;
pub mod world;

pub use element::*;
pub use entity::*;
pub use world::*;
