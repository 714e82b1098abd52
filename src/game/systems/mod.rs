pub mod particles;
pub mod physics;
