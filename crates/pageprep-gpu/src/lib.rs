pub mod engine;
pub mod readback;
mod shaders;

pub use engine::{FilterKind, ShaderEngine};
pub use readback::correct_origin;
