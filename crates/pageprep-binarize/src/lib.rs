pub mod config;
pub mod morphology;
pub mod otsu;
pub mod tiled;

pub use config::BinarizeConfig;
pub use morphology::{clean, CleanupVariant};
pub use otsu::otsu_threshold;
pub use tiled::{binarize, TileGrid, TilePlan};
