pub mod error;
pub mod types;

pub use error::{PrepError, Result};
pub use types::*;
