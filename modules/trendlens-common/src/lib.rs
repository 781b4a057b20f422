pub mod config;
pub mod error;
pub mod parse;
pub mod types;

pub use config::{CacheTtls, Config};
pub use error::TrendLensError;
pub use parse::*;
pub use types::*;
