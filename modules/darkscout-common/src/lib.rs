pub mod types;
pub mod config;
pub mod error;

pub use types::*;
pub use config::{Config, ScanConfig};
pub use error::DarkscoutError;
