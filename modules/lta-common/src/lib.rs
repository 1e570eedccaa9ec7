pub mod config;
pub mod constants;
pub mod error;
pub mod quarantine;
pub mod types;

pub use config::Config;
pub use error::LtaError;
pub use types::*;
