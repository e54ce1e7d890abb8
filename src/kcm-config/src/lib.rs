mod blueprint;
mod config;
mod error;
mod settings;

pub use blueprint::*;
pub use config::*;
pub use error::ConfigError;
pub use settings::*;
