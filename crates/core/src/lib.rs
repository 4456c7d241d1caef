pub mod config;
pub mod error;

pub use config::{Config, ParseConfig, PathsConfig, UnnamedRulePolicy};
pub use error::*;
