//! Config file loaders for naming rules and permissions.
//!
//! Both loaders stream their file line by line into a shared registry.
//! Malformed lines are skipped and reported; only I/O and storage failures
//! abort a load.

mod core;
mod error;
mod lines;
mod naming;
mod permissions;


pub use self::core::{init, Initialized, RuleLoader};
pub use self::error::{ConfigFile, LineError, LineResult, LineStatus, LoadError, LoadReport, Result};
pub use self::permissions::parse_octal_mode;
