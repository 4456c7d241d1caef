//! Device naming rule registry.
//!
//! This crate provides:
//! - Bounded, field-level rule records with additive merge semantics
//! - A `KEY="value"` line tokenizer
//! - Loaders for the naming-rule file and the permissions file
//! - [`init`], which loads both files into a read-only [`RuleSet`]

pub mod loader;
pub mod record;
pub mod registry;
pub mod tokenizer;

pub use loader::{init, Initialized, LoadError, RuleLoader};
pub use record::{Matcher, PermissionOverlay, RuleKind, RuleRecord};
pub use registry::{Registry, RuleSet};
