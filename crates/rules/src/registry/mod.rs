//! In-memory rule registry keyed by record name.
//!
//! The registry is filled during the load passes through [`Registry::upsert`]
//! and then frozen into a read-only [`RuleSet`] for the matching engine.

use indexmap::IndexMap;
use serde::Serialize;

use crate::record::RuleRecord;


/// Errors raised while storing a record.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Storage for a new record could not be reserved.
    #[error("resource exhausted storing rule '{name}': {source}")]
    ResourceExhausted {
        name: String,
        #[source]
        source: indexmap::TryReserveError,
    },
}

/// What an upsert did with the incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Merged,
}

/// Mutable rule store used while loading.
///
/// Exactly one record exists per name. Records keep the order in which their
/// name was first seen.
#[derive(Debug, Default)]
pub struct Registry {
    records: IndexMap<String, RuleRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record`, or overlay its set fields onto the record already
    /// stored under the same name.
    pub fn upsert(&mut self, record: RuleRecord) -> Result<Upsert, RegistryError> {
        if let Some(existing) = self.records.get_mut(record.name()) {
            existing.overlay(&record);
            return Ok(Upsert::Merged);
        }

        self.records
            .try_reserve(1)
            .map_err(|source| RegistryError::ResourceExhausted {
                name: record.name().to_string(),
                source,
            })?;
        self.records.insert(record.name().to_string(), record);
        Ok(Upsert::Inserted)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleRecord> {
        self.records.values()
    }

    /// Hand the loaded records over as an immutable rule set.
    pub fn freeze(self) -> RuleSet {
        RuleSet {
            records: self.records.into_values().collect(),
        }
    }
}

/// Read-only view of the loaded rules, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    records: Vec<RuleRecord>,
}

impl RuleSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a RuleRecord;
    type IntoIter = std::slice::Iter<'a, RuleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
