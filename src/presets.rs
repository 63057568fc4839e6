// Preset lifecycle: create, update, append, remove, delete, and read.
//
// Every operation that introduces entry names runs them through the
// validation gate first; nothing is persisted unless the whole incoming
// batch classifies cleanly. Entry names within a preset behave as a set:
// duplicates collapse and order is normalized to sorted.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::entries::{Entry, EntryType, EntryValidator};
use crate::error::CoreError;
use crate::wiki::WikiLookup;

/// One row of the preset listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetSummary {
    pub name: String,
    pub description: Option<String>,
}

pub struct PresetStore {
    db: Arc<Database>,
    validator: EntryValidator,
}

impl PresetStore {
    pub fn new(db: Arc<Database>, source: Arc<dyn WikiLookup>) -> Self {
        Self {
            db,
            validator: EntryValidator::new(source),
        }
    }

    /// Create a new preset from a non-empty entry list. Fails if the name
    /// is taken or any entry fails validation; on failure nothing is
    /// persisted.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        entry_names: &[String],
    ) -> Result<(), CoreError> {
        if entry_names.is_empty() {
            return Err(CoreError::EmptyEntryList);
        }
        if self.db.preset_exists(name)? {
            return Err(CoreError::PresetExists(name.to_string()));
        }

        let (entry_set, new_entries) = self.validate_incoming(entry_names).await?;
        let entry_names: Vec<String> = entry_set.into_iter().collect();
        self.db
            .create_preset(name, description, &entry_names, &new_entries)?;

        info!(preset = name, entries = entry_names.len(), "preset created");
        Ok(())
    }

    /// Replace a preset's entry set wholesale with a non-empty list.
    pub async fn update(&self, name: &str, entry_names: &[String]) -> Result<(), CoreError> {
        if entry_names.is_empty() {
            return Err(CoreError::EmptyEntryList);
        }
        if !self.db.preset_exists(name)? {
            return Err(CoreError::PresetNotFound(name.to_string()));
        }

        let (entry_set, new_entries) = self.validate_incoming(entry_names).await?;
        let entry_names: Vec<String> = entry_set.into_iter().collect();
        self.db
            .set_preset_entries(name, &entry_names, &new_entries)?;

        info!(preset = name, entries = entry_names.len(), "preset replaced");
        Ok(())
    }

    /// Add entries to a preset. Names already in the set are absorbed, so
    /// the operation is idempotent and order-independent across calls.
    pub async fn append(&self, name: &str, entry_names: &[String]) -> Result<(), CoreError> {
        if entry_names.is_empty() {
            return Err(CoreError::EmptyEntryList);
        }
        let Some(current) = self.db.preset_entries(name)? else {
            return Err(CoreError::PresetNotFound(name.to_string()));
        };

        let (incoming, new_entries) = self.validate_incoming(entry_names).await?;
        let mut merged: BTreeSet<String> = current.into_iter().collect();
        merged.extend(incoming);
        let entry_names: Vec<String> = merged.into_iter().collect();
        self.db
            .set_preset_entries(name, &entry_names, &new_entries)?;

        info!(preset = name, entries = entry_names.len(), "preset extended");
        Ok(())
    }

    /// Remove entries from a preset's set. Names not present are ignored,
    /// so removing a disjoint list is a no-op. No validation runs: the
    /// names are never persisted, and a preset may legitimately shrink to
    /// empty. Registry rows are kept; other presets may reference them.
    pub fn remove(&self, name: &str, entry_names: &[String]) -> Result<(), CoreError> {
        let Some(current) = self.db.preset_entries(name)? else {
            return Err(CoreError::PresetNotFound(name.to_string()));
        };

        let to_drop: BTreeSet<&String> = entry_names.iter().collect();
        let remaining: Vec<String> = current
            .into_iter()
            .filter(|n| !to_drop.contains(n))
            .collect();
        self.db.set_preset_entries(name, &remaining, &[])?;

        info!(preset = name, entries = remaining.len(), "entries removed");
        Ok(())
    }

    /// Delete a preset row entirely. Cached category expansions and
    /// registry rows are untouched.
    pub fn delete(&self, name: &str) -> Result<(), CoreError> {
        if !self.db.delete_preset(name)? {
            return Err(CoreError::PresetNotFound(name.to_string()));
        }
        info!(preset = name, "preset deleted");
        Ok(())
    }

    /// A preset's entries with their types, sorted by name. Distinguishes
    /// an unknown preset (error) from an existing preset that has been
    /// emptied out (Ok with an empty vec).
    pub fn contents(&self, name: &str) -> Result<Vec<Entry>, CoreError> {
        if !self.db.preset_exists(name)? {
            return Err(CoreError::PresetNotFound(name.to_string()));
        }
        Ok(self.db.preset_contents(name)?)
    }

    pub fn list(&self) -> Result<Vec<PresetSummary>, CoreError> {
        Ok(self.db.list_presets()?)
    }

    pub fn exists(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.db.preset_exists(name)?)
    }

    /// The validation gate. Dedups the incoming names, skips registry
    /// lookups for names already classified, and classifies the rest
    /// against the wiki all-or-nothing. Returns the deduplicated set and
    /// the registry rows that still need inserting.
    async fn validate_incoming(
        &self,
        entry_names: &[String],
    ) -> Result<(BTreeSet<String>, Vec<(String, EntryType)>), CoreError> {
        let entry_set: BTreeSet<String> = entry_names.iter().cloned().collect();
        let deduped: Vec<String> = entry_set.iter().cloned().collect();

        let unknown = self.db.unknown_entries(&deduped)?;
        let new_entries = if unknown.is_empty() {
            Vec::new()
        } else {
            self.validator.classify_batch(&unknown).await?
        };

        Ok((entry_set, new_entries))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
