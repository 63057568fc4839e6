// Entry classification against the wiki.
//
// A name is a Category if the category listing contains its exact title,
// an Article if a page with that exact title exists, and Invalid otherwise.
// The validator is a pure query layer; callers persist successful
// classifications themselves.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::wiki::{WikiError, WikiLookup};

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// The two kinds of validated wiki entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Category,
    Article,
}

impl EntryType {
    /// Storage representation; matches the CHECK constraint in the registry
    /// table.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Category => "category",
            EntryType::Article => "article",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "category" => Some(EntryType::Category),
            "article" => Some(EntryType::Article),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated entry as displayed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub entry_type: EntryType,
}

/// Result of classifying a single name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Category,
    Article,
    Invalid,
}

// ---------------------------------------------------------------------------
// EntryValidator
// ---------------------------------------------------------------------------

pub struct EntryValidator {
    source: Arc<dyn WikiLookup>,
}

impl EntryValidator {
    pub fn new(source: Arc<dyn WikiLookup>) -> Self {
        Self { source }
    }

    /// Classify one name. The category check runs first, so a name that is
    /// both a category and an article title classifies as Category.
    ///
    /// A lookup failure is surfaced as an error, never folded into Invalid.
    pub async fn classify(&self, name: &str) -> Result<Classification, WikiError> {
        if self.source.category_exists(name).await? {
            return Ok(Classification::Category);
        }
        if self.source.page_exists(name).await? {
            return Ok(Classification::Article);
        }
        Ok(Classification::Invalid)
    }

    /// Classify every name, all-or-nothing: any Invalid name or lookup
    /// failure rejects the whole batch so callers never persist a partial
    /// set.
    pub async fn classify_batch(
        &self,
        names: &[String],
    ) -> Result<Vec<(String, EntryType)>, CoreError> {
        let mut classified = Vec::with_capacity(names.len());
        let mut invalid = Vec::new();

        for name in names {
            match self.classify(name).await? {
                Classification::Category => classified.push((name.clone(), EntryType::Category)),
                Classification::Article => classified.push((name.clone(), EntryType::Article)),
                Classification::Invalid => invalid.push(name.clone()),
            }
        }

        if !invalid.is_empty() {
            return Err(CoreError::InvalidEntries(invalid));
        }
        Ok(classified)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
