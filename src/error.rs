// Core error taxonomy shared by the preset, resolver, and board layers.
//
// Validation failures are recoverable and rendered back to the user;
// lookup failures carry the underlying wiki cause; storage failures are
// fatal for the enclosing operation (nothing partial is committed).

use thiserror::Error;

use crate::wiki::WikiError;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A mutation was given an empty entry list.
    #[error("no entries given")]
    EmptyEntryList,

    #[error("preset `{0}` already exists")]
    PresetExists(String),

    #[error("preset `{0}` does not exist")]
    PresetNotFound(String),

    /// One or more names matched neither a category nor an article title.
    #[error("not found on the wiki: {}", .0.join(", "))]
    InvalidEntries(Vec<String>),

    #[error("wiki lookup failed: {0}")]
    Lookup(#[from] WikiError),

    #[error("board needs {requested} pages but the preset expands to only {available}")]
    InsufficientPool { available: usize, requested: usize },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
