// Wiki lookup seam.
//
// The validator, resolver, and board generator talk to the external wiki
// through the `WikiLookup` trait so they can be exercised against an
// in-memory source in tests. The real implementation lives in `client`.

pub mod client;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WikiError {
    #[error("wiki request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response parsed as JSON but lacks an expected field.
    #[error("unexpected wiki API response: missing `{field}`")]
    MalformedResponse { field: &'static str },
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// What kind of object a category member is. Only `Page` members make it
/// onto a board; sub-categories and files are filtered out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Page,
    SubCategory,
    File,
    Other,
}

impl MemberKind {
    /// Map the API's `type` string onto a kind. Unrecognized values fall
    /// through to `Other` so they are filtered rather than guessed at.
    pub fn from_api(s: &str) -> Self {
        match s {
            "page" => MemberKind::Page,
            "subcat" => MemberKind::SubCategory,
            "file" => MemberKind::File,
            _ => MemberKind::Other,
        }
    }
}

/// One member of a category listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMember {
    pub title: String,
    pub kind: MemberKind,
}

/// A single page of category members plus the continuation token, if the
/// source reported further results.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberBatch {
    pub members: Vec<CategoryMember>,
    pub continuation: Option<String>,
}

// ---------------------------------------------------------------------------
// The lookup trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait WikiLookup: Send + Sync {
    /// Whether a category with exactly this title exists.
    async fn category_exists(&self, name: &str) -> Result<bool, WikiError>;

    /// Whether an article page with exactly this title exists (not flagged
    /// missing or invalid by the API).
    async fn page_exists(&self, title: &str) -> Result<bool, WikiError>;

    /// Fetch one batch of members of `Category:{category}`, resuming from
    /// `continuation` when given. `limit` caps how many members the caller
    /// still wants; the source may return fewer.
    async fn category_members(
        &self,
        category: &str,
        limit: usize,
        continuation: Option<&str>,
    ) -> Result<MemberBatch, WikiError>;
}

// ---------------------------------------------------------------------------
// Test double shared by unit tests across modules
// ---------------------------------------------------------------------------
