// MediaWiki API client.
//
// Three query endpoints back the core: `list=allcategories` for category
// existence, a `titles=` page query with the missing flag for article
// existence, and `list=categorymembers` with `cmcontinue` paging for
// category expansion. Responses are decoded with small Option-returning
// shape helpers; a missing expected field maps to
// `WikiError::MalformedResponse` for that call.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{CategoryMember, MemberBatch, MemberKind, WikiError, WikiLookup};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound the API accepts for `cmlimit` on an anonymous request.
const CM_PAGE_MAX: usize = 500;

// ---------------------------------------------------------------------------
// WikiClient
// ---------------------------------------------------------------------------

pub struct WikiClient {
    http: reqwest::Client,
    api_url: String,
}

impl WikiClient {
    /// Build a client for the given API endpoint. The timeout applies to
    /// every request; there is no retry beyond the natural paging loop.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, WikiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wiki-bingo/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, WikiError> {
        let resp = self.http.get(&self.api_url).query(params).send().await?;
        let value = resp.error_for_status()?.json::<Value>().await?;
        Ok(value)
    }
}

#[async_trait]
impl WikiLookup for WikiClient {
    async fn category_exists(&self, name: &str) -> Result<bool, WikiError> {
        let value = self
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("list", "allcategories"),
                ("acprefix", name),
            ])
            .await?;

        let listing = parse_allcategories(&value).ok_or(WikiError::MalformedResponse {
            field: "query.allcategories",
        })?;

        // The prefix listing returns every category starting with `name`;
        // only an exact title match counts as existence.
        Ok(listing.iter().any(|title| title == name))
    }

    async fn page_exists(&self, title: &str) -> Result<bool, WikiError> {
        let value = self
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("titles", title),
            ])
            .await?;

        parse_page_present(&value).ok_or(WikiError::MalformedResponse {
            field: "query.pages",
        })
    }

    async fn category_members(
        &self,
        category: &str,
        limit: usize,
        continuation: Option<&str>,
    ) -> Result<MemberBatch, WikiError> {
        let cmtitle = format!("Category:{category}");
        let cmlimit = limit.clamp(1, CM_PAGE_MAX).to_string();

        let mut params = vec![
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("list", "categorymembers"),
            ("cmtitle", cmtitle.as_str()),
            ("cmlimit", cmlimit.as_str()),
            ("cmprop", "title|type"),
        ];
        if let Some(token) = continuation {
            params.push(("cmcontinue", token));
        }

        let value = self.query(&params).await?;
        let batch = parse_member_batch(&value).ok_or(WikiError::MalformedResponse {
            field: "query.categorymembers",
        })?;
        debug!(
            category,
            returned = batch.members.len(),
            more = batch.continuation.is_some(),
            "fetched category member batch"
        );
        Ok(batch)
    }
}

// ---------------------------------------------------------------------------
// JSON shape helpers
// ---------------------------------------------------------------------------

/// Extract the category titles from an `allcategories` listing.
///
/// Expected shape: `{ "query": { "allcategories": [ { "category": "..." } ] } }`
pub(crate) fn parse_allcategories(v: &Value) -> Option<Vec<String>> {
    let listing = v.get("query")?.get("allcategories")?.as_array()?;
    listing
        .iter()
        .map(|c| c.get("category").and_then(Value::as_str).map(str::to_owned))
        .collect()
}

/// Whether the single page in a `titles=` query result exists.
///
/// Expected shape: `{ "query": { "pages": [ { "title": "...", "missing": true? } ] } }`
/// A page flagged `missing` or `invalid` does not exist.
pub(crate) fn parse_page_present(v: &Value) -> Option<bool> {
    let page = v.get("query")?.get("pages")?.as_array()?.first()?;
    Some(page.get("missing").is_none() && page.get("invalid").is_none())
}

/// Extract one batch of category members and the continuation token.
///
/// Expected shape:
/// `{ "query": { "categorymembers": [ { "title": "...", "type": "page" } ] },
///    "continue": { "cmcontinue": "..." }? }`
pub(crate) fn parse_member_batch(v: &Value) -> Option<MemberBatch> {
    let raw = v.get("query")?.get("categorymembers")?.as_array()?;

    let mut members = Vec::with_capacity(raw.len());
    for m in raw {
        let title = m.get("title")?.as_str()?.to_owned();
        let kind = MemberKind::from_api(m.get("type").and_then(Value::as_str).unwrap_or("page"));
        members.push(CategoryMember { title, kind });
    }

    let continuation = v
        .get("continue")
        .and_then(|c| c.get("cmcontinue"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    Some(MemberBatch {
        members,
        continuation,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
