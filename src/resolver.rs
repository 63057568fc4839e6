// Cache-first category expansion.
//
// A cached expansion is ground truth: once a category key exists in the
// cache it is returned verbatim and never re-fetched by `resolve`. The
// explicit `refresh` operation is the only way to overwrite a cached row.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::CoreError;
use crate::wiki::{MemberKind, WikiError, WikiLookup};

/// Default member cap when expanding a category for a board.
pub const DEFAULT_CATEGORY_LIMIT: usize = 500;

#[derive(Clone)]
pub struct CategoryResolver {
    db: Arc<Database>,
    source: Arc<dyn WikiLookup>,
}

impl CategoryResolver {
    pub fn new(db: Arc<Database>, source: Arc<dyn WikiLookup>) -> Self {
        Self { db, source }
    }

    /// Expand `category` into its member article names.
    ///
    /// A cache hit returns the stored expansion verbatim, whatever `limit`
    /// is. On a miss the full accumulated list is written to the cache once,
    /// after the paging loop finishes, so an interrupted expansion never
    /// leaves a partial row. A malformed response aborts the expansion and
    /// returns an empty list without caching; transport failures propagate.
    pub async fn resolve(&self, category: &str, limit: usize) -> Result<Vec<String>, CoreError> {
        if let Some(pages) = self.db.cached_category(category)? {
            debug!(category, count = pages.len(), "category cache hit");
            return Ok(pages);
        }

        match self.fetch(category, limit).await {
            Ok(pages) => {
                self.db.cache_category(category, &pages)?;
                info!(category, count = pages.len(), "category expansion cached");
                Ok(pages)
            }
            Err(WikiError::MalformedResponse { field }) => {
                warn!(
                    category,
                    field, "malformed category listing; returning empty expansion uncached"
                );
                Ok(Vec::new())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Re-fetch `category` and overwrite any cached expansion. This is the
    /// recovery path for a cache row recorded from an earlier truncated
    /// fetch. Unlike `resolve`, a malformed response surfaces as an error
    /// and leaves the existing cache row untouched.
    pub async fn refresh(&self, category: &str, limit: usize) -> Result<Vec<String>, CoreError> {
        let pages = self.fetch(category, limit).await?;
        self.db.replace_cached_category(category, &pages)?;
        info!(category, count = pages.len(), "category expansion refreshed");
        Ok(pages)
    }

    /// Page through the member listing, keeping only `Page` members, until
    /// `limit` is reached or the source reports no continuation.
    async fn fetch(&self, category: &str, limit: usize) -> Result<Vec<String>, WikiError> {
        // Hard cap on requests so a misbehaving continuation protocol cannot
        // loop forever; proportional to the requested limit.
        let max_requests = limit / 50 + 2;

        let mut pages: Vec<String> = Vec::new();
        let mut continuation: Option<String> = None;
        let mut requests = 0;

        while pages.len() < limit && requests < max_requests {
            let batch = self
                .source
                .category_members(category, limit - pages.len(), continuation.as_deref())
                .await?;
            requests += 1;

            pages.extend(
                batch
                    .members
                    .into_iter()
                    .filter(|m| m.kind == MemberKind::Page)
                    .map(|m| m.title),
            );

            match batch.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        pages.truncate(limit);
        Ok(pages)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::testing::StaticWiki;
    use crate::wiki::{CategoryMember, MemberBatch};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resolver(wiki: StaticWiki) -> (CategoryResolver, Arc<StaticWiki>) {
        let db = Arc::new(Database::open(":memory:").unwrap());
        let source = Arc::new(wiki);
        (
            CategoryResolver::new(db, Arc::clone(&source) as Arc<dyn WikiLookup>),
            source,
        )
    }

    #[tokio::test]
    async fn resolves_and_caches_members() {
        let (r, wiki) = resolver(StaticWiki::new().with_category(
            "Indie games",
            &["Celeste", "Hades", "Undertale"],
        ));

        let pages = r.resolve("Indie games", 10).await.unwrap();
        assert_eq!(pages, vec!["Celeste", "Hades", "Undertale"]);
        assert_eq!(wiki.member_call_count(), 1);

        // Second call is served from the cache.
        let again = r.resolve("Indie games", 10).await.unwrap();
        assert_eq!(again, pages);
        assert_eq!(wiki.member_call_count(), 1);
    }

    #[tokio::test]
    async fn cache_hit_ignores_limit() {
        let (r, _) = resolver(StaticWiki::new().with_category(
            "Indie games",
            &["Celeste", "Hades", "Undertale"],
        ));

        let full = r.resolve("Indie games", 10).await.unwrap();
        assert_eq!(full.len(), 3);

        // The cached value is returned verbatim, not re-truncated.
        let hit = r.resolve("Indie games", 1).await.unwrap();
        assert_eq!(hit, full);
    }

    #[tokio::test]
    async fn pages_through_continuations() {
        let mut wiki = StaticWiki::new().with_category(
            "Indie games",
            &["A", "B", "C", "D", "E", "F", "G"],
        );
        wiki.page_size = 3;
        let (r, wiki) = resolver(wiki);

        let pages = r.resolve("Indie games", 10).await.unwrap();
        assert_eq!(pages, vec!["A", "B", "C", "D", "E", "F", "G"]);
        assert_eq!(wiki.member_call_count(), 3);
    }

    #[tokio::test]
    async fn stops_at_limit() {
        let mut wiki =
            StaticWiki::new().with_category("Indie games", &["A", "B", "C", "D", "E"]);
        wiki.page_size = 2;
        let (r, _) = resolver(wiki);

        let pages = r.resolve("Indie games", 3).await.unwrap();
        assert_eq!(pages, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn filters_non_page_members() {
        let wiki = StaticWiki::new()
            .with_member("Indie games", "Celeste", MemberKind::Page)
            .with_member("Indie games", "Category:Roguelikes", MemberKind::SubCategory)
            .with_member("Indie games", "File:Box art.png", MemberKind::File)
            .with_member("Indie games", "Hades", MemberKind::Page);
        let (r, _) = resolver(wiki);

        let pages = r.resolve("Indie games", 10).await.unwrap();
        assert_eq!(pages, vec!["Celeste", "Hades"]);
    }

    #[tokio::test]
    async fn malformed_response_yields_empty_and_uncached() {
        let mut wiki = StaticWiki::new().with_category("Indie games", &["Celeste"]);
        wiki.poisoned = true;
        let (r, wiki) = resolver(wiki);

        let pages = r.resolve("Indie games", 10).await.unwrap();
        assert!(pages.is_empty());

        // Nothing was cached, so a later resolve hits the source again.
        let calls_before = wiki.member_call_count();
        let _ = r.resolve("Indie games", 10).await.unwrap();
        assert!(wiki.member_call_count() > calls_before);
    }

    #[tokio::test]
    async fn refresh_overwrites_cached_expansion() {
        let db = Arc::new(Database::open(":memory:").unwrap());
        db.cache_category("Indie games", &["Stale".to_string()])
            .unwrap();

        let source = Arc::new(StaticWiki::new().with_category("Indie games", &["Celeste", "Hades"]));
        let r = CategoryResolver::new(Arc::clone(&db), source as Arc<dyn WikiLookup>);

        // resolve keeps serving the stale row...
        assert_eq!(r.resolve("Indie games", 10).await.unwrap(), vec!["Stale"]);

        // ...until an explicit refresh replaces it.
        let fresh = r.refresh("Indie games", 10).await.unwrap();
        assert_eq!(fresh, vec!["Celeste", "Hades"]);
        assert_eq!(r.resolve("Indie games", 10).await.unwrap(), fresh);
    }

    #[tokio::test]
    async fn refresh_surfaces_malformed_response() {
        let db = Arc::new(Database::open(":memory:").unwrap());
        db.cache_category("Indie games", &["Stale".to_string()])
            .unwrap();

        let mut wiki = StaticWiki::new();
        wiki.poisoned = true;
        let r = CategoryResolver::new(Arc::clone(&db), Arc::new(wiki) as Arc<dyn WikiLookup>);

        assert!(r.refresh("Indie games", 10).await.is_err());
        // The stale row survives a failed refresh.
        assert_eq!(
            db.cached_category("Indie games").unwrap(),
            Some(vec!["Stale".to_string()])
        );
    }

    /// A source whose continuation protocol misbehaves: it always reports
    /// more results but never returns any members.
    struct StallingWiki {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WikiLookup for StallingWiki {
        async fn category_exists(&self, _name: &str) -> Result<bool, WikiError> {
            Ok(true)
        }

        async fn page_exists(&self, _title: &str) -> Result<bool, WikiError> {
            Ok(false)
        }

        async fn category_members(
            &self,
            _category: &str,
            _limit: usize,
            _continuation: Option<&str>,
        ) -> Result<MemberBatch, WikiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MemberBatch {
                members: Vec::<CategoryMember>::new(),
                continuation: Some("again".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn paging_loop_terminates_on_stalled_continuation() {
        let db = Arc::new(Database::open(":memory:").unwrap());
        let source = Arc::new(StallingWiki {
            calls: AtomicUsize::new(0),
        });
        let r = CategoryResolver::new(db, Arc::clone(&source) as Arc<dyn WikiLookup>);

        let pages = r.resolve("Bottomless", 500).await.unwrap();
        assert!(pages.is_empty());

        // Bounded by the request cap, not by the (never-ending) continuation.
        let calls = source.calls.load(Ordering::SeqCst);
        assert!(calls <= 500 / 50 + 2, "made {calls} requests");
    }
}
