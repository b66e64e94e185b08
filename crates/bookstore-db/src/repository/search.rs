//! # Search Repository
//!
//! Read-only catalog search across every store.
//!
//! ## Query Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Flatten → Filter → Project                           │
//! │                                                                         │
//! │  stores ⋈ books          one row per (store, book), in SQLite          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CatalogMatcher          store_id / title / tags / content regexes     │
//! │       │                  unanchored, case-sensitive                     │
//! │       ▼                                                                 │
//! │  SearchHit { store_id, book_id, title }                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use bookstore_core::{CatalogMatcher, SearchHit};

/// A flattened (store, book) row with every searchable field.
#[derive(Debug, sqlx::FromRow)]
struct CatalogRow {
    store_id: String,
    book_id: String,
    title: String,
    tags: String,
    content: String,
}

/// Repository for catalog search.
#[derive(Debug, Clone)]
pub struct SearchRepository {
    pool: SqlitePool,
}

impl SearchRepository {
    /// Creates a new SearchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SearchRepository { pool }
    }

    /// Runs a filtered catalog search and materializes every hit.
    ///
    /// Rows come back in storage order: stores by insertion, then books by
    /// insertion.
    pub async fn search(&self, matcher: &CatalogMatcher) -> DbResult<Vec<SearchHit>> {
        debug!(?matcher, "Searching catalog");

        let rows = sqlx::query_as::<_, CatalogRow>(
            r#"
            SELECT s.store_id, b.book_id, b.title, b.tags, b.content
            FROM stores s
            INNER JOIN books b ON b.store_id = s.store_id
            ORDER BY s.rowid, b.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let scanned = rows.len();
        let hits: Vec<SearchHit> = rows
            .into_iter()
            .filter(|r| matcher.matches(&r.store_id, &r.title, &r.tags, &r.content))
            .map(|r| SearchHit {
                store_id: r.store_id,
                book_id: r.book_id,
                title: r.title,
            })
            .collect();

        debug!(scanned, count = hits.len(), "Search returned books");
        Ok(hits)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bookstore_core::{BookListing, SearchFilter};

    async fn catalog() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert("seller", "pw", 0).await.unwrap();

        for store in ["north-1", "south-1"] {
            db.stores().insert(store, "seller").await.unwrap();
        }

        let books = [
            ("north-1", "b-1", "Rust in Action", "systems;rust", "ownership and borrowing"),
            ("north-1", "b-2", "The Hobbit", "fantasy", "a hobbit leaves home"),
            ("south-1", "b-3", "Programming Rust", "systems;rust", "fearless concurrency"),
        ];
        for (store_id, book_id, title, tags, content) in books {
            db.stores()
                .add_book(&BookListing {
                    store_id: store_id.to_string(),
                    book_id: book_id.to_string(),
                    stock_level: 1,
                    price: 100,
                    title: title.to_string(),
                    tags: tags.to_string(),
                    content: content.to_string(),
                })
                .await
                .unwrap();
        }

        db
    }

    fn ids(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.book_id.as_str()).collect()
    }

    async fn run(db: &Database, filter: SearchFilter) -> Vec<SearchHit> {
        db.search().search(&filter.compile().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_no_filter_returns_every_row() {
        let db = catalog().await;
        let hits = run(&db, SearchFilter::new()).await;
        assert_eq!(ids(&hits), ["b-1", "b-2", "b-3"]);
        assert_eq!(hits[0].store_id, "north-1");
        assert_eq!(hits[0].title, "Rust in Action");
    }

    #[tokio::test]
    async fn test_substring_filters_combine() {
        let db = catalog().await;

        let hits = run(&db, SearchFilter::new().tags("rust").store("south")).await;
        assert_eq!(ids(&hits), ["b-3"]);

        let hits = run(&db, SearchFilter::new().content("hobbit")).await;
        assert_eq!(ids(&hits), ["b-2"]);
    }

    #[tokio::test]
    async fn test_match_is_case_sensitive() {
        let db = catalog().await;

        let upper = run(&db, SearchFilter::new().title("Rust")).await;
        assert_eq!(ids(&upper), ["b-1", "b-3"]);

        let lower = run(&db, SearchFilter::new().title("rust")).await;
        assert!(lower.is_empty());
    }

    #[tokio::test]
    async fn test_patterns_are_regular_expressions() {
        let db = catalog().await;

        let hits = run(&db, SearchFilter::new().title("Rust$")).await;
        assert_eq!(ids(&hits), ["b-3"]);

        let hits = run(&db, SearchFilter::new().title("^The .*t$")).await;
        assert_eq!(ids(&hits), ["b-2"]);

        let hits = run(&db, SearchFilter::new().store("^(north|south)-\\d$").content("ing|ency")).await;
        assert_eq!(ids(&hits), ["b-1", "b-3"]);
    }

    #[tokio::test]
    async fn test_empty_pattern_matches_everything() {
        let db = catalog().await;
        let hits = run(&db, SearchFilter::new().title("")).await;
        assert_eq!(hits.len(), 3);
    }
}
