//! Catalog search across every store.

use bookstore_core::{SearchFilter, SearchHit};
use bookstore_db::Database;
use tracing::debug;

use crate::error::LedgerResult;

/// Read-only search over the flattened (store, book) rows.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    db: Database,
}

impl SearchIndex {
    pub fn new(db: Database) -> Self {
        SearchIndex { db }
    }

    /// Returns every (store, book) row matching all present filters.
    ///
    /// Patterns are case-sensitive, unanchored regular expressions; one that
    /// does not compile fails `InvalidInput`. The whole result is
    /// materialized before returning.
    pub async fn search(&self, filter: &SearchFilter) -> LedgerResult<Vec<SearchHit>> {
        let matcher = filter.compile()?;
        let hits = self.db.search().search(&matcher).await?;
        debug!(hits = hits.len(), "Catalog search finished");
        Ok(hits)
    }
}
