//! # User Repository
//!
//! Accounts, balances and completed-order history.
//!
//! ## Balance Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ WRONG: read balance, compute, write back (lost update)         │
//! │     SELECT balance ...; UPDATE users SET balance = 700 ...          │
//! │                                                                     │
//! │  ✅ CORRECT: delta with the guard in the same statement             │
//! │     UPDATE users SET balance = balance - 300                        │
//! │     WHERE user_id = ? AND balance >= 300                            │
//! │                                                                     │
//! │  Two concurrent debits can never both pass a guard that only one   │
//! │  of them can satisfy.                                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::GuardOutcome;
use bookstore_core::{HistoryEntry, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, user_id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, password, balance
            FROM users
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Checks whether a user exists.
    pub async fn exists(&self, user_id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Inserts a user with an opening balance.
    ///
    /// Registration lives outside the order engine; this is the storage
    /// primitive it (and the seed tool) use.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - user id already taken
    pub async fn insert(&self, user_id: &str, password: &str, balance: i64) -> DbResult<User> {
        debug!(user_id = %user_id, "Inserting user");

        sqlx::query("INSERT INTO users (user_id, password, balance) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(password)
            .bind(balance)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, user_id),
                other => other,
            })?;

        Ok(User {
            user_id: user_id.to_string(),
            password: password.to_string(),
            balance,
        })
    }

    /// Debits `amount` only if the balance covers it.
    ///
    /// Returns `Rejected` when the user is missing or the balance is short.
    pub async fn try_debit(&self, user_id: &str, amount: i64) -> DbResult<GuardOutcome> {
        debug!(user_id = %user_id, amount = %amount, "Guarded debit");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET balance = balance - ?2
            WHERE user_id = ?1 AND balance >= ?2
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(GuardOutcome::from_rows_affected(result.rows_affected()))
    }

    /// Credits `amount` only if the new balance still fits in an `i64`.
    ///
    /// Returns `Rejected` when the user is missing or the sum would
    /// overflow. SQLite silently turns an overflowing integer sum into a
    /// REAL, so the bound is checked in the `WHERE` clause.
    pub async fn credit(&self, user_id: &str, amount: i64) -> DbResult<GuardOutcome> {
        debug!(user_id = %user_id, amount = %amount, "Guarded credit");

        let result = sqlx::query(
            r#"
            UPDATE users
            SET balance = balance + ?2
            WHERE user_id = ?1 AND ?2 >= 0 AND balance <= 9223372036854775807 - ?2
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(GuardOutcome::from_rows_affected(result.rows_affected()))
    }

    /// Appends a completed-order snapshot to the user's history.
    pub async fn append_history(&self, user_id: &str, entry: &HistoryEntry) -> DbResult<()> {
        debug!(user_id = %user_id, order_id = %entry.order_id, "Appending history entry");

        let snapshot = serde_json::to_string(entry)?;

        sqlx::query("INSERT INTO order_history (user_id, snapshot) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(snapshot)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Returns the user's history in append order.
    pub async fn history(&self, user_id: &str) -> DbResult<Vec<HistoryEntry>> {
        let snapshots: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT snapshot
            FROM order_history
            WHERE user_id = ?1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        snapshots
            .iter()
            .map(|s| serde_json::from_str(s).map_err(DbError::from))
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bookstore_core::{LineItem, OrderStatus};
    use chrono::Utc;

    async fn repo() -> UserRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().users()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let users = repo().await;
        users.insert("alice", "secret", 500).await.unwrap();

        let alice = users.get_by_id("alice").await.unwrap().unwrap();
        assert_eq!(alice.balance, 500);
        assert!(alice.password_matches("secret"));
        assert!(users.exists("alice").await.unwrap());
        assert!(!users.exists("bob").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let users = repo().await;
        users.insert("alice", "secret", 0).await.unwrap();

        let err = users.insert("alice", "other", 0).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_guarded_debit() {
        let users = repo().await;
        users.insert("alice", "pw", 300).await.unwrap();

        assert_eq!(users.try_debit("alice", 200).await.unwrap(), GuardOutcome::Applied);
        assert_eq!(users.try_debit("alice", 200).await.unwrap(), GuardOutcome::Rejected);
        assert_eq!(users.try_debit("nobody", 1).await.unwrap(), GuardOutcome::Rejected);

        let alice = users.get_by_id("alice").await.unwrap().unwrap();
        assert_eq!(alice.balance, 100);
    }

    #[tokio::test]
    async fn test_credit() {
        let users = repo().await;
        users.insert("alice", "pw", 0).await.unwrap();

        assert_eq!(users.credit("alice", 250).await.unwrap(), GuardOutcome::Applied);
        assert_eq!(users.get_by_id("alice").await.unwrap().unwrap().balance, 250);

        assert_eq!(users.credit("nobody", 1).await.unwrap(), GuardOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_credit_refuses_overflow() {
        let users = repo().await;
        users.insert("alice", "pw", i64::MAX - 5).await.unwrap();

        assert_eq!(users.credit("alice", 10).await.unwrap(), GuardOutcome::Rejected);
        assert_eq!(users.credit("alice", -1).await.unwrap(), GuardOutcome::Rejected);

        let alice = users.get_by_id("alice").await.unwrap().unwrap();
        assert_eq!(alice.balance, i64::MAX - 5);

        assert_eq!(users.credit("alice", 5).await.unwrap(), GuardOutcome::Applied);
        let alice = users.get_by_id("alice").await.unwrap().unwrap();
        assert_eq!(alice.balance, i64::MAX);
    }

    #[tokio::test]
    async fn test_history_keeps_append_order() {
        let users = repo().await;
        users.insert("alice", "pw", 0).await.unwrap();

        for id in ["o-1", "o-2"] {
            let entry = HistoryEntry {
                order_id: id.to_string(),
                buyer_id: "alice".to_string(),
                store_id: "s".to_string(),
                items: vec![LineItem::new("b", 1, 10)],
                status: OrderStatus::Completed,
                completion_time: Utc::now(),
            };
            users.append_history("alice", &entry).await.unwrap();
        }

        let history = users.history("alice").await.unwrap();
        let ids: Vec<_> = history.iter().map(|e| e.order_id.as_str()).collect();
        assert_eq!(ids, ["o-1", "o-2"]);
        assert!(users.history("bob").await.unwrap().is_empty());
    }
}
