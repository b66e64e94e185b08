//! # Account Ledger
//!
//! Balance debits and credits plus credential checks.
//!
//! `try_debit` relies on the guarded update
//! `UPDATE users SET balance = balance - ? WHERE user_id = ? AND balance >= ?`,
//! so concurrent debits can never drive a balance below zero.

use bookstore_core::{CoreError, User};
use bookstore_db::{Database, GuardOutcome};
use tracing::{debug, warn};

use crate::error::LedgerResult;

/// Guarded balance updates over the storage adapter.
#[derive(Debug, Clone)]
pub struct AccountLedger {
    db: Database,
}

impl AccountLedger {
    /// Creates a ledger over an injected database handle.
    pub fn new(db: Database) -> Self {
        AccountLedger { db }
    }

    /// Loads a user and checks the password.
    ///
    /// Fails `UnknownUser` when the user is missing and `BadCredential`
    /// on a mismatch.
    pub async fn authenticate(&self, user_id: &str, password: &str) -> LedgerResult<User> {
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::UnknownUser(user_id.to_string()))?;

        if !user.password_matches(password) {
            debug!(user_id, "Password mismatch");
            return Err(CoreError::BadCredential.into());
        }

        Ok(user)
    }

    /// Removes `amount` from the balance if the balance covers it.
    pub async fn try_debit(&self, user_id: &str, amount: i64) -> LedgerResult<()> {
        let users = self.db.users();

        match users.try_debit(user_id, amount).await? {
            GuardOutcome::Applied => {
                debug!(user_id, amount, "Balance debited");
                Ok(())
            }
            GuardOutcome::Rejected => {
                let err = match users.get_by_id(user_id).await? {
                    Some(user) => {
                        warn!(user_id, amount, balance = user.balance, "Balance guard rejected debit");
                        CoreError::InsufficientFunds {
                            user_id: user_id.to_string(),
                            required: amount,
                            available: user.balance,
                        }
                    }
                    None => CoreError::UnknownUser(user_id.to_string()),
                };
                Err(err.into())
            }
        }
    }

    /// Adds `amount` to the balance.
    ///
    /// Fails `UnknownUser` when the user is missing, and `BalanceOverflow`
    /// when the new balance would not fit; the balance is left untouched.
    pub async fn credit(&self, user_id: &str, amount: i64) -> LedgerResult<()> {
        let users = self.db.users();

        match users.credit(user_id, amount).await? {
            GuardOutcome::Applied => {
                debug!(user_id, amount, "Balance credited");
                Ok(())
            }
            GuardOutcome::Rejected => {
                let err = match users.get_by_id(user_id).await? {
                    Some(user) => {
                        warn!(user_id, amount, balance = user.balance, "Balance guard rejected credit");
                        CoreError::BalanceOverflow {
                            user_id: user_id.to_string(),
                            balance: user.balance,
                            amount,
                        }
                    }
                    None => CoreError::UnknownUser(user_id.to_string()),
                };
                Err(err.into())
            }
        }
    }

    /// Current balance of a user.
    pub async fn balance(&self, user_id: &str) -> LedgerResult<i64> {
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::UnknownUser(user_id.to_string()))?;
        Ok(user.balance)
    }
}
