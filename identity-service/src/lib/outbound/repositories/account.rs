use std::fmt;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::SqlitePool;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::DisplayName;
use crate::account::models::EmailAddress;
use crate::account::ports::AccountRepository;

/// SQLite-backed account store.
///
/// Uniqueness of `handle` and `email` is enforced by the table's UNIQUE
/// constraints; violations come back as `DuplicateAccount`.
pub struct SqliteAccountRepository {
    pool: SqlitePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccountRecord {
    id: String,
    handle: String,
    display_name: String,
    email: String,
    credential_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// Rows that fail value validation surface as `DatabaseError`.
impl TryFrom<AccountRecord> for Account {
    type Error = AccountError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId::from_string(&record.id).map_err(|e| corrupt("id", e))?,
            handle: EmailAddress::new(record.handle).map_err(|e| corrupt("handle", e))?,
            display_name: DisplayName::new(record.display_name)
                .map_err(|e| corrupt("display_name", e))?,
            email: EmailAddress::new(record.email).map_err(|e| corrupt("email", e))?,
            credential_hash: record.credential_hash,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn corrupt(column: &str, e: impl fmt::Display) -> AccountError {
    AccountError::DatabaseError(format!("Stored account has invalid {}: {}", column, e))
}

fn map_write_error(e: sqlx::Error, handle: &EmailAddress, email: &EmailAddress) -> AccountError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            // SQLite reports the column, e.g. "UNIQUE constraint failed: accounts.email"
            let message = db_err.message();
            if message.contains("accounts.handle") {
                return AccountError::DuplicateAccount(format!("handle {}", handle));
            }
            if message.contains("accounts.email") {
                return AccountError::DuplicateAccount(format!("email {}", email));
            }
            return AccountError::DuplicateAccount(message.to_string());
        }
    }
    AccountError::DatabaseError(e.to_string())
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, handle, display_name, email, credential_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(account.handle.as_str())
        .bind(account.display_name.as_str())
        .bind(account.email.as_str())
        .bind(&account.credential_hash)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &account.handle, &account.email))?;

        Ok(account)
    }

    async fn find_by_handle(
        &self,
        handle: &EmailAddress,
    ) -> Result<Option<Account>, AccountError> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT id, handle, display_name, email, credential_hash, created_at, updated_at
            FROM accounts
            WHERE handle = ?
            "#,
        )
        .bind(handle.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        record.map(Account::try_from).transpose()
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            SELECT id, handle, display_name, email, credential_hash, created_at, updated_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        record.map(Account::try_from).transpose()
    }

    async fn update(
        &self,
        id: &AccountId,
        handle: &EmailAddress,
        email: &EmailAddress,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, AccountError> {
        let record = sqlx::query_as::<_, AccountRecord>(
            r#"
            UPDATE accounts
            SET handle = ?, email = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, handle, display_name, email, credential_hash, created_at, updated_at
            "#,
        )
        .bind(handle.as_str())
        .bind(email.as_str())
        .bind(updated_at)
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, handle, email))?;

        match record {
            Some(record) => Account::try_from(record),
            None => Err(AccountError::NotFound(id.to_string())),
        }
    }
}
