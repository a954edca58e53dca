use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::errors::NotifierError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AuthenticatedAccount;
use crate::account::models::EmailAddress;
use crate::account::models::RegisterCommand;
use crate::account::models::UpdateProfileCommand;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new account and issue its first token.
    ///
    /// # Arguments
    /// * `command` - Validated command containing handle, display name, email and password
    ///
    /// # Returns
    /// Created account with a bearer token
    ///
    /// # Errors
    /// * `DuplicateAccount` - Handle or email is already registered
    /// * `DatabaseError` - Database operation failed
    /// * `Internal` - Password hashing or token signing failed
    async fn register(&self, command: RegisterCommand)
        -> Result<AuthenticatedAccount, AccountError>;

    /// Verify a handle/password pair and issue a token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown handle or wrong password (indistinguishable)
    /// * `DatabaseError` - Database operation failed
    /// * `Internal` - Token signing failed
    async fn login(&self, handle: &str, password: &str)
        -> Result<AuthenticatedAccount, AccountError>;

    /// Retrieve account by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_profile(&self, id: &AccountId) -> Result<Account, AccountError>;

    /// Overwrite handle and email of an existing account.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DuplicateAccount` - New handle or email belongs to another account
    /// * `DatabaseError` - Database operation failed
    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<Account, AccountError>;
}

/// Persistence operations for the account aggregate.
///
/// Implementations must enforce uniqueness of `handle` and `email`.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist new account to storage.
    ///
    /// # Errors
    /// * `DuplicateAccount` - Handle or email is already taken
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, account: Account) -> Result<Account, AccountError>;

    /// Retrieve account by login handle.
    ///
    /// # Returns
    /// Optional account entity (None if not found)
    async fn find_by_handle(&self, handle: &EmailAddress)
        -> Result<Option<Account>, AccountError>;

    /// Retrieve account by identifier.
    ///
    /// # Returns
    /// Optional account entity (None if not found)
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;

    /// Overwrite handle and email, stamping `updated_at`.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DuplicateAccount` - New handle or email is already taken
    /// * `DatabaseError` - Database operation failed
    async fn update(
        &self,
        id: &AccountId,
        handle: &EmailAddress,
        email: &EmailAddress,
        updated_at: DateTime<Utc>,
    ) -> Result<Account, AccountError>;
}

/// Best-effort propagation of new accounts to the companion service.
#[async_trait]
pub trait CompanionNotifier: Send + Sync + 'static {
    /// Deliver the bearer token of a freshly registered account.
    ///
    /// # Errors
    /// * `Rejected` - Companion answered with a non-success status
    /// * `Transport` - Companion could not be reached
    async fn notify_account_created(&self, token: &str) -> Result<(), NotifierError>;
}
