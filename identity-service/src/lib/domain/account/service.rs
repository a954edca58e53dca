use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Utc;

use crate::account::claims;
use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AuthenticatedAccount;
use crate::account::models::EmailAddress;
use crate::account::models::Password;
use crate::account::models::RegisterCommand;
use crate::account::models::UpdateProfileCommand;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::account::ports::CompanionNotifier;

/// Domain service implementation for account operations.
///
/// Concrete implementation of AccountServicePort with dependency injection.
/// Password hashing and verification run on the blocking thread pool.
pub struct AccountService<AR, CN>
where
    AR: AccountRepository,
    CN: CompanionNotifier,
{
    repository: Arc<AR>,
    notifier: Arc<CN>,
    authenticator: Arc<Authenticator>,
    notify_timeout: Duration,
}

impl<AR, CN> AccountService<AR, CN>
where
    AR: AccountRepository,
    CN: CompanionNotifier,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Account persistence implementation
    /// * `notifier` - Companion service notification implementation
    /// * `authenticator` - Process-wide hasher and token signer
    /// * `notify_timeout` - Upper bound on a single companion notification
    pub fn new(
        repository: Arc<AR>,
        notifier: Arc<CN>,
        authenticator: Arc<Authenticator>,
        notify_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            notifier,
            authenticator,
            notify_timeout,
        }
    }

    async fn hash_password(&self, password: Password) -> Result<String, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.hash_password(password.expose()))
            .await
            .map_err(|e| AccountError::Internal(format!("Password hashing task failed: {}", e)))?
            .map_err(|e| AccountError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Fire and forget: the caller never waits on the companion service.
    fn spawn_notification(&self, account_id: AccountId, token: String) {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.notify_timeout;

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, notifier.notify_account_created(&token)).await {
                Ok(Ok(())) => {
                    tracing::debug!(account_id = %account_id, "Companion service notified");
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        account_id = %account_id,
                        error = %e,
                        "Failed to notify companion service"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        account_id = %account_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "Companion service notification timed out"
                    );
                }
            }
        });
    }
}

#[async_trait]
impl<AR, CN> AccountServicePort for AccountService<AR, CN>
where
    AR: AccountRepository,
    CN: CompanionNotifier,
{
    async fn register(
        &self,
        command: RegisterCommand,
    ) -> Result<AuthenticatedAccount, AccountError> {
        // Advisory only: the store's unique constraint is authoritative
        if self
            .repository
            .find_by_handle(&command.handle)
            .await?
            .is_some()
        {
            return Err(AccountError::DuplicateAccount(format!(
                "handle {}",
                command.handle
            )));
        }

        let credential_hash = self.hash_password(command.password).await?;

        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            handle: command.handle,
            display_name: command.display_name,
            email: command.email,
            credential_hash,
            created_at: now,
            updated_at: now,
        };

        let account = self.repository.create(account).await?;
        tracing::info!(account_id = %account.id, "Account registered");

        let token = self
            .authenticator
            .generate_token(&claims::build(&account, Utc::now()))
            .map_err(|e| AccountError::Internal(format!("Token generation failed: {}", e)))?;

        self.spawn_notification(account.id, token.clone());

        Ok(AuthenticatedAccount { account, token })
    }

    async fn login(
        &self,
        handle: &str,
        password: &str,
    ) -> Result<AuthenticatedAccount, AccountError> {
        let account = match EmailAddress::new(handle.to_string()) {
            Ok(handle) => self.repository.find_by_handle(&handle).await?,
            Err(_) => None,
        };

        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();

        let Some(account) = account else {
            // Spend the same verification cost as a real account would
            tokio::task::spawn_blocking(move || authenticator.verify_dummy_password(&password))
                .await
                .map_err(|e| AccountError::Internal(format!("Password check task failed: {}", e)))?;

            tracing::debug!("Login rejected: unknown handle");
            return Err(AccountError::InvalidCredentials);
        };

        let claims = claims::build(&account, Utc::now());
        let stored_hash = account.credential_hash.clone();

        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &stored_hash, &claims)
        })
        .await
        .map_err(|e| AccountError::Internal(format!("Password check task failed: {}", e)))?;

        match result {
            Ok(result) => {
                tracing::info!(account_id = %account.id, "Login succeeded");
                Ok(AuthenticatedAccount {
                    account,
                    token: result.access_token,
                })
            }
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::debug!(account_id = %account.id, "Login rejected: wrong password");
                Err(AccountError::InvalidCredentials)
            }
            Err(AuthenticationError::Token(e)) => Err(AccountError::Internal(format!(
                "Token generation failed: {}",
                e
            ))),
        }
    }

    async fn get_profile(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<Account, AccountError> {
        let account = self
            .repository
            .update(id, &command.handle, &command.email, Utc::now())
            .await?;

        tracing::info!(account_id = %account.id, "Account profile updated");

        Ok(account)
    }
}
