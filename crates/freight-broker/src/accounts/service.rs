use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::credentials::{hash_password, verify_password, CredentialError};
use super::domain::{check_password, NewUser, User, UserPatch};
use crate::brokerage::domain::ValidationError;
use crate::store::{EntityStore, RecordKey, StoreError};

/// Credentials presented at login.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Account operations over the shared entity store.
pub struct AccountService<S> {
    store: Arc<S>,
}

impl<S> AccountService<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Register a new account. Username and e-mail must be unused.
    pub fn register(&self, draft: NewUser) -> Result<User, AccountError> {
        check_password(&draft.password)?;
        let password_hash = hash_password(&draft.password)?;
        let user = draft.into_user(password_hash)?;

        let stored = self.store.create(user)?;
        info!(user = %stored.id, role = ?stored.role, "account registered");
        Ok(stored)
    }

    /// Resolve the account for a username/password pair.
    pub fn authenticate(&self, login: &LoginRequest) -> Result<User, AccountError> {
        let username = login.username.trim();
        let Some(user) = self
            .store
            .list::<User>(&|user| user.username == username)?
            .into_iter()
            .next()
        else {
            warn!(%username, "login for unknown account");
            return Err(AccountError::InvalidCredentials);
        };

        if verify_password(&login.password, &user.password_hash)? {
            info!(user = %user.id, "login succeeded");
            Ok(user)
        } else {
            warn!(user = %user.id, "login rejected");
            Err(AccountError::InvalidCredentials)
        }
    }

    pub fn list(&self) -> Result<Vec<User>, AccountError> {
        Ok(self.store.list::<User>(&|_| true)?)
    }

    pub fn get(&self, id: &str) -> Result<User, AccountError> {
        Ok(self.store.get(&RecordKey::from(id))?)
    }

    /// Partial profile update. A new password is hashed before the row is touched.
    pub fn update(&self, id: &str, mut patch: UserPatch) -> Result<User, AccountError> {
        let password_hash = match patch.password.take() {
            Some(password) => {
                check_password(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        let updated = self
            .store
            .update(&RecordKey::from(id), |user: &mut User| {
                patch.apply_profile(user)?;
                if let Some(hash) = password_hash {
                    user.password_hash = hash;
                }
                Ok::<(), AccountError>(())
            })?;
        info!(user = %updated.id, "account updated");
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<(), AccountError> {
        self.store.delete::<User>(&RecordKey::from(id))?;
        info!(user = %id, "account deleted");
        Ok(())
    }
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
