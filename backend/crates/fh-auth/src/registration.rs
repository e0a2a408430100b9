use crate::{AccountStore, AuthError, Result as AuthErrorResult, hash_password, validate_password_policy};

use fh_core::Account;

use std::panic::Location;
use std::sync::Arc;

use error_location::ErrorLocation;
use log::info;

/// Local sign-up with username and password
pub struct AccountRegistrar {
    accounts: Arc<dyn AccountStore>,
}

impl AccountRegistrar {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> AuthErrorResult<Account> {
        Account::validate_username(username)
            .map_err(|e| AuthError::validation("username", e.to_string()))?;
        validate_password_policy(password, confirm_password)?;

        let username = username.trim();

        if self.accounts.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken {
                username: username.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let account = Account::local(username, hash_password(password)?);
        self.accounts.create(&account).await?;

        info!("Registered local account {}", account.id);

        Ok(account)
    }
}
