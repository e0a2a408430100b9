use crate::{AccountStore, AuthError, Result as AuthErrorResult, verify_password};

use fh_core::Account;

use std::sync::Arc;

use log::{debug, warn};

/// Verifies a username (or email) and password pair.
///
/// Every failure, including unknown and disabled accounts, surfaces as the
/// same `InvalidCredentials` error.
pub struct PasswordAuthenticator {
    accounts: Arc<dyn AccountStore>,
}

impl PasswordAuthenticator {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    pub async fn authenticate(&self, login: &str, password: &str) -> AuthErrorResult<Account> {
        let Some(account) = self.accounts.find_by_login(login.trim()).await? else {
            debug!("Password login for unknown account");
            return Err(AuthError::invalid_credentials());
        };

        let Some(hash) = account.credential_hash.as_deref().filter(|hash| !hash.is_empty())
        else {
            debug!("Password login for federation-only account {}", account.id);
            return Err(AuthError::invalid_credentials());
        };

        if !verify_password(hash, password) {
            warn!("Wrong password for account {}", account.id);
            return Err(AuthError::invalid_credentials());
        }

        if !account.enabled {
            warn!("Password login for disabled account {}", account.id);
            return Err(AuthError::invalid_credentials());
        }

        Ok(account)
    }
}
