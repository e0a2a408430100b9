use crate::{AccountStore, AuthError, Result as AuthErrorResult};

use fh_core::{Account, Role, RoleSet};

use std::panic::Location;
use std::sync::Arc;

use chrono::Utc;
use error_location::ErrorLocation;
use log::info;
use uuid::Uuid;

pub struct AccountAdministration {
    accounts: Arc<dyn AccountStore>,
}

impl AccountAdministration {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    /// Mark an account as authorized. Only callers holding `ADMIN` may do
    /// this; an already authorized account is returned without a write.
    pub async fn authorize(
        &self,
        actor_authorities: &RoleSet,
        account_id: Uuid,
    ) -> AuthErrorResult<Account> {
        if !actor_authorities.contains(Role::Admin) {
            return Err(AuthError::Forbidden {
                message: "authorizing accounts requires ADMIN".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut account =
            self.accounts
                .find_by_id(account_id)
                .await?
                .ok_or_else(|| AuthError::AccountNotFound {
                    identity: account_id.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        if account.federation_authorized {
            return Ok(account);
        }

        account.federation_authorized = true;
        account.updated_at = Utc::now();
        self.accounts.update(&account).await?;

        info!("Account {} authorized", account.id);

        Ok(account)
    }
}
