use crate::AdminDesignation;

use fh_core::{Account, RoleSet};

use uuid::Uuid;

/// The authenticated identity handed back to the caller's session layer
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub account_id: Uuid,
    /// Display name
    pub username: String,
    /// Identity remember-me grants are minted under
    pub effective_username: String,
    pub authorities: RoleSet,
}

impl Principal {
    pub fn for_account(account: &Account, admin: &AdminDesignation) -> Self {
        Self {
            account_id: account.id,
            username: account.username.clone(),
            effective_username: account.effective_username().to_string(),
            authorities: admin.authorities_for(account),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.authorities.is_admin()
    }
}
