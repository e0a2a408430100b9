use crate::{AccountStore, AuthError, Result as AuthErrorResult};

use fh_core::{Account, FederatedClaims, Role, RoleSet};
use fh_db::DbError;

use std::panic::Location;
use std::sync::Arc;

use chrono::Utc;
use error_location::ErrorLocation;
use log::{debug, info, warn};

/// The single configured administrator email. Compared case-insensitively;
/// elevation is computed per login and never written to the account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminDesignation {
    email: Option<String>,
}

impl AdminDesignation {
    pub fn new(email: Option<&str>) -> Self {
        Self {
            email: email
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(str::to_lowercase),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.email.is_some()
    }

    pub fn matches(&self, email: Option<&str>) -> bool {
        match (&self.email, email) {
            (Some(admin), Some(email)) => admin.eq_ignore_ascii_case(email.trim()),
            _ => false,
        }
    }

    /// Stored roles plus `ADMIN` when the account's email is the designated one
    pub fn authorities_for(&self, account: &Account) -> RoleSet {
        if self.matches(account.email.as_deref()) {
            account.roles.with(Role::Admin)
        } else {
            account.roles.clone()
        }
    }
}

/// Result of merging one federated login into the account table
#[derive(Debug, Clone)]
pub struct ReconciledIdentity {
    pub account: Account,
    pub is_admin: bool,
    /// Whether this reconciliation wrote to the store
    pub written: bool,
}

pub struct IdentityReconciler {
    accounts: Arc<dyn AccountStore>,
    admin: AdminDesignation,
}

impl IdentityReconciler {
    pub fn new(accounts: Arc<dyn AccountStore>, admin: AdminDesignation) -> Self {
        Self { accounts, admin }
    }

    /// Find or create the account for `claims`, keyed by email.
    ///
    /// At most one write, and only when something changed. A locally set
    /// credential is never touched.
    pub async fn reconcile(&self, claims: &FederatedClaims) -> AuthErrorResult<ReconciledIdentity> {
        let email = claims.email().ok_or_else(|| AuthError::MissingEmail {
            location: ErrorLocation::from(Location::caller()),
        })?;

        let existing = self
            .accounts
            .find_by_email(email)
            .await
            .map_err(Self::failed)?;

        let (account, written) = match existing {
            Some(account) => self.merge_existing(account, claims).await?,
            None => self.create_or_merge(email, claims).await?,
        };

        Ok(ReconciledIdentity {
            is_admin: self.admin.matches(Some(email)),
            account,
            written,
        })
    }

    async fn merge_existing(
        &self,
        mut account: Account,
        claims: &FederatedClaims,
    ) -> AuthErrorResult<(Account, bool)> {
        let name = self.adoptable_name(&account, claims).await?;

        if !Self::apply_claims(&mut account, name, claims) {
            debug!("Account {} already up to date", account.id);
            return Ok((account, false));
        }

        account.updated_at = Utc::now();
        self.accounts.update(&account).await.map_err(Self::failed)?;
        info!("Linked federated login to account {}", account.id);

        Ok((account, true))
    }

    async fn create_or_merge(
        &self,
        email: &str,
        claims: &FederatedClaims,
    ) -> AuthErrorResult<(Account, bool)> {
        let username = claims
            .display_name_or_email_local_part()
            .unwrap_or_else(|| email.to_string());

        let mut account = Account::federated(&username, email);
        account.refresh_token = claims.refresh_token.clone();

        match self.accounts.create(&account).await {
            Ok(()) => {
                info!("Created federated account {}", account.id);
                Ok((account, true))
            }
            Err(DbError::DuplicateEmail { .. }) => {
                // Lost a race with a concurrent first login for the same email
                warn!("Concurrent account creation detected, merging into existing account");
                let existing = self
                    .accounts
                    .find_by_email(email)
                    .await
                    .map_err(Self::failed)?
                    .ok_or_else(|| {
                        Self::failed(DbError::Initialization {
                            message: "account vanished after duplicate email".to_string(),
                            location: ErrorLocation::from(Location::caller()),
                        })
                    })?;

                self.merge_existing(existing, claims).await
            }
            Err(e) => Err(Self::failed(e)),
        }
    }

    /// The asserted display name, if the account should take it.
    ///
    /// Email-shaped names are never adopted. An account with a local
    /// credential keeps its username when another credentialed account
    /// already signs in with the asserted name.
    async fn adoptable_name<'c>(
        &self,
        account: &Account,
        claims: &'c FederatedClaims,
    ) -> AuthErrorResult<Option<&'c str>> {
        let Some(name) = claims.display_name() else {
            return Ok(None);
        };

        if name == account.username {
            return Ok(None);
        }

        if !Account::is_usable_username(name) {
            debug!("Ignoring email-shaped display name for account {}", account.id);
            return Ok(None);
        }

        if account.has_local_credential()
            && let Some(holder) = self
                .accounts
                .find_by_username(name)
                .await
                .map_err(Self::failed)?
            && holder.id != account.id
            && holder.has_local_credential()
        {
            warn!(
                "Display name is the login of account {}, keeping username of account {}",
                holder.id, account.id
            );
            return Ok(None);
        }

        Ok(Some(name))
    }

    /// Returns true if anything changed
    fn apply_claims(account: &mut Account, name: Option<&str>, claims: &FederatedClaims) -> bool {
        let mut changed = false;

        if let Some(name) = name {
            account.username = name.to_string();
            changed = true;
        }

        if !account.federation_authorized {
            account.federation_authorized = true;
            changed = true;
        }

        if let Some(refresh_token) = claims.refresh_token.as_deref()
            && !refresh_token.is_empty()
            && account.refresh_token.as_deref() != Some(refresh_token)
        {
            account.refresh_token = Some(refresh_token.to_string());
            changed = true;
        }

        changed
    }

    #[track_caller]
    fn failed(source: DbError) -> AuthError {
        AuthError::ReconciliationFailed {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
