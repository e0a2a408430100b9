//! Turns a completed login into a principal and, when asked for, a
//! remember-me grant.
//!
//! ```text
//! Start -> ResolvingIdentity -> IdentityResolved -> ComputingEffectiveUsername
//!       -> IssuingToken (optional) -> Complete
//! ```
//!
//! Identity failures abort the login. Token issuance failures only mean the
//! login completes without a grant.

use crate::{
    AccountStore, AdminDesignation, AuthError, IdentityReconciler, PersistentLoginStore,
    Principal, RememberMeCookie, RememberMeSettings, Result as AuthErrorResult, TokenCodec,
};

use fh_core::{Account, FederatedClaims, PersistentLoginToken, series_hint};
use fh_db::DbError;

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use chrono::Utc;
use error_location::ErrorLocation;
use log::{debug, info, warn};

/// Fresh material is tried once more after a series collision
const MAX_ISSUE_ATTEMPTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    Start,
    ResolvingIdentity,
    IdentityResolved,
    ComputingEffectiveUsername,
    IssuingToken,
    Complete,
}

impl fmt::Display for LoginStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::ResolvingIdentity => "RESOLVING_IDENTITY",
            Self::IdentityResolved => "IDENTITY_RESOLVED",
            Self::ComputingEffectiveUsername => "COMPUTING_EFFECTIVE_USERNAME",
            Self::IssuingToken => "ISSUING_TOKEN",
            Self::Complete => "COMPLETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum CompletedLogin {
    /// Password already verified; `login` is a username or email
    Local { login: String },
    Federated(FederatedClaims),
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub completed: CompletedLogin,
    pub remember_me: bool,
    pub origin_ip: Option<String>,
}

impl LoginRequest {
    pub fn local(login: &str) -> Self {
        Self {
            completed: CompletedLogin::Local {
                login: login.to_string(),
            },
            remember_me: false,
            origin_ip: None,
        }
    }

    pub fn federated(claims: FederatedClaims) -> Self {
        Self {
            completed: CompletedLogin::Federated(claims),
            remember_me: false,
            origin_ip: None,
        }
    }

    pub fn with_remember_me(mut self) -> Self {
        self.remember_me = true;
        self
    }

    pub fn with_origin_ip(mut self, ip: &str) -> Self {
        self.origin_ip = Some(ip.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub principal: Principal,
    /// Present only when a grant was minted
    pub remember_me: Option<RememberMeCookie>,
}

pub struct AuthenticationOutcomeResolver {
    accounts: Arc<dyn AccountStore>,
    tokens: Arc<dyn PersistentLoginStore>,
    reconciler: IdentityReconciler,
    codec: TokenCodec,
    admin: AdminDesignation,
    settings: RememberMeSettings,
}

impl AuthenticationOutcomeResolver {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        tokens: Arc<dyn PersistentLoginStore>,
        codec: TokenCodec,
        admin: AdminDesignation,
        settings: RememberMeSettings,
    ) -> Self {
        Self {
            reconciler: IdentityReconciler::new(Arc::clone(&accounts), admin.clone()),
            accounts,
            tokens,
            codec,
            admin,
            settings,
        }
    }

    pub async fn resolve(&self, request: LoginRequest) -> AuthErrorResult<LoginOutcome> {
        Self::enter(LoginStage::Start);

        Self::enter(LoginStage::ResolvingIdentity);
        let (account, federated) = match &request.completed {
            CompletedLogin::Local { login } => (self.load_local(login).await?, false),
            CompletedLogin::Federated(claims) => {
                (self.reconciler.reconcile(claims).await?.account, true)
            }
        };

        if !account.enabled {
            warn!("Login refused for disabled account {}", account.id);
            return Err(AuthError::AccountDisabled {
                identity: account.username.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Self::enter(LoginStage::IdentityResolved);

        Self::enter(LoginStage::ComputingEffectiveUsername);
        let principal = Principal::for_account(&account, &self.admin);

        let remember_me = if self.should_issue(&request, federated) {
            Self::enter(LoginStage::IssuingToken);
            match self
                .issue_token(&principal.effective_username, request.origin_ip.as_deref())
                .await
            {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    warn!("Login for {} continues without remember-me: {e}", account.id);
                    None
                }
            }
        } else {
            None
        };

        Self::enter(LoginStage::Complete);
        info!(
            "Login complete for account {} (authorities: {}, remember-me: {})",
            account.id,
            principal.authorities,
            remember_me.is_some()
        );

        Ok(LoginOutcome {
            principal,
            remember_me,
        })
    }

    fn enter(stage: LoginStage) {
        debug!("Login stage: {stage}");
    }

    async fn load_local(&self, login: &str) -> AuthErrorResult<Account> {
        self.accounts
            .find_by_login(login)
            .await?
            .ok_or_else(|| AuthError::AccountNotFound {
                identity: login.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn should_issue(&self, request: &LoginRequest, federated: bool) -> bool {
        request.remember_me && self.settings.enabled && (federated || self.settings.local_logins)
    }

    /// Mint a grant for `owner` and return the cookie carrying it
    pub async fn issue_token(
        &self,
        owner: &str,
        origin_ip: Option<&str>,
    ) -> AuthErrorResult<RememberMeCookie> {
        let mut attempt = 1;

        let token = loop {
            let token = PersistentLoginToken::new(
                owner,
                self.codec.generate_random_token(),
                self.codec.generate_random_token(),
                Utc::now(),
            );

            match self.tokens.create(&token).await {
                Ok(_) => break token,
                Err(DbError::DuplicateSeries { .. }) if attempt < MAX_ISSUE_ATTEMPTS => {
                    warn!(
                        "Series collision on {}..., retrying with fresh material",
                        token.series_hint()
                    );
                    attempt += 1;
                }
                Err(e) => {
                    return Err(AuthError::TokenIssuanceFailed {
                        message: format!("attempt {attempt}: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        };

        if let Some(ip) = origin_ip {
            self.capture_origin_ip(&token.series, ip).await;
        }

        debug!("Issued remember-me grant {}...", token.series_hint());

        Ok(RememberMeCookie::issue(
            &self.settings,
            TokenCodec::encode_cookie(&token.series, &token.token_value),
        ))
    }

    async fn capture_origin_ip(&self, series: &str, ip: &str) {
        if let Err(e) = self.tokens.update_origin_ip(series, ip).await {
            warn!("Could not record origin IP for {}...: {e}", series_hint(series));
        }
    }
}
