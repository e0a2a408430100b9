pub mod administration;
pub mod authentication_outcome_resolver;
pub mod error;
pub mod identity_reconciler;
pub mod password;
pub mod password_authenticator;
pub mod principal;
pub mod registration;
pub mod remember_me_cookie;
pub mod remember_me_service;
pub mod store;
pub mod token_codec;

pub use administration::AccountAdministration;
pub use authentication_outcome_resolver::{
    AuthenticationOutcomeResolver, CompletedLogin, LoginOutcome, LoginRequest, LoginStage,
};
pub use error::{AuthError, Result};
pub use identity_reconciler::{AdminDesignation, IdentityReconciler, ReconciledIdentity};
pub use password::{MIN_PASSWORD_LENGTH, hash_password, validate_password_policy, verify_password};
pub use password_authenticator::PasswordAuthenticator;
pub use principal::Principal;
pub use registration::AccountRegistrar;
pub use remember_me_cookie::{
    DEFAULT_COOKIE_NAME, DEFAULT_MAX_AGE_SECS, RememberMeCookie, RememberMeSettings, SameSite,
};
pub use remember_me_service::RememberMeService;
pub use store::{AccountStore, PersistentLoginStore};
pub use token_codec::{TOKEN_LENGTH, TokenCodec};

#[cfg(test)]
mod tests;
