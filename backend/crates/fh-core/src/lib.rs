pub mod error;
pub mod models;

pub use error::{CoreError, Result};
pub use models::account::Account;
pub use models::federated_claims::FederatedClaims;
pub use models::persistent_login_token::{PersistentLoginToken, series_hint};
pub use models::role::Role;
pub use models::role_set::RoleSet;

#[cfg(test)]
mod tests;
