pub mod account;
pub mod federated_claims;
pub mod persistent_login_token;
pub mod role;
pub mod role_set;
