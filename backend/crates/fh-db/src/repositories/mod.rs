pub mod account_repository;
pub mod persistent_login_repository;
