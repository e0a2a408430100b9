mod account;
mod federated_claims;
mod role;
mod role_set;
