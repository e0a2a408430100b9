use crate::Role;

use std::str::FromStr;

#[test]
fn test_role_as_str() {
    assert_eq!(Role::User.as_str(), "USER");
    assert_eq!(Role::Admin.as_str(), "ADMIN");
}

#[test]
fn test_role_authority_has_prefix() {
    assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
}

#[test]
fn test_role_from_str_accepts_prefixed_and_lowercase() {
    assert_eq!(Role::from_str("USER").unwrap(), Role::User);
    assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
    assert_eq!(Role::from_str("ROLE_ADMIN").unwrap(), Role::Admin);
    assert!(Role::from_str("superuser").is_err());
}
