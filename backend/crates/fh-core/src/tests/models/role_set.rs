use crate::{Role, RoleSet};

use std::str::FromStr;

use googletest::prelude::*;

#[test]
fn given_db_string_with_both_roles_when_parsed_then_contains_both() {
    let roles = RoleSet::from_str("USER,ADMIN").unwrap();

    assert_that!(roles.contains(Role::User), eq(true));
    assert_that!(roles.is_admin(), eq(true));
    assert_that!(roles.len(), eq(2));
}

#[test]
fn given_empty_db_string_when_parsed_then_defaults_to_user() {
    let roles = RoleSet::from_str("").unwrap();

    assert_eq!(roles, RoleSet::user());
}

#[test]
fn given_unknown_role_when_parsed_then_error() {
    assert_that!(RoleSet::from_str("USER,ROOT"), err(anything()));
}

#[test]
fn given_role_set_when_serialized_then_order_is_stable() {
    let roles: RoleSet = [Role::Admin, Role::User, Role::Admin].into_iter().collect();

    assert_that!(roles.to_db_string(), eq("USER,ADMIN"));
    assert_eq!(roles.authorities(), vec!["ROLE_USER", "ROLE_ADMIN"]);
}

#[test]
fn given_user_set_when_with_admin_then_original_unchanged() {
    let roles = RoleSet::user();

    let elevated = roles.with(Role::Admin);

    assert_that!(roles.is_admin(), eq(false));
    assert_that!(elevated.is_admin(), eq(true));
}
