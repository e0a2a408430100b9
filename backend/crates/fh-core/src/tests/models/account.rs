use crate::Account;

use googletest::prelude::*;

#[test]
fn given_federation_only_account_when_effective_username_then_email() {
    let account = Account::federated("Remote Name", "a@x.com");

    assert_eq!(account.effective_username(), "a@x.com");
}

#[test]
fn given_account_with_password_and_email_when_effective_username_then_username() {
    let mut account = Account::local("localuser", "$argon2id$hash".to_string());
    account.email = Some("local@example.com".to_string());

    assert_eq!(account.effective_username(), "localuser");
}

#[test]
fn given_empty_credential_hash_when_checked_then_treated_as_no_credential() {
    let mut account = Account::federated("Someone", "someone@example.com");
    account.credential_hash = Some(String::new());

    assert_that!(account.has_local_credential(), eq(false));
    assert_eq!(account.effective_username(), "someone@example.com");
}

#[test]
fn given_local_account_without_email_when_effective_username_then_username() {
    let account = Account::local("plain", "$argon2id$hash".to_string());

    assert_eq!(account.effective_username(), "plain");
}

#[test]
fn given_blank_username_when_validated_then_error() {
    assert_that!(Account::validate_username("   "), err(anything()));
}

#[test]
fn given_overlong_username_when_validated_then_error() {
    let username = "a".repeat(51);

    assert_that!(Account::validate_username(&username), err(anything()));
}

#[test]
fn given_reasonable_username_when_validated_then_ok() {
    assert_that!(Account::validate_username("Angus"), ok(anything()));
}

#[test]
fn given_email_shaped_username_when_validated_then_error() {
    let result = Account::validate_username("victim@x.com");

    assert_that!(result, err(displays_as(contains_substring("'@'"))));
}
