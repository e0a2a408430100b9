use crate::FederatedClaims;

use googletest::prelude::*;

#[test]
fn given_blank_email_when_read_then_none() {
    let claims = FederatedClaims::new("sub-1", Some("   "), Some("Name"));

    assert_that!(claims.email(), none());
}

#[test]
fn given_no_name_when_display_name_derived_then_email_local_part() {
    let claims = FederatedClaims::new("sub-1", Some("jane.doe@example.com"), None);

    assert_eq!(
        claims.display_name_or_email_local_part().as_deref(),
        Some("jane.doe")
    );
}

#[test]
fn given_name_when_display_name_derived_then_name_is_trimmed() {
    let claims = FederatedClaims::new("sub-1", Some("jane@example.com"), Some("  Jane  "));

    assert_eq!(
        claims.display_name_or_email_local_part().as_deref(),
        Some("Jane")
    );
}

#[test]
fn given_email_shaped_name_when_display_name_derived_then_email_local_part() {
    let claims = FederatedClaims::new("sub-1", Some("jane@example.com"), Some("other@example.com"));

    assert_eq!(
        claims.display_name_or_email_local_part().as_deref(),
        Some("jane")
    );
}
