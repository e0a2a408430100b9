use crate::{RememberMeCookie, RememberMeSettings, SameSite};

use std::str::FromStr;

use googletest::prelude::*;

#[test]
fn given_default_settings_when_issuing_then_cookie_matches_fixed_shape() {
    let cookie = RememberMeCookie::issue(&RememberMeSettings::default(), "dmFsdWU=".to_string());

    assert_that!(
        cookie.to_string(),
        eq("food-history-remember-me=dmFsdWU=; Max-Age=2592000; Path=/; HttpOnly; SameSite=Lax")
    );
}

#[test]
fn given_secure_strict_settings_when_issuing_then_attributes_rendered() {
    let settings = RememberMeSettings {
        secure: true,
        same_site: SameSite::Strict,
        ..RememberMeSettings::default()
    };

    let rendered = RememberMeCookie::issue(&settings, "v".to_string()).to_string();

    assert_that!(rendered, contains_substring("SameSite=Strict"));
    assert_that!(rendered, contains_substring("; Secure"));
}

#[test]
fn given_settings_when_clearing_then_empty_value_and_zero_max_age() {
    let cookie = RememberMeCookie::clearing(&RememberMeSettings::default());

    assert_that!(cookie.is_clearing(), eq(true));
    assert_eq!(cookie.value(), "");
    assert_that!(cookie.to_string(), contains_substring("Max-Age=0"));
}

#[test]
fn given_cookie_when_converted_to_header_value_then_ok() {
    let cookie = RememberMeCookie::issue(&RememberMeSettings::default(), "YWJjOmRlZg==".to_string());

    assert_that!(cookie.to_header_value(), ok(anything()));
}

#[test]
fn given_cookie_value_with_newline_when_converted_to_header_value_then_validation_error() {
    let cookie = RememberMeCookie::issue(&RememberMeSettings::default(), "bad\nvalue".to_string());

    assert_that!(cookie.to_header_value(), err(anything()));
}

#[test]
fn given_cookie_when_debug_formatted_then_value_redacted() {
    let cookie = RememberMeCookie::issue(&RememberMeSettings::default(), "secret-value".to_string());

    let debug = format!("{cookie:?}");

    assert!(!debug.contains("secret-value"));
    assert_that!(debug, contains_substring("<redacted>"));
}

#[test]
fn given_same_site_names_when_parsed_then_case_insensitive() {
    assert_eq!(SameSite::from_str("STRICT").ok(), Some(SameSite::Strict));
    assert_eq!(SameSite::from_str("lax").ok(), Some(SameSite::Lax));
    assert_eq!(SameSite::from_str("None").ok(), Some(SameSite::None));
    assert_that!(SameSite::from_str("sometimes"), err(anything()));
}
