mod common;

use common::{ADMIN_EMAIL, account_count, create_services, grant_count};

use fh_auth::{LoginRequest, RememberMeSettings, TokenCodec};
use fh_core::{FederatedClaims, Role};

use googletest::prelude::*;

fn claims(email: &str, name: &str) -> FederatedClaims {
    FederatedClaims::new("provider-subject", Some(email), Some(name))
}

#[tokio::test]
async fn given_federated_login_with_remember_me_when_cookie_presented_then_session_restored() {
    // Given: A first federated login opting into remember-me
    let services = create_services(RememberMeSettings::default()).await;
    let outcome = services
        .resolver
        .resolve(
            LoginRequest::federated(claims("pat@example.com", "Pat"))
                .with_remember_me()
                .with_origin_ip("203.0.113.9"),
        )
        .await
        .unwrap();
    let cookie = outcome.remember_me.expect("grant issued");

    // When: The browser later presents the cookie
    let restored = services
        .remember_me
        .restore(cookie.value(), Some("203.0.113.9"))
        .await;

    // Then: The same account is restored
    let restored = restored.expect("session restored");
    assert_that!(restored.account_id, eq(outcome.principal.account_id));
    assert_that!(restored.effective_username, eq("pat@example.com"));

    let (series, _) = TokenCodec::decode_cookie(cookie.value()).unwrap();
    let stored = services.tokens.find_by_series(&series).await.unwrap().unwrap();
    assert_eq!(stored.origin_ip.as_deref(), Some("203.0.113.9"));
    assert_that!(stored.id, some(anything()));
}

#[tokio::test]
async fn given_registered_local_account_when_federated_login_with_same_email_then_merged() {
    // Given: A local account that has an email on file
    let services = create_services(RememberMeSettings::default()).await;
    let mut local = services
        .registrar
        .register("local", "password1", "password1")
        .await
        .unwrap();
    local.email = Some("a@x.com".to_string());
    services.accounts.update(&local).await.unwrap();

    // When: A federated login for that email arrives
    services
        .resolver
        .resolve(LoginRequest::federated(claims("a@x.com", "Remote Name")))
        .await
        .unwrap();

    // Then: One account, renamed, still holding its password
    assert_that!(account_count(&services.pool).await, eq(1));
    let merged = services.accounts.find_by_id(local.id).await.unwrap().unwrap();
    assert_that!(merged.username, eq("Remote Name"));
    assert_eq!(merged.credential_hash, local.credential_hash);
    assert_that!(merged.federation_authorized, eq(true));
}

#[tokio::test]
async fn given_stolen_cookie_with_wrong_token_when_presented_then_all_grants_revoked() {
    let services = create_services(RememberMeSettings::default()).await;
    let outcome = services
        .resolver
        .resolve(LoginRequest::federated(claims("vic@example.com", "Vic")).with_remember_me())
        .await
        .unwrap();
    let (series, _) = TokenCodec::decode_cookie(outcome.remember_me.unwrap().value()).unwrap();

    let forged = TokenCodec::encode_cookie(&series, "forged-token");
    let restored = services.remember_me.restore(&forged, None).await;

    assert_that!(restored, none());
    assert_that!(grant_count(&services.pool, "vic@example.com").await, eq(0));
}

#[tokio::test]
async fn given_logged_in_user_when_logging_out_then_grants_removed() {
    let services = create_services(RememberMeSettings::default()).await;
    let outcome = services
        .resolver
        .resolve(LoginRequest::federated(claims("lou@example.com", "Lou")).with_remember_me())
        .await
        .unwrap();
    let cookie = outcome.remember_me.unwrap();

    let clearing = services.remember_me.logout(Some(cookie.value())).await;

    assert_that!(clearing.is_clearing(), eq(true));
    assert_that!(services.remember_me.restore(cookie.value(), None).await, none());
}

#[tokio::test]
async fn given_admin_email_when_logging_in_then_admin_authority_not_persisted() {
    let services = create_services(RememberMeSettings::default()).await;

    let outcome = services
        .resolver
        .resolve(LoginRequest::federated(claims(ADMIN_EMAIL, "Admin")))
        .await
        .unwrap();

    assert_that!(outcome.principal.authorities.contains(Role::Admin), eq(true));
    let stored = services
        .accounts
        .find_by_id(outcome.principal.account_id)
        .await
        .unwrap()
        .unwrap();
    assert_that!(stored.roles.is_admin(), eq(false));
}

#[tokio::test]
async fn given_same_federated_login_twice_then_single_account() {
    let services = create_services(RememberMeSettings::default()).await;

    services
        .resolver
        .resolve(LoginRequest::federated(claims("twice@example.com", "Twice")))
        .await
        .unwrap();
    services
        .resolver
        .resolve(LoginRequest::federated(claims("TWICE@example.com", "Twice")))
        .await
        .unwrap();

    assert_that!(account_count(&services.pool).await, eq(1));
}

#[tokio::test]
async fn given_federated_grant_when_someone_registers_the_email_as_username_then_cookie_still_restores_owner() {
    // Given: A federation-only account holding a remember-me grant
    let services = create_services(RememberMeSettings::default()).await;
    let outcome = services
        .resolver
        .resolve(LoginRequest::federated(claims("victim@x.com", "Victim")).with_remember_me())
        .await
        .unwrap();
    let cookie = outcome.remember_me.expect("grant issued");

    // When: Another user tries to register the victim's email as a username
    let registered = services
        .registrar
        .register("victim@x.com", "password1", "password1")
        .await;

    // Then: Registration is refused and the cookie restores the victim
    assert_that!(registered, err(anything()));
    let restored = services.remember_me.restore(cookie.value(), None).await;
    assert_that!(
        restored.map(|principal| principal.account_id),
        some(eq(outcome.principal.account_id))
    );
    assert_that!(grant_count(&services.pool, "victim@x.com").await, eq(1));
}
