//! Restoring a session from a remember-me cookie, and revoking grants on
//! logout. Nothing here fails the request: an unusable cookie is simply
//! treated as absent.

use crate::{
    AccountStore, AdminDesignation, PersistentLoginStore, Principal, RememberMeCookie,
    RememberMeSettings, TokenCodec,
};

use fh_core::{PersistentLoginToken, series_hint};

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use subtle::ConstantTimeEq;

pub struct RememberMeService {
    accounts: Arc<dyn AccountStore>,
    tokens: Arc<dyn PersistentLoginStore>,
    admin: AdminDesignation,
    settings: RememberMeSettings,
}

impl RememberMeService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        tokens: Arc<dyn PersistentLoginStore>,
        admin: AdminDesignation,
        settings: RememberMeSettings,
    ) -> Self {
        Self {
            accounts,
            tokens,
            admin,
            settings,
        }
    }

    pub fn settings(&self) -> &RememberMeSettings {
        &self.settings
    }

    /// Principal for a valid cookie, `None` for anything else.
    ///
    /// A known series presented with the wrong token means the cookie was
    /// copied: every grant of that owner is revoked.
    pub async fn restore(&self, raw_cookie: &str, origin_ip: Option<&str>) -> Option<Principal> {
        if !self.settings.enabled {
            return None;
        }

        let (series, presented) = match TokenCodec::decode_cookie(raw_cookie) {
            Ok(parts) => parts,
            Err(e) => {
                debug!("Ignoring remember-me cookie: {e}");
                return None;
            }
        };

        let token = match self.tokens.find_by_series(&series).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("Unknown remember-me series {}...", series_hint(&series));
                return None;
            }
            Err(e) => {
                error!("Remember-me lookup failed: {e}");
                return None;
            }
        };

        if !Self::token_matches(&token, &presented) {
            warn!(
                "Remember-me token mismatch for series {}..., revoking all grants of its owner",
                token.series_hint()
            );
            self.revoke_owner(&token.owner).await;
            return None;
        }

        if self.is_expired(&token) {
            info!("Remember-me grant {}... has expired", token.series_hint());
            return None;
        }

        let account = match self.accounts.find_by_owner(&token.owner).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!("Remember-me grant {}... has no owner account", token.series_hint());
                return None;
            }
            Err(e) => {
                error!("Remember-me owner lookup failed: {e}");
                return None;
            }
        };

        if !account.enabled {
            info!("Remember-me refused for disabled account {}", account.id);
            return None;
        }

        self.touch(&token, origin_ip).await;

        info!("Session restored from remember-me for account {}", account.id);

        Some(Principal::for_account(&account, &self.admin))
    }

    /// Revoke every grant owned by the cookie's owner and return the cookie
    /// that clears it from the browser. Always succeeds.
    pub async fn logout(&self, raw_cookie: Option<&str>) -> RememberMeCookie {
        if let Some(raw) = raw_cookie
            && let Ok((series, _)) = TokenCodec::decode_cookie(raw)
        {
            match self.tokens.find_by_series(&series).await {
                Ok(Some(token)) => self.revoke_owner(&token.owner).await,
                Ok(None) => debug!("Logout with unknown series {}...", series_hint(&series)),
                Err(e) => error!("Remember-me lookup during logout failed: {e}"),
            }
        }

        RememberMeCookie::clearing(&self.settings)
    }

    fn token_matches(token: &PersistentLoginToken, presented: &str) -> bool {
        token
            .token_value
            .as_bytes()
            .ct_eq(presented.as_bytes())
            .into()
    }

    fn is_expired(&self, token: &PersistentLoginToken) -> bool {
        self.settings
            .expire_after
            .is_some_and(|window| token.last_used + window < Utc::now())
    }

    async fn touch(&self, token: &PersistentLoginToken, origin_ip: Option<&str>) {
        if let Err(e) = self.tokens.update_last_used(&token.series, Utc::now()).await {
            warn!("Could not update last use of {}...: {e}", token.series_hint());
        }

        if let Some(ip) = origin_ip
            && token.origin_ip.as_deref() != Some(ip)
            && let Err(e) = self.tokens.update_origin_ip(&token.series, ip).await
        {
            warn!("Could not record origin IP for {}...: {e}", token.series_hint());
        }
    }

    async fn revoke_owner(&self, owner: &str) {
        match self.tokens.delete_for_owner(owner).await {
            Ok(removed) => info!("Revoked {removed} remember-me grants"),
            Err(e) => error!("Failed to revoke remember-me grants: {e}"),
        }
    }
}
