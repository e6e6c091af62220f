//! Admin session: two bearer tokens persisted in a `TokenStore`, checked once
//! per application start and refreshed when the access token has expired.

pub mod claims;
pub mod store;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::Result;
use crate::models::TokenPair;
use store::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// `check_session` has not finished yet
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Session context, constructed once and handed to whatever needs it.
///
/// Both tokens are always written or removed together, so the store never
/// holds exactly one of them after a session operation.
pub struct Session {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    state: AuthState,
}

impl Session {
    /// `client` must share `store`, so requests carry the session's access token
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        Self {
            client,
            store,
            state: AuthState::Loading,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state == AuthState::Loading
    }

    /// Exchange credentials for tokens. On failure the error is returned as-is
    /// and any previous session is left untouched.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<TokenPair> {
        let tokens = self.client.login(username, password).await?;

        self.store.set(&[
            (ACCESS_TOKEN_KEY, tokens.access.as_str()),
            (REFRESH_TOKEN_KEY, tokens.refresh.as_str()),
        ])?;
        self.state = AuthState::Authenticated;

        info!("Logged in as {}", username);
        Ok(tokens)
    }

    pub async fn check_session(&mut self) -> AuthState {
        self.check_session_at(Utc::now()).await
    }

    /// Validate stored tokens against `now`, refreshing once if the access
    /// token has expired. Failures end in the logged-out state.
    pub async fn check_session_at(&mut self, now: DateTime<Utc>) -> AuthState {
        let access = self.store.get(ACCESS_TOKEN_KEY);
        let refresh = self.store.get(REFRESH_TOKEN_KEY);

        let (access, refresh) = match (access, refresh) {
            (Some(access), Some(refresh)) => (access, refresh),
            (None, None) => {
                debug!("No stored session");
                self.state = AuthState::Unauthenticated;
                return self.state;
            }
            _ => {
                warn!("Stored session is missing a token, clearing it");
                self.clear();
                return self.state;
            }
        };

        match claims::is_expired(&access, now) {
            Ok(false) => {
                debug!("Access token still valid");
                self.state = AuthState::Authenticated;
            }
            Ok(true) => {
                info!("Access token expired, refreshing");
                if let Err(e) = self.refresh(&refresh).await {
                    warn!("Session refresh failed: {}", e);
                    self.clear();
                }
            }
            Err(e) => {
                warn!("Could not read access token: {}", e);
                self.clear();
            }
        }

        self.state
    }

    async fn refresh(&mut self, refresh: &str) -> Result<()> {
        let renewed = self.client.refresh_token(refresh).await?;
        let next_refresh = renewed.refresh.as_deref().unwrap_or(refresh);

        self.store.set(&[
            (ACCESS_TOKEN_KEY, renewed.access.as_str()),
            (REFRESH_TOKEN_KEY, next_refresh),
        ])?;
        self.state = AuthState::Authenticated;
        Ok(())
    }

    /// Drop both tokens; no network call
    pub fn logout(&mut self) {
        info!("Logging out");
        self.clear();
    }

    fn clear(&mut self) {
        if let Err(e) = self.store.remove(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY]) {
            warn!("Failed to clear stored tokens: {}", e);
        }
        self.state = AuthState::Unauthenticated;
    }
}
