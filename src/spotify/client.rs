//! The authenticated-request / token-lifecycle client.
//!
//! [`SpotifyAuthClient`] owns the whole session:
//!
//! ```text
//! UNAUTHENTICATED --begin_authorization()--> AUTHORIZING
//! AUTHORIZING --complete_authorization(ok)--> AUTHENTICATED
//! AUTHORIZING --complete_authorization(err)--> UNAUTHENTICATED
//! AUTHENTICATED --request() + refresh ok--> AUTHENTICATED
//! AUTHENTICATED --refresh failure or 401--> UNAUTHENTICATED
//! AUTHENTICATED --logout()--> UNAUTHENTICATED
//! ```
//!
//! Expiry is detected lazily on the next [`SpotifyAuthClient::request`].
//! Refreshes go through a single gate so concurrent requests that all see an
//! expired token trigger one refresh, not one each.

use reqwest::{Client, Method, Url, header::HeaderMap};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::{Error, Result},
    management::{StoreKey, TokenStore},
    spotify::{
        auth,
        request::{self, Failure, RequestOptions},
    },
    types::{AuthStatus, AuthorizationRequest, CallbackParams, SessionState, TokenResponse},
    utils,
};

pub struct SpotifyAuthClient<S> {
    config: Config,
    http: Client,
    store: S,
    refresh_gate: Mutex<()>,
}

impl<S: TokenStore> SpotifyAuthClient<S> {
    pub fn new(config: Config, store: S) -> Self {
        Self::with_http_client(config, store, Client::new())
    }

    pub fn with_http_client(config: Config, store: S, http: Client) -> Self {
        Self {
            config,
            http,
            store,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts an authorization round-trip.
    ///
    /// Persists a fresh `state` nonce and PKCE verifier and returns the
    /// authorization URL the user agent has to open. Any previous pending
    /// round-trip is superseded.
    pub async fn begin_authorization(&self) -> Result<AuthorizationRequest> {
        let state = utils::generate_state();
        let pkce = utils::generate_pkce();

        self.store
            .set_many(vec![
                (StoreKey::AuthState, state.clone()),
                (StoreKey::CodeVerifier, pkce.verifier),
            ])
            .await?;

        let scope = self.config.scope();
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("scope", scope.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("state", state.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", pkce.challenge.as_str()),
                ("show_dialog", "true"),
            ],
        )
        .map_err(|e| Error::Configuration(format!("invalid authorization URL: {e}")))?;

        debug!("authorization round-trip started");
        Ok(AuthorizationRequest {
            url: url.into(),
            state,
        })
    }

    /// Finishes the round-trip started by [`Self::begin_authorization`].
    ///
    /// The stored `state` and verifier are consumed before anything else
    /// happens, so they are gone whatever the outcome.
    pub async fn complete_authorization(
        &self,
        code: &str,
        returned_state: &str,
    ) -> Result<TokenResponse> {
        let stored_state = self.store.get(StoreKey::AuthState).await;
        let verifier = self.store.get(StoreKey::CodeVerifier).await;
        self.cancel_authorization().await?;

        let verifier = verifier.ok_or(Error::MissingVerifier)?;
        if stored_state.as_deref() != Some(returned_state) {
            return Err(Error::StateMismatch);
        }
        if code.is_empty() {
            return Err(Error::MissingCode);
        }

        let token = auth::exchange_code(&self.http, &self.config, code, &verifier).await?;
        self.store_tokens(&token).await?;
        debug!("authorization completed");
        Ok(token)
    }

    /// Handles the raw query of the redirect back from Spotify.
    ///
    /// A provider `error` (e.g. the user pressed cancel) still consumes the
    /// pending round-trip.
    pub async fn handle_callback(&self, params: &CallbackParams) -> Result<TokenResponse> {
        if let Some(error) = &params.error {
            self.cancel_authorization().await?;
            return Err(Error::AuthorizationDenied(error.clone()));
        }

        self.complete_authorization(
            params.code.as_deref().unwrap_or_default(),
            params.state.as_deref().unwrap_or_default(),
        )
        .await
    }

    /// Drops a pending round-trip without touching the session tokens.
    pub async fn cancel_authorization(&self) -> Result<()> {
        self.store
            .delete_many(&[StoreKey::AuthState, StoreKey::CodeVerifier])
            .await
    }

    /// True iff a non-empty access token is stored and has not expired.
    /// Never touches the network.
    pub async fn is_authenticated(&self) -> bool {
        let token = self.store.get(StoreKey::AccessToken).await;
        let expiry = self.token_expiry().await;
        match (token, expiry) {
            (Some(token), Some(expiry)) => !token.is_empty() && utils::now_millis() < expiry,
            _ => false,
        }
    }

    /// Mints a new access token from the stored refresh token.
    pub async fn refresh(&self) -> Result<TokenResponse> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Calls the resource API at `endpoint` (e.g. `/me/top/tracks?limit=10`).
    ///
    /// Refreshes the access token first when it is missing or expired. A
    /// failed refresh or a 401 ends the session.
    ///
    /// The `timeout` and `cancel` options cover the whole call, including a
    /// refresh it triggers. When either fires first, the pending HTTP exchange
    /// is dropped and nothing it would have written reaches the store.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        let RequestOptions {
            method,
            headers,
            query,
            body,
            timeout,
            cancel,
        } = options;

        let call = self.authorized_call(endpoint, method, headers, query, body);
        let bounded = async {
            match timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .map_err(|_| Error::Timeout)?,
                None => call.await,
            }
        };

        match cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled),
                outcome = bounded => outcome,
            },
            None => bounded.await,
        }
    }

    /// Refresh if needed, send, classify. A 401 clears the session.
    async fn authorized_call(
        &self,
        endpoint: &str,
        method: Method,
        headers: HeaderMap,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<Value> {
        let token = self.ensure_access_token().await?;

        let url = format!("{}{}", self.config.api_url, endpoint);
        debug!(%method, endpoint, "dispatching request");

        let mut builder = self.http.request(method, &url).bearer_auth(&token);
        if let Some(body) = &body {
            builder = builder.json(body);
        }
        builder = builder.headers(headers);
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        let response = builder.send().await.map_err(Error::from_transport)?;
        match request::classify(response).await {
            Ok(json) => Ok(json),
            Err(Failure::Unauthorized(err)) => {
                warn!(endpoint, "access token rejected, clearing session");
                self.store.delete_many(&StoreKey::ALL).await?;
                Err(err)
            }
            Err(Failure::Other(err)) => Err(err),
        }
    }

    /// Shorthand for a plain `GET`.
    pub async fn get(&self, endpoint: &str) -> Result<Value> {
        self.request(endpoint, RequestOptions::default()).await
    }

    /// Forgets everything. Safe to call on an empty store.
    pub async fn logout(&self) -> Result<()> {
        self.store.delete_many(&StoreKey::ALL).await?;
        debug!("session cleared");
        Ok(())
    }

    pub async fn session_state(&self) -> SessionState {
        if self.store.get(StoreKey::CodeVerifier).await.is_some() {
            SessionState::Authorizing
        } else if self
            .store
            .get(StoreKey::AccessToken)
            .await
            .is_some_and(|t| !t.is_empty())
        {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    pub async fn status(&self) -> AuthStatus {
        AuthStatus {
            state: self.session_state().await,
            authenticated: self.is_authenticated().await,
            expires_at: self
                .token_expiry()
                .await
                .and_then(utils::millis_to_datetime),
            has_refresh_token: self
                .store
                .get(StoreKey::RefreshToken)
                .await
                .is_some_and(|t| !t.is_empty()),
        }
    }

    async fn token_expiry(&self) -> Option<i64> {
        self.store.get(StoreKey::TokenExpiry).await?.parse().ok()
    }

    /// Returns a usable access token, refreshing first if needed.
    ///
    /// The refresh completes (or fails) before this returns. Transport
    /// failures during the refresh leave the stored tokens alone.
    async fn ensure_access_token(&self) -> Result<String> {
        if !self.is_authenticated().await {
            let _gate = self.refresh_gate.lock().await;
            // another caller may have refreshed while we waited
            if !self.is_authenticated().await {
                match self.refresh_locked().await {
                    Ok(_) => {}
                    Err(err @ (Error::NoRefreshToken | Error::TokenRefresh { .. })) => {
                        warn!(error = %err, "refresh failed, clearing session");
                        self.store.delete_many(&StoreKey::TOKENS).await?;
                        return Err(Error::AuthenticationFailed(err.to_string()));
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        self.store
            .get(StoreKey::AccessToken)
            .await
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::AuthenticationFailed("no access token stored".to_string()))
    }

    /// Caller must hold `refresh_gate`.
    async fn refresh_locked(&self) -> Result<TokenResponse> {
        let refresh = self
            .store
            .get(StoreKey::RefreshToken)
            .await
            .filter(|t| !t.is_empty())
            .ok_or(Error::NoRefreshToken)?;

        debug!("refreshing access token");
        let token = auth::refresh_token(&self.http, &self.config, &refresh).await?;
        self.store_tokens(&token).await?;
        Ok(token)
    }

    async fn store_tokens(&self, token: &TokenResponse) -> Result<()> {
        let lifetime_ms = i64::try_from(token.expires_in)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        let expiry = utils::now_millis().saturating_add(lifetime_ms);

        let mut entries = vec![
            (StoreKey::AccessToken, token.access_token.clone()),
            (StoreKey::TokenExpiry, expiry.to_string()),
        ];
        // rotation is optional, keep the old refresh token otherwise
        if let Some(refresh) = &token.refresh_token {
            entries.push((StoreKey::RefreshToken, refresh.clone()));
        }
        self.store.set_many(entries).await
    }
}
