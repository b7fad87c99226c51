use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response};

use crate::{
    config::Config,
    error::{Error, Result},
    management::TokenStore,
    server::{self, CallbackContext},
    spotify::client::SpotifyAuthClient,
    types::{TokenErrorResponse, TokenResponse},
    warning,
};

/// How long the interactive login waits for the browser to come back.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound for a single call to the token endpoint.
pub const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the interactive Authorization Code + PKCE flow with Spotify.
///
/// This function drives the whole browser round-trip:
/// 1. Binds the local callback server on `server_address`
/// 2. Starts the round-trip (fresh `state` nonce and PKCE verifier)
/// 3. Serves `/callback` and opens the authorization URL in the browser
/// 4. Waits for the callback handler to exchange the code for tokens
///
/// # Arguments
///
/// * `client` - The shared client. The callback server holds a second
///   reference to it, so the tokens end up in the client's store.
///
/// # Returns
///
/// The token response of the successful code exchange. The tokens are
/// already persisted when this returns.
///
/// # Errors
///
/// - [`Error::Configuration`] if the callback address cannot be bound
/// - [`Error::Storage`] if the round-trip cannot be persisted
/// - [`Error::Timeout`] if no callback arrives within [`LOGIN_TIMEOUT`];
///   the pending round-trip is discarded
/// - Any error of [`SpotifyAuthClient::handle_callback`], such as
///   [`Error::StateMismatch`], [`Error::AuthorizationDenied`] or
///   [`Error::TokenExchange`]
///
/// # User Experience
///
/// The browser may fail to open (headless machines). In that case the URL is
/// printed so the user can open it by hand. A spinner runs while waiting.
pub async fn login<S: TokenStore + 'static>(
    client: Arc<SpotifyAuthClient<S>>,
) -> Result<TokenResponse> {
    let ctx = Arc::new(CallbackContext::new(Arc::clone(&client)));
    let listener = server::bind(&client.config().server_address).await?;
    let request = client.begin_authorization().await?;

    let server_ctx = Arc::clone(&ctx);
    let server = tokio::spawn(async move {
        if let Err(e) = server::start_api_server(server_ctx, listener).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if webbrowser::open(&request.url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            request.url
        )
    }

    let outcome = wait_for_callback(&ctx, LOGIN_TIMEOUT).await;
    server.abort();

    match outcome {
        Some(result) => result,
        None => {
            client.cancel_authorization().await?;
            Err(Error::Timeout)
        }
    }
}

/// Polls the callback outcome once a second until it is set or `max_wait`
/// has passed.
async fn wait_for_callback<S>(
    ctx: &CallbackContext<S>,
    max_wait: Duration,
) -> Option<Result<TokenResponse>> {
    let pb = ProgressBar::new_spinner();
    pb.set_message("Waiting for Spotify authorization in the browser...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let start = Instant::now();
    while start.elapsed() < max_wait {
        if let Some(result) = ctx.take_outcome().await {
            pb.finish_and_clear();
            return Some(result);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    pb.finish_and_clear();
    None
}

/// Exchanges an authorization code and its PKCE verifier for tokens.
///
/// Posts an `authorization_code` grant as a form to the configured token URL.
///
/// # Arguments
///
/// * `http` - HTTP client used for the call
/// * `config` - Supplies the token URL, client id and redirect URI
/// * `code` - The authorization code from the callback
/// * `verifier` - The PKCE verifier the challenge was derived from
///
/// # Returns
///
/// The parsed [`TokenResponse`]. Nothing is stored here.
///
/// # Errors
///
/// - [`Error::TokenExchange`] with the upstream `error` and
///   `error_description` on a non-2xx answer, or `invalid_response` when the
///   body is not a token response
/// - [`Error::Timeout`] after [`TOKEN_REQUEST_TIMEOUT`]
/// - [`Error::Network`] on other transport failures
pub async fn exchange_code(
    http: &Client,
    config: &Config,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    let response = http
        .post(&config.token_url)
        .timeout(TOKEN_REQUEST_TIMEOUT)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("client_id", config.client_id.as_str()),
            ("code_verifier", verifier),
        ])
        .send()
        .await
        .map_err(Error::from_transport)?;

    if !response.status().is_success() {
        let (error, description) = upstream_error(response).await;
        return Err(Error::TokenExchange { error, description });
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenExchange {
            error: "invalid_response".to_string(),
            description: Some(e.to_string()),
        })
}

/// Mints a new access token from a refresh token.
///
/// # Arguments
///
/// * `http` - HTTP client used for the call
/// * `config` - Supplies the token URL and client id
/// * `refresh` - The stored refresh token
///
/// # Returns
///
/// The parsed [`TokenResponse`]. Its `refresh_token` is only set when
/// Spotify rotated it.
///
/// # Errors
///
/// - [`Error::TokenRefresh`] on a non-2xx answer (e.g. `invalid_grant` for a
///   revoked token) or an unparseable body
/// - [`Error::Timeout`] after [`TOKEN_REQUEST_TIMEOUT`]
/// - [`Error::Network`] on other transport failures
pub async fn refresh_token(
    http: &Client,
    config: &Config,
    refresh: &str,
) -> Result<TokenResponse> {
    let response = http
        .post(&config.token_url)
        .timeout(TOKEN_REQUEST_TIMEOUT)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh),
            ("client_id", config.client_id.as_str()),
        ])
        .send()
        .await
        .map_err(Error::from_transport)?;

    if !response.status().is_success() {
        let (error, description) = upstream_error(response).await;
        return Err(Error::TokenRefresh { error, description });
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::TokenRefresh {
            error: "invalid_response".to_string(),
            description: Some(e.to_string()),
        })
}

/// Reads `{error, error_description}` from a failed token endpoint response.
/// Falls back to the HTTP status when the body is not the expected JSON.
async fn upstream_error(response: Response) -> (String, Option<String>) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed: TokenErrorResponse = serde_json::from_str(&body).unwrap_or_default();

    let error = parsed
        .error
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| format!("status {}", status.as_u16()));
    (error, parsed.error_description.filter(|d| !d.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> Config {
        Config::new("client-123", "http://127.0.0.1:5176/callback")
            .unwrap()
            .with_token_url(format!("{}/api/token", server.uri()))
            .unwrap()
    }

    #[tokio::test]
    async fn exchange_code_posts_pkce_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("code_verifier=the-verifier"))
            .and(body_string_contains("client_id=client-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at_1",
                "token_type": "Bearer",
                "scope": "user-top-read",
                "expires_in": 3600,
                "refresh_token": "rt_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = exchange_code(&Client::new(), &config(&server), "the-code", "the-verifier")
            .await
            .unwrap();
        assert_eq!(token.access_token, "at_1");
        assert_eq!(token.refresh_token.as_deref(), Some("rt_1"));
        assert_eq!(token.expires_in, 3600);
    }

    #[tokio::test]
    async fn exchange_code_surfaces_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })))
            .mount(&server)
            .await;

        let err = exchange_code(&Client::new(), &config(&server), "bad", "v")
            .await
            .unwrap_err();
        match err {
            Error::TokenExchange { error, description } => {
                assert_eq!(error, "invalid_grant");
                assert_eq!(description.as_deref(), Some("Invalid authorization code"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_without_json_body_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = refresh_token(&Client::new(), &config(&server), "rt")
            .await
            .unwrap_err();
        match err {
            Error::TokenRefresh { error, description } => {
                assert_eq!(error, "status 502");
                assert_eq!(description, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_response_without_refresh_token_parses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at_2",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let token = refresh_token(&Client::new(), &config(&server), "rt")
            .await
            .unwrap();
        assert_eq!(token.access_token, "at_2");
        assert_eq!(token.refresh_token, None);
    }

    #[tokio::test]
    async fn login_stops_before_serving_when_round_trip_cannot_be_stored() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = crate::management::FileTokenStore::load(blocker.join("auth.json"))
            .await
            .unwrap();
        let config = Config::new("client", "http://127.0.0.1:0/callback").unwrap();
        let client = Arc::new(SpotifyAuthClient::new(config, store));

        let err = login(Arc::clone(&client)).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)), "got {err:?}");
        // only the test holds the client, no server task kept a clone
        assert_eq!(Arc::strong_count(&client), 1);
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_a_network_error() {
        let config = Config::new("client", "http://127.0.0.1:5176/callback")
            .unwrap()
            .with_token_url("http://127.0.0.1:1/api/token")
            .unwrap();
        let err = refresh_token(&Client::new(), &config, "rt").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)), "got {err:?}");
    }
}
