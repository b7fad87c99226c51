use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    api,
    error::{Error, Result},
    management::TokenStore,
    spotify::SpotifyAuthClient,
    types::TokenResponse,
};

/// State shared between the login flow and the `/callback` handler.
pub struct CallbackContext<S> {
    pub client: Arc<SpotifyAuthClient<S>>,
    outcome: Mutex<Option<Result<TokenResponse>>>,
}

impl<S> CallbackContext<S> {
    pub fn new(client: Arc<SpotifyAuthClient<S>>) -> Self {
        Self {
            client,
            outcome: Mutex::new(None),
        }
    }

    pub async fn set_outcome(&self, outcome: Result<TokenResponse>) {
        *self.outcome.lock().await = Some(outcome);
    }

    /// Takes the outcome of the last callback, if one arrived.
    pub async fn take_outcome(&self) -> Option<Result<TokenResponse>> {
        self.outcome.lock().await.take()
    }
}

pub fn router<S: TokenStore + 'static>(ctx: Arc<CallbackContext<S>>) -> Router {
    Router::new()
        .route("/health", get(api::health::<S>))
        .route("/callback", get(api::callback::<S>))
        .layer(Extension(ctx))
}

pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Configuration(format!("cannot bind callback server to {addr}: {e}")))
}

pub async fn start_api_server<S: TokenStore + 'static>(
    ctx: Arc<CallbackContext<S>>,
    listener: TcpListener,
) -> Result<()> {
    axum::serve(listener, router(ctx))
        .await
        .map_err(|e| Error::Network(format!("callback server failed: {e}")))
}
