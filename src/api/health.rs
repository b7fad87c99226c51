use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::{management::TokenStore, server::CallbackContext, types::SessionState};

pub async fn health<S: TokenStore + 'static>(
    Extension(ctx): Extension<Arc<CallbackContext<S>>>,
) -> Json<Value> {
    let awaiting_callback = ctx.client.session_state().await == SessionState::Authorizing;
    Json(json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "awaiting_callback": awaiting_callback,
    }))
}
