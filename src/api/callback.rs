use std::sync::Arc;

use axum::{Extension, extract::Query, response::Html};
use tracing::warn;

use crate::{management::TokenStore, server::CallbackContext, types::CallbackParams};

const SUCCESS_PAGE: &str = "<h2>Authentication successful.</h2><p>You can close this window.</p>";
const FAILURE_PAGE: &str = "<h4>Login failed.</h4><p>Return to the terminal for details.</p>";

pub async fn callback<S: TokenStore + 'static>(
    Query(params): Query<CallbackParams>,
    Extension(ctx): Extension<Arc<CallbackContext<S>>>,
) -> Html<&'static str> {
    let result = ctx.client.handle_callback(&params).await;

    let page = match &result {
        Ok(_) => SUCCESS_PAGE,
        Err(e) => {
            warn!(error = %e, "authorization callback failed");
            FAILURE_PAGE
        }
    };

    ctx.set_outcome(result).await;
    Html(page)
}
