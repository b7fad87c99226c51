//! Error types for the Spotify authentication client.
//!
//! Every failure coming out of the token endpoint, the resource API, the
//! token store or the transport is turned into exactly one [`Error`] variant
//! before it reaches the caller. Callers branch on the variant (or on
//! [`Error::requires_login`] / [`Error::is_transient`]) rather than on status
//! codes or message text.

use std::time::Duration;

/// Errors from configuration, the OAuth flow and authenticated requests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("state mismatch: the callback does not belong to the pending authorization")]
    StateMismatch,

    #[error("no PKCE code verifier stored: no authorization is pending")]
    MissingVerifier,

    #[error("callback did not carry an authorization code")]
    MissingCode,

    #[error("authorization denied by Spotify: {0}")]
    AuthorizationDenied(String),

    #[error("token exchange failed: {}", upstream_message(.error, .description))]
    TokenExchange {
        error: String,
        description: Option<String>,
    },

    #[error("token refresh failed: {}", upstream_message(.error, .description))]
    TokenRefresh {
        error: String,
        description: Option<String>,
    },

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("rate limited by Spotify{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Spotify is unavailable (status {status})")]
    UpstreamUnavailable { status: u16 },

    #[error("Spotify API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("token store error: {0}")]
    Storage(String),
}

impl Error {
    /// The session is gone and the user has to run the authorization flow again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Error::AuthenticationFailed(_)
                | Error::NoRefreshToken
                | Error::StateMismatch
                | Error::MissingVerifier
        )
    }

    /// Worth retrying later with the same session.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::RateLimited { .. }
                | Error::UpstreamUnavailable { .. }
                | Error::Network(_)
                | Error::Timeout
        )
    }

    /// Map a transport failure from reqwest. Timeouts are kept apart from
    /// other network failures.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(err.to_string())
        }
    }
}

fn upstream_message(error: &str, description: &Option<String>) -> String {
    match description {
        Some(d) if !d.is_empty() => format!("{d} ({error})"),
        _ => error.to_string(),
    }
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_exchange_message_prefers_description() {
        let err = Error::TokenExchange {
            error: "invalid_grant".into(),
            description: Some("Invalid authorization code".into()),
        };
        assert_eq!(
            err.to_string(),
            "token exchange failed: Invalid authorization code (invalid_grant)"
        );

        let err = Error::TokenRefresh {
            error: "invalid_grant".into(),
            description: None,
        };
        assert_eq!(err.to_string(), "token refresh failed: invalid_grant");
    }

    #[test]
    fn rate_limited_message_includes_delay() {
        let err = Error::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(err.to_string(), "rate limited by Spotify, retry after 7s");
        assert!(err.is_transient());
        assert!(!err.requires_login());
    }

    #[test]
    fn classification_helpers() {
        assert!(Error::AuthenticationFailed("x".into()).requires_login());
        assert!(Error::MissingVerifier.requires_login());
        assert!(!Error::PermissionDenied("x".into()).requires_login());
        assert!(!Error::PermissionDenied("x".into()).is_transient());
        assert!(Error::UpstreamUnavailable { status: 503 }.is_transient());
        assert!(!Error::Cancelled.is_transient());
    }
}
