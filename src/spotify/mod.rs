//! # Spotify Integration Module
//!
//! The authenticated client for the Spotify Web API and everything it needs
//! to obtain and keep a session.
//!
//! ## Layout
//!
//! ```text
//! CLI / callback server
//!          ↓
//! endpoints (dashboard helpers: /me, /me/top/*, /search, ...)
//!          ↓
//! client::SpotifyAuthClient (PKCE, refresh gate, request classification)
//!     ├── auth (token endpoint, interactive login)
//!     ├── request (options, response classification)
//!     └── management::TokenStore (persisted AuthState)
//!          ↓
//! reqwest
//! ```
//!
//! ## Authentication
//!
//! [`client::SpotifyAuthClient::begin_authorization`] stores a `state` nonce
//! and a PKCE verifier and returns the authorization URL.
//! [`client::SpotifyAuthClient::complete_authorization`] consumes both,
//! exchanges the code and persists the tokens with an absolute expiry.
//! [`auth::login`] glues the two together with a browser and a local
//! callback server.
//!
//! ## Requests
//!
//! [`client::SpotifyAuthClient::request`] refreshes an expired token before
//! dispatching and classifies failures:
//!
//! | Status | Error | Session |
//! |--------|-------|---------|
//! | 401 | `AuthenticationFailed` | cleared |
//! | 403 | `PermissionDenied` | kept |
//! | 429 | `RateLimited` (with `Retry-After`) | kept |
//! | 5xx | `UpstreamUnavailable` | kept |
//! | other | `Api { status, message }` | kept |
//!
//! There is no retry inside the client; transient errors are for the caller
//! to retry.

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod request;

pub use client::SpotifyAuthClient;
pub use request::RequestOptions;
