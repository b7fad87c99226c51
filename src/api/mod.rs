//! # API Module
//!
//! HTTP endpoints of the short-lived local server that runs during
//! `dekcli login`.
//!
//! - [`callback`] receives the redirect from Spotify's authorization server
//!   (`code`, `state`, optional `error`) and hands it to
//!   [`crate::spotify::SpotifyAuthClient::handle_callback`]. The outcome is
//!   recorded in the shared [`crate::server::CallbackContext`] for the waiting
//!   login flow.
//! - [`health`] reports liveness and the crate version.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
