//! # CLI Module
//!
//! User-facing commands of dekcli. Each command takes the shared
//! [`DekClient`], calls the library, and renders the result as a table or as
//! pretty-printed JSON.
//!
//! ## Commands
//!
//! - [`login`], [`logout`], [`status`]: session lifecycle
//! - [`me`]: profile of the signed-in user
//! - [`top_tracks`], [`top_artists`]: personalization endpoints
//! - [`recent`], [`now_playing`]: playback history and state
//! - [`search`]: catalog search
//! - [`stats`]: listening statistics, average tempo and genre breakdown
//! - [`evolution`]: top artists across time ranges
//! - [`request`]: raw authenticated call to any endpoint
//!
//! Commands return [`crate::Result`]; [`fail`] turns an error into a message
//! with a hint that matches its kind and exits.

use std::{str::FromStr, sync::Arc};

use reqwest::Method;
use serde_json::Value;

use crate::{
    config::Config,
    error::{Error, Result},
    management::FileTokenStore,
    spotify::SpotifyAuthClient,
};

mod auth;
mod player;
mod request;
mod search;
mod stats;
mod top;

pub use auth::login;
pub use auth::logout;
pub use auth::status;
pub use player::now_playing;
pub use player::recent;
pub use request::me;
pub use request::request;
pub use search::search;
pub use stats::evolution;
pub use stats::stats;
pub use top::top_artists;
pub use top::top_tracks;

/// The client as used by the command line: tokens live in a file.
pub type DekClient = SpotifyAuthClient<FileTokenStore>;

pub async fn build_client(config: Config) -> Result<Arc<DekClient>> {
    let store = FileTokenStore::load(config.token_store_path.clone()).await?;
    Ok(Arc::new(SpotifyAuthClient::new(config, store)))
}

/// Prints `err` with a hint for the user and exits with status 1.
pub fn fail(err: Error) -> ! {
    let hint = match &err {
        e if e.requires_login() => "Run `dekcli login` to sign in again.",
        Error::PermissionDenied(_) => {
            "The session lacks a permission. Run `dekcli login` to grant it."
        }
        Error::RateLimited { .. } | Error::UpstreamUnavailable { .. } => {
            "Spotify is busy. Try again in a moment."
        }
        Error::Network(_) | Error::Timeout => "Check your network connection and try again.",
        Error::Configuration(_) => {
            "Set the missing values in the environment or in dekcli's .env file."
        }
        _ => "",
    };

    if hint.is_empty() {
        crate::error!("{}", err)
    } else {
        crate::error!("{}\n    {}", err, hint)
    }
}

pub fn parse_method(raw: &str) -> std::result::Result<Method, String> {
    Method::from_str(&raw.to_ascii_uppercase()).map_err(|e| format!("invalid HTTP method: {e}"))
}

pub fn parse_json(raw: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

fn items(page: &Value) -> &[Value] {
    page["items"].as_array().map(Vec::as_slice).unwrap_or_default()
}

fn text(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

fn format_duration_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!(parse_method("put").unwrap(), Method::PUT);
        assert_eq!(parse_method("GET").unwrap(), Method::GET);
        assert!(parse_method("not a method").is_err());
    }

    #[test]
    fn json_parsing() {
        assert_eq!(parse_json(r#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert!(parse_json("{").is_err());
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration_ms(0), "0:00");
        assert_eq!(format_duration_ms(215_000), "3:35");
        assert_eq!(format_duration_ms(3_601_000), "60:01");
    }

    #[test]
    fn items_of_non_page_is_empty() {
        assert!(items(&Value::Null).is_empty());
        assert_eq!(items(&json!({"items": [1, 2]})).len(), 2);
    }
}
