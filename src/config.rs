//! Configuration management for dekcli.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! `.env` file in the local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Defaults for the public Spotify endpoints
//!
//! The client id and the redirect URI have no defaults. A missing value is a
//! fatal [`Error::Configuration`] raised at startup.

use std::{env, path::PathBuf};

use reqwest::Url;

use crate::error::{Error, Result};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Permissions requested during authorization.
pub const SCOPES: &[&str] = &[
    "user-read-private",
    "user-read-email",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "user-read-recently-played",
    "user-top-read",
    "playlist-read-private",
    "playlist-read-collaborative",
    "user-library-read",
    "streaming",
];

const ENV_CLIENT_ID: &str = "SPOTIFY_API_AUTH_CLIENT_ID";
const ENV_REDIRECT_URI: &str = "SPOTIFY_API_REDIRECT_URI";
const ENV_AUTH_URL: &str = "SPOTIFY_API_AUTH_URL";
const ENV_TOKEN_URL: &str = "SPOTIFY_API_TOKEN_URL";
const ENV_API_URL: &str = "SPOTIFY_API_URL";
const ENV_SERVER_ADDRESS: &str = "SERVER_ADDRESS";
const ENV_TOKEN_STORE: &str = "DEKCLI_TOKEN_STORE";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Looks for the file in:
/// - Linux: `~/.local/share/dekcli/.env`
/// - macOS: `~/Library/Application Support/dekcli/.env`
/// - Windows: `%LOCALAPPDATA%/dekcli/.env`
///
/// The directory is created if needed. Values already present in the process
/// environment win over the file.
///
/// # Returns
///
/// `Ok(())` when the file was loaded or does not exist. The variables may
/// come from the process environment alone.
///
/// # Errors
///
/// [`Error::Configuration`] when the data directory cannot be created or the
/// `.env` file exists but cannot be parsed.
///
/// # Example
///
/// ```
/// config::load_env().await?;
/// let config = Config::from_env()?;
/// ```
pub async fn load_env() -> Result<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await.map_err(|e| {
            Error::Configuration(format!("cannot create {}: {e}", parent.display()))
        })?;
    }

    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| Error::Configuration(format!("cannot load {}: {e}", path.display())))?;
    }
    Ok(())
}

/// Root of dekcli's files in the platform's local data directory.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("dekcli");
    path
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    /// Bind address of the local callback server.
    pub server_address: String,
    pub token_store_path: PathBuf,
}

impl Config {
    /// Builds a configuration for the public Spotify endpoints.
    ///
    /// The callback server address defaults to the host and port of
    /// `redirect_uri`, and tokens are kept in
    /// `<data dir>/cache/auth-state.json`.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Client id of the app registered with Spotify
    /// * `redirect_uri` - Redirect URI registered for the app, where the local
    ///   callback server listens
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when either value is empty or the redirect
    /// URI is not an absolute URL with a host.
    ///
    /// # Example
    ///
    /// ```
    /// let config = Config::new("my-client-id", "http://127.0.0.1:5176/callback")?
    ///     .with_api_url("http://127.0.0.1:9000/v1")?;
    /// assert_eq!(config.server_address, "127.0.0.1:5176");
    /// ```
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Result<Self> {
        let client_id = client_id.into();
        let redirect_uri = redirect_uri.into();

        if client_id.trim().is_empty() {
            return Err(Error::Configuration(format!("{ENV_CLIENT_ID} must be set")));
        }
        if redirect_uri.trim().is_empty() {
            return Err(Error::Configuration(format!("{ENV_REDIRECT_URI} must be set")));
        }

        let server_address = server_address_for(&redirect_uri)?;

        Ok(Self {
            client_id,
            redirect_uri,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            server_address,
            token_store_path: data_dir().join("cache/auth-state.json"),
        })
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `SPOTIFY_API_AUTH_CLIENT_ID` (required)
    /// - `SPOTIFY_API_REDIRECT_URI` (required)
    /// - `SPOTIFY_API_AUTH_URL`, `SPOTIFY_API_TOKEN_URL`, `SPOTIFY_API_URL`:
    ///   endpoint overrides, validated as URLs
    /// - `SERVER_ADDRESS`: bind address of the callback server
    /// - `DEKCLI_TOKEN_STORE`: path of the token file
    ///
    /// Empty optional values are treated as unset.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for a missing required value or an invalid
    /// URL. There are no fallbacks for the client id and redirect URI.
    pub fn from_env() -> Result<Self> {
        let client_id = env::var(ENV_CLIENT_ID).unwrap_or_default();
        let redirect_uri = env::var(ENV_REDIRECT_URI).unwrap_or_default();
        let mut config = Self::new(client_id, redirect_uri)?;

        if let Some(url) = optional_var(ENV_AUTH_URL) {
            config = config.with_auth_url(url)?;
        }
        if let Some(url) = optional_var(ENV_TOKEN_URL) {
            config = config.with_token_url(url)?;
        }
        if let Some(url) = optional_var(ENV_API_URL) {
            config = config.with_api_url(url)?;
        }
        if let Some(addr) = optional_var(ENV_SERVER_ADDRESS) {
            config.server_address = addr;
        }
        if let Some(path) = optional_var(ENV_TOKEN_STORE) {
            config = config.with_token_store_path(path);
        }

        Ok(config)
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Result<Self> {
        self.auth_url = validated_url(ENV_AUTH_URL, url.into())?;
        Ok(self)
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Result<Self> {
        self.token_url = validated_url(ENV_TOKEN_URL, url.into())?;
        Ok(self)
    }

    /// Base URL of the resource API. A trailing slash is dropped so that
    /// endpoints like `/me` can be appended directly.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Result<Self> {
        let url = validated_url(ENV_API_URL, url.into())?;
        self.api_url = url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Where [`crate::management::FileTokenStore`] keeps the session.
    pub fn with_token_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_store_path = path.into();
        self
    }

    /// Space separated scope list as sent to the authorization endpoint.
    pub fn scope(&self) -> String {
        SCOPES.join(" ")
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn validated_url(name: &str, url: String) -> Result<String> {
    Url::parse(&url).map_err(|e| {
        Error::Configuration(format!("{name} is not a valid URL ({url}): {e}"))
    })?;
    Ok(url)
}

fn server_address_for(redirect_uri: &str) -> Result<String> {
    let url = Url::parse(redirect_uri).map_err(|e| {
        Error::Configuration(format!("{ENV_REDIRECT_URI} is not a valid URL ({redirect_uri}): {e}"))
    })?;
    let host = url.host_str().ok_or_else(|| {
        Error::Configuration(format!("{ENV_REDIRECT_URI} has no host: {redirect_uri}"))
    })?;
    let port = url.port_or_known_default().unwrap_or(80);
    Ok(format!("{host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_spotify_defaults() {
        let config = Config::new("client", "http://127.0.0.1:5176/callback").unwrap();
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.server_address, "127.0.0.1:5176");
    }

    #[test]
    fn missing_client_id_fails_fast() {
        let err = Config::new("  ", "http://127.0.0.1:5176/callback").unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains(ENV_CLIENT_ID)));
    }

    #[test]
    fn missing_redirect_uri_fails_fast() {
        let err = Config::new("client", "").unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains(ENV_REDIRECT_URI)));
    }

    #[test]
    fn relative_redirect_uri_is_rejected() {
        assert!(matches!(
            Config::new("client", "/callback"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn api_url_trailing_slash_is_dropped() {
        let config = Config::new("client", "http://localhost:8080/callback")
            .unwrap()
            .with_api_url("http://127.0.0.1:9999/v1/")
            .unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:9999/v1");
        assert_eq!(config.server_address, "localhost:8080");
    }

    #[test]
    fn token_store_path_can_be_overridden() {
        let config = Config::new("client", "http://localhost:8080/callback").unwrap();
        assert!(config.token_store_path.ends_with("cache/auth-state.json"));

        let config = config.with_token_store_path("/tmp/dekcli/session.json");
        assert_eq!(config.token_store_path, PathBuf::from("/tmp/dekcli/session.json"));
    }

    #[test]
    fn scope_is_space_joined() {
        let config = Config::new("client", "http://localhost:8080/callback").unwrap();
        let scope = config.scope();
        assert!(scope.starts_with("user-read-private user-read-email"));
        assert!(scope.ends_with("streaming"));
        assert_eq!(scope.split(' ').count(), SCOPES.len());
    }
}
