use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Body returned by the token endpoint for both code exchange and refresh.
///
/// `expires_in` is a delta in seconds. `refresh_token` may be absent on
/// refresh responses, in which case the stored one stays valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Error body of the token endpoint (`{"error": ..., "error_description": ...}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// PKCE verifier and its S256 challenge. Generated per authorization attempt.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

/// Where to send the user for consent, plus the nonce the callback must echo.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Query of the redirect back from the authorization server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authorizing,
    Authenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authorizing => "authorizing",
            SessionState::Authenticated => "authenticated",
        };
        f.write_str(label)
    }
}

/// Snapshot of the stored session, computed without network calls.
#[derive(Debug, Clone)]
pub struct AuthStatus {
    pub state: SessionState,
    /// Access token present and not expired.
    pub authenticated: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub has_refresh_token: bool,
}

/// Window used by the personalization (top items) endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TimeRange {
    /// About the last four weeks
    ShortTerm,
    /// About the last six months
    #[default]
    MediumTerm,
    /// Several years
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchKind {
    Track,
    Artist,
    Album,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Track => "track",
            SearchKind::Artist => "artist",
            SearchKind::Album => "album",
        }
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub artists: String,
    pub album: String,
}

#[derive(Tabled)]
pub struct ArtistTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub genres: String,
}

#[derive(Tabled)]
pub struct RecentTableRow {
    pub played_at: String,
    pub name: String,
    pub artists: String,
}

#[derive(Tabled)]
pub struct GenreTableRow {
    pub genre: String,
    pub artists: usize,
}

#[derive(Tabled)]
pub struct StatusTableRow {
    pub key: String,
    pub value: String,
}

#[derive(Tabled)]
pub struct AlbumTableRow {
    pub name: String,
    pub artists: String,
    pub release_date: String,
}

#[derive(Tabled)]
pub struct EvolutionTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    #[tabled(rename = "last 4 weeks")]
    pub short_term: String,
    #[tabled(rename = "last 6 months")]
    pub medium_term: String,
    #[tabled(rename = "all time")]
    pub long_term: String,
}
