//! Dashboard data helpers.
//!
//! Thin wrappers over [`SpotifyAuthClient::request`] for the endpoints the
//! dashboard reads. They return the JSON verbatim; picking fields out of it
//! is up to the caller (see [`crate::stats`] and the CLI tables).

use serde_json::{Value, json};

use crate::{
    error::{Error, Result},
    management::TokenStore,
    spotify::{client::SpotifyAuthClient, request::RequestOptions},
    types::{SearchKind, TimeRange},
};

/// Largest page the personalization and search endpoints accept.
pub const MAX_LIMIT: u32 = 50;

/// Largest id batch `/audio-features` accepts.
pub const MAX_AUDIO_FEATURE_IDS: usize = 100;

fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

/// Spotify ids are base62: ASCII letters and digits only.
fn is_spotify_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

impl<S: TokenStore> SpotifyAuthClient<S> {
    /// Profile of the signed-in user.
    pub async fn current_user(&self) -> Result<Value> {
        self.get("/me").await
    }

    pub async fn top_tracks(&self, time_range: TimeRange, limit: u32) -> Result<Value> {
        self.top_items("tracks", time_range, limit).await
    }

    pub async fn top_artists(&self, time_range: TimeRange, limit: u32) -> Result<Value> {
        self.top_items("artists", time_range, limit).await
    }

    async fn top_items(&self, kind: &str, time_range: TimeRange, limit: u32) -> Result<Value> {
        self.request(
            &format!("/me/top/{kind}"),
            RequestOptions::new()
                .query("time_range", time_range.as_str())
                .query("limit", clamp_limit(limit).to_string()),
        )
        .await
    }

    pub async fn recently_played(&self, limit: u32) -> Result<Value> {
        self.request(
            "/me/player/recently-played",
            RequestOptions::new().query("limit", clamp_limit(limit).to_string()),
        )
        .await
    }

    /// Full playback state. `Value::Null` when nothing is active.
    pub async fn current_playback(&self) -> Result<Value> {
        self.get("/me/player").await
    }

    /// Currently playing item. `Value::Null` when nothing is playing.
    pub async fn currently_playing(&self) -> Result<Value> {
        self.get("/me/player/currently-playing").await
    }

    /// Audio features for up to 100 tracks in one call.
    pub async fn audio_features(&self, track_ids: &[String]) -> Result<Value> {
        if track_ids.is_empty() {
            return Ok(json!({ "audio_features": [] }));
        }
        if track_ids.len() > MAX_AUDIO_FEATURE_IDS {
            return Err(Error::Api {
                status: 400,
                message: format!(
                    "at most {MAX_AUDIO_FEATURE_IDS} track ids per request, got {}",
                    track_ids.len()
                ),
            });
        }

        self.request(
            "/audio-features",
            RequestOptions::new().query("ids", track_ids.join(",")),
        )
        .await
    }

    pub async fn search(&self, query: &str, kinds: &[SearchKind], limit: u32) -> Result<Value> {
        let kinds = if kinds.is_empty() {
            vec![SearchKind::Track, SearchKind::Artist, SearchKind::Album]
        } else {
            kinds.to_vec()
        };
        let types = kinds
            .iter()
            .map(SearchKind::as_str)
            .collect::<Vec<_>>()
            .join(",");

        self.request(
            "/search",
            RequestOptions::new()
                .query("q", query)
                .query("type", types)
                .query("limit", clamp_limit(limit).to_string()),
        )
        .await
    }

    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Value> {
        self.search(query, &[SearchKind::Track], limit).await
    }

    pub async fn search_artists(&self, query: &str, limit: u32) -> Result<Value> {
        self.search(query, &[SearchKind::Artist], limit).await
    }

    /// Top tracks of an artist in `market` (ISO 3166-1 alpha-2).
    ///
    /// `artist_id` becomes part of the path, so anything but a base62 id is
    /// rejected with a local `Api { status: 400 }`.
    pub async fn artist_top_tracks(&self, artist_id: &str, market: &str) -> Result<Value> {
        if !is_spotify_id(artist_id) {
            return Err(Error::Api {
                status: 400,
                message: format!("invalid artist id: {artist_id:?}"),
            });
        }

        self.request(
            &format!("/artists/{artist_id}/top-tracks"),
            RequestOptions::new().query("market", market),
        )
        .await
    }
}
