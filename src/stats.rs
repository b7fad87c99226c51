//! Session statistics computed from API responses.

use std::collections::HashMap;

use serde_json::Value;

/// Totals over a `/me/player/recently-played` page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListeningStats {
    pub tracks_played: usize,
    pub minutes_played: u64,
}

impl ListeningStats {
    pub fn from_recently_played(page: &Value) -> Self {
        let items = page["items"].as_array().map(Vec::as_slice).unwrap_or_default();
        let total_ms: u64 = items
            .iter()
            .filter_map(|item| item["track"]["duration_ms"].as_u64())
            .sum();

        Self {
            tracks_played: items.len(),
            // round to the nearest minute
            minutes_played: (total_ms + 30_000) / 60_000,
        }
    }
}

/// Genre counts over a `/me/top/artists` page, most frequent first.
/// Ties are ordered by name.
pub fn genre_breakdown(artists_page: &Value) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for genre in artists_page["items"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|artist| artist["genres"].as_array())
        .flatten()
        .filter_map(Value::as_str)
    {
        *counts.entry(genre).or_default() += 1;
    }

    let mut genres: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(genre, count)| (genre.to_string(), count))
        .collect();
    genres.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    genres
}

/// Ids of the tracks on a `/me/top/tracks` page, in rank order.
pub fn track_ids(tracks_page: &Value) -> Vec<String> {
    tracks_page["items"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|track| track["id"].as_str())
        .map(str::to_string)
        .collect()
}

/// Mean `tempo` (BPM) over an `/audio-features` response, rounded.
///
/// Spotify answers `null` for tracks it has no analysis for; those entries
/// are skipped. `None` when no entry carries a tempo.
pub fn average_tempo(features: &Value) -> Option<u32> {
    let tempos: Vec<f64> = features["audio_features"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|f| f["tempo"].as_f64())
        .collect();
    if tempos.is_empty() {
        return None;
    }

    let mean = tempos.iter().sum::<f64>() / tempos.len() as f64;
    Some(mean.round() as u32)
}

/// Top artist names per time range, side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TasteEvolution {
    pub short_term: Vec<String>,
    pub medium_term: Vec<String>,
    pub long_term: Vec<String>,
}

impl TasteEvolution {
    /// Builds the comparison from three `/me/top/artists` pages.
    pub fn from_pages(short_term: &Value, medium_term: &Value, long_term: &Value) -> Self {
        Self {
            short_term: artist_ranking(short_term),
            medium_term: artist_ranking(medium_term),
            long_term: artist_ranking(long_term),
        }
    }

    /// Length of the longest of the three rankings.
    pub fn depth(&self) -> usize {
        self.short_term
            .len()
            .max(self.medium_term.len())
            .max(self.long_term.len())
    }

    /// Artists in the short-term ranking that are absent from the long-term one.
    pub fn newcomers(&self) -> Vec<&str> {
        self.short_term
            .iter()
            .filter(|name| !self.long_term.contains(name))
            .map(String::as_str)
            .collect()
    }
}

fn artist_ranking(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|artist| artist["name"].as_str())
        .map(str::to_string)
        .collect()
}
