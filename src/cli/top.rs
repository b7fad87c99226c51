use serde_json::Value;
use tabled::Table;

use crate::{
    cli::{DekClient, items, text},
    error::Result,
    types::{ArtistTableRow, TimeRange, TrackTableRow},
    utils, warning,
};

pub async fn top_tracks(client: &DekClient, time_range: TimeRange, limit: u32) -> Result<()> {
    let page = client.top_tracks(time_range, limit).await?;
    let rows = track_rows(&page);
    if rows.is_empty() {
        warning!("No top tracks for {} yet.", time_range.as_str());
        return Ok(());
    }

    println!("{}", Table::new(rows));
    Ok(())
}

pub async fn top_artists(client: &DekClient, time_range: TimeRange, limit: u32) -> Result<()> {
    let page = client.top_artists(time_range, limit).await?;
    let rows = artist_rows(&page);
    if rows.is_empty() {
        warning!("No top artists for {} yet.", time_range.as_str());
        return Ok(());
    }

    println!("{}", Table::new(rows));
    Ok(())
}

pub(crate) fn track_rows(page: &Value) -> Vec<TrackTableRow> {
    items(page)
        .iter()
        .enumerate()
        .map(|(i, track)| TrackTableRow {
            rank: i + 1,
            name: text(&track["name"]),
            artists: utils::artist_names(&track["artists"]),
            album: text(&track["album"]["name"]),
        })
        .collect()
}

pub(crate) fn artist_rows(page: &Value) -> Vec<ArtistTableRow> {
    items(page)
        .iter()
        .enumerate()
        .map(|(i, artist)| ArtistTableRow {
            rank: i + 1,
            name: text(&artist["name"]),
            genres: artist["genres"]
                .as_array()
                .map(|genres| {
                    genres
                        .iter()
                        .filter_map(Value::as_str)
                        .take(3)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn track_rows_from_page() {
        let page = json!({
            "items": [{
                "name": "Song",
                "artists": [{ "name": "A" }, { "name": "B" }],
                "album": { "name": "Record" }
            }]
        });
        let rows = track_rows(&page);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].artists, "A, B");
        assert_eq!(rows[0].album, "Record");
    }

    #[test]
    fn artist_rows_keep_three_genres() {
        let page = json!({
            "items": [{ "name": "A", "genres": ["a", "b", "c", "d"] }, { "name": "B" }]
        });
        let rows = artist_rows(&page);
        assert_eq!(rows[0].genres, "a, b, c");
        assert_eq!(rows[1].genres, "");
        assert_eq!(rows[1].rank, 2);
    }
}
