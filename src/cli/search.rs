use serde_json::Value;
use tabled::Table;

use crate::{
    cli::{DekClient, items, text, top},
    error::Result,
    info,
    types::{AlbumTableRow, SearchKind},
    utils, warning,
};

pub async fn search(
    client: &DekClient,
    query: &str,
    kinds: &[SearchKind],
    limit: u32,
) -> Result<()> {
    let results = match kinds {
        [SearchKind::Track] => client.search_tracks(query, limit).await?,
        [SearchKind::Artist] => client.search_artists(query, limit).await?,
        _ => client.search(query, kinds, limit).await?,
    };

    let mut found = false;
    let tracks = &results["tracks"];
    if !items(tracks).is_empty() {
        info!("Tracks");
        println!("{}", Table::new(top::track_rows(tracks)));
        found = true;
    }
    let artists = &results["artists"];
    if !items(artists).is_empty() {
        info!("Artists");
        println!("{}", Table::new(top::artist_rows(artists)));
        found = true;
    }
    let albums = &results["albums"];
    if !items(albums).is_empty() {
        info!("Albums");
        println!("{}", Table::new(album_rows(albums)));
        found = true;
    }

    if !found {
        warning!("No results for \"{}\".", query);
    }
    Ok(())
}

fn album_rows(page: &Value) -> Vec<AlbumTableRow> {
    items(page)
        .iter()
        .map(|album| AlbumTableRow {
            name: text(&album["name"]),
            artists: utils::artist_names(&album["artists"]),
            release_date: text(&album["release_date"]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn album_rows_from_page() {
        let page = json!({
            "items": [{
                "name": "Record",
                "release_date": "1999-01-01",
                "artists": [{ "name": "A" }]
            }]
        });
        let rows = album_rows(&page);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].release_date, "1999-01-01");
        assert_eq!(rows[0].artists, "A");
    }
}
