use tabled::Table;

use crate::{
    cli::DekClient,
    error::{Error, Result},
    info,
    spotify::endpoints::MAX_LIMIT,
    stats::{self, ListeningStats, TasteEvolution, genre_breakdown},
    types::{EvolutionTableRow, GenreTableRow, TimeRange},
    warning,
};

const TOP_GENRES: usize = 10;

/// Totals over the recent history, average tempo of the top tracks and the
/// genres of the top artists.
pub async fn stats(client: &DekClient) -> Result<()> {
    let recent = client.recently_played(MAX_LIMIT).await?;
    let listening = ListeningStats::from_recently_played(&recent);
    info!(
        "Last {} tracks played, about {} minutes of listening.",
        listening.tracks_played, listening.minutes_played
    );

    match top_tracks_tempo(client).await {
        Ok(Some(bpm)) => info!("Average tempo of your top tracks: {} BPM", bpm),
        Ok(None) => warning!("No audio analysis available for your top tracks."),
        // audio features are restricted for some apps
        Err(Error::PermissionDenied(reason)) => {
            warning!("Average tempo unavailable: {}", reason)
        }
        Err(e) => return Err(e),
    }

    let artists = client.top_artists(TimeRange::MediumTerm, MAX_LIMIT).await?;
    let rows: Vec<GenreTableRow> = genre_breakdown(&artists)
        .into_iter()
        .take(TOP_GENRES)
        .map(|(genre, artists)| GenreTableRow { genre, artists })
        .collect();
    if rows.is_empty() {
        warning!("Not enough listening history for a genre breakdown.");
        return Ok(());
    }

    info!("Top genres across your top artists");
    println!("{}", Table::new(rows));
    Ok(())
}

async fn top_tracks_tempo(client: &DekClient) -> Result<Option<u32>> {
    let top = client.top_tracks(TimeRange::MediumTerm, MAX_LIMIT).await?;
    let ids = stats::track_ids(&top);
    if ids.is_empty() {
        return Ok(None);
    }

    let features = client.audio_features(&ids).await?;
    Ok(stats::average_tempo(&features))
}

/// Top artists of the last weeks, months and all time, side by side.
pub async fn evolution(client: &DekClient, limit: u32) -> Result<()> {
    let short = client.top_artists(TimeRange::ShortTerm, limit).await?;
    let medium = client.top_artists(TimeRange::MediumTerm, limit).await?;
    let long = client.top_artists(TimeRange::LongTerm, limit).await?;

    let evolution = TasteEvolution::from_pages(&short, &medium, &long);
    if evolution.depth() == 0 {
        warning!("Not enough listening history to compare time ranges.");
        return Ok(());
    }

    println!("{}", Table::new(evolution_rows(&evolution)));

    let newcomers = evolution.newcomers();
    if !newcomers.is_empty() {
        info!("New in your rotation: {}", newcomers.join(", "));
    }
    Ok(())
}

fn evolution_rows(evolution: &TasteEvolution) -> Vec<EvolutionTableRow> {
    let at = |names: &[String], i: usize| names.get(i).cloned().unwrap_or_default();
    (0..evolution.depth())
        .map(|i| EvolutionTableRow {
            rank: i + 1,
            short_term: at(&evolution.short_term, i),
            medium_term: at(&evolution.medium_term, i),
            long_term: at(&evolution.long_term, i),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evolution_rows_pad_shorter_rankings() {
        let evolution = TasteEvolution {
            short_term: vec!["A".into()],
            medium_term: vec!["B".into(), "C".into()],
            long_term: vec![],
        };
        let rows = evolution_rows(&evolution);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].short_term, "A");
        assert_eq!(rows[1].short_term, "");
        assert_eq!(rows[1].medium_term, "C");
        assert_eq!(rows[1].rank, 2);
    }
}
