use serde_json::Value;
use tabled::Table;

use crate::{
    cli::{DekClient, format_duration_ms, items, text},
    error::Result,
    info,
    types::RecentTableRow,
    utils, warning,
};

pub async fn recent(client: &DekClient, limit: u32) -> Result<()> {
    let page = client.recently_played(limit).await?;
    let rows = recent_rows(&page);
    if rows.is_empty() {
        warning!("No recently played tracks.");
        return Ok(());
    }

    println!("{}", Table::new(rows));
    Ok(())
}

pub async fn now_playing(client: &DekClient) -> Result<()> {
    let playing = client.currently_playing().await?;
    match describe_playing(&playing) {
        Some(line) => info!("{}", line),
        None => info!("Nothing is playing right now."),
    }
    Ok(())
}

fn recent_rows(page: &Value) -> Vec<RecentTableRow> {
    items(page)
        .iter()
        .map(|entry| RecentTableRow {
            played_at: utils::format_timestamp(entry["played_at"].as_str().unwrap_or_default()),
            name: text(&entry["track"]["name"]),
            artists: utils::artist_names(&entry["track"]["artists"]),
        })
        .collect()
}

/// One line for the currently playing item, `None` when there is none.
fn describe_playing(playing: &Value) -> Option<String> {
    let item = playing.get("item").filter(|item| !item.is_null())?;

    let mut line = format!(
        "{} - {}",
        text(&item["name"]),
        utils::artist_names(&item["artists"])
    );
    if let (Some(progress), Some(duration)) =
        (playing["progress_ms"].as_u64(), item["duration_ms"].as_u64())
    {
        line.push_str(&format!(
            " [{} / {}]",
            format_duration_ms(progress),
            format_duration_ms(duration)
        ));
    }
    if playing["is_playing"] == Value::Bool(false) {
        line.push_str(" (paused)");
    }
    Some(line)
}
