use reqwest::Method;
use serde_json::Value;
use tabled::Table;

use crate::{
    cli::{DekClient, text},
    error::Result,
    info,
    spotify::RequestOptions,
    types::StatusTableRow,
};

pub async fn me(client: &DekClient) -> Result<()> {
    let profile = client.current_user().await?;
    println!("{}", Table::new(profile_rows(&profile)));
    Ok(())
}

/// Sends an authenticated request to `endpoint` and prints the JSON answer.
pub async fn request(
    client: &DekClient,
    endpoint: &str,
    method: Method,
    body: Option<Value>,
) -> Result<()> {
    let mut options = RequestOptions::new().method(method);
    if let Some(body) = body {
        options = options.json(body);
    }

    let response = client.request(endpoint, options).await?;
    if response.is_null() {
        info!("No content.");
        return Ok(());
    }

    let pretty = serde_json::to_string_pretty(&response)
        .unwrap_or_else(|_| response.to_string());
    println!("{pretty}");
    Ok(())
}

fn profile_rows(profile: &Value) -> Vec<StatusTableRow> {
    let followers = profile["followers"]["total"]
        .as_u64()
        .map(|n| n.to_string())
        .unwrap_or_default();

    [
        ("name", text(&profile["display_name"])),
        ("id", text(&profile["id"])),
        ("email", text(&profile["email"])),
        ("country", text(&profile["country"])),
        ("plan", text(&profile["product"])),
        ("followers", followers),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(key, value)| StatusTableRow {
        key: key.to_string(),
        value,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_rows_skip_missing_fields() {
        let profile = json!({
            "display_name": "Dek",
            "id": "dek",
            "followers": { "total": 3 }
        });
        let rows = profile_rows(&profile);
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["name", "id", "followers"]);
        assert_eq!(rows[2].value, "3");
    }
}
