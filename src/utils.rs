use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use rand::{Rng, distr::Alphanumeric};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::types::PkceChallenge;

/// Length of the anti-CSRF `state` nonce.
pub const STATE_LENGTH: usize = 16;

/// Length of the PKCE verifier, the maximum RFC 7636 allows.
pub const CODE_VERIFIER_LENGTH: usize = 128;

fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn generate_code_verifier() -> String {
    random_alphanumeric(CODE_VERIFIER_LENGTH)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn generate_state() -> String {
    random_alphanumeric(STATE_LENGTH)
}

pub fn generate_pkce() -> PkceChallenge {
    let verifier = generate_code_verifier();
    let challenge = generate_code_challenge(&verifier);
    PkceChallenge {
        verifier,
        challenge,
    }
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Joins the `name` fields of a JSON array of artist objects.
pub fn artist_names(artists: &Value) -> String {
    artists
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|a| a["name"].as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

/// Shortens `played_at` style timestamps to `YYYY-MM-DD HH:MM`.
pub fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}
