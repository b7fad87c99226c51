//! Build script for dekcli.
//!
//! Copies the `.env.example` template into dekcli's local data directory so
//! users find a ready-to-edit configuration next to where `.env` is read:
//! - Linux: `~/.local/share/dekcli/.env.example`
//! - macOS: `~/Library/Application Support/dekcli/.env.example`
//! - Windows: `%LOCALAPPDATA%/dekcli/.env.example`
//!
//! A missing template only produces a cargo warning.

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` from the crate root into the data directory.
///
/// # Returns
///
/// `Ok(())` when the template was copied or is missing. A missing template is
/// reported as a `cargo:warning` and does not fail the build.
///
/// # Errors
///
/// - `CARGO_MANIFEST_DIR` is not set
/// - The data directory cannot be created
/// - The template cannot be copied
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("dekcli");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        fs::copy(&env_example_path, out_dir.join(".env.example"))?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
