//! dekcli library
//!
//! A client for the Spotify Web API that owns the whole OAuth session:
//! Authorization Code with PKCE, persisted tokens, silent refresh and
//! classified request failures. A small command line dashboard is built on
//! top of it.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints of the local callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration from the environment and `.env`
//! - `error` - The error taxonomy shared by every operation
//! - `management` - Token store abstraction and its implementations
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - The authenticated Spotify client
//! - `stats` - Listening statistics over API responses
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE, time and formatting helpers
//!
//! # Example
//!
//! ```
//! use dekcli::{config::Config, management::MemoryTokenStore, spotify::SpotifyAuthClient};
//!
//! #[tokio::main]
//! async fn main() -> dekcli::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = SpotifyAuthClient::new(config, MemoryTokenStore::new());
//!     let request = client.begin_authorization().await?;
//!     println!("open {}", request.url);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod stats;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Starting authentication process...");
/// info!("Found {} tracks", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Authentication completed successfully");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors; nothing after the macro runs.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Rate limited, retry in {} seconds", secs);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
