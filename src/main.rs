use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use reqwest::Method;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use dekcli::{
    cli,
    config::{self, Config},
    types::{SearchKind, TimeRange},
};

const LOG_ENV: &str = "DEKCLI_LOG";

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with Spotify in the browser
    Login,

    /// Remove the stored session
    Logout,

    /// Show the stored session without contacting Spotify
    Status,

    /// Show your Spotify profile
    Me,

    /// Your most listened tracks or artists
    Top(TopOptions),

    /// Recently played tracks
    Recent(RecentOptions),

    /// What is playing right now
    NowPlaying,

    /// Search the Spotify catalog
    Search(SearchOptions),

    /// Listening totals, average tempo and top genres
    Stats,

    /// How your top artists changed over time
    Evolution(EvolutionOptions),

    /// Send an authenticated request to any Web API endpoint
    Request(RequestArgs),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TopOptions {
    #[command(subcommand)]
    pub kind: TopKind,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TopKind {
    /// Top tracks
    Tracks(TopArgs),
    /// Top artists
    Artists(TopArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct TopArgs {
    /// Window the ranking is computed over
    #[clap(long, value_enum, default_value_t = TimeRange::MediumTerm)]
    pub time_range: TimeRange,

    /// Number of entries (1-50)
    #[clap(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct RecentOptions {
    /// Number of entries (1-50)
    #[clap(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct EvolutionOptions {
    /// Artists per time range (1-50)
    #[clap(long, default_value_t = 10)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Search query
    pub query: String,

    /// Kind(s) of result to include; can be repeated. All kinds when omitted
    #[clap(long = "type", value_enum, action = ArgAction::Append, num_args = 1)]
    pub kinds: Vec<SearchKind>,

    /// Results per kind (1-50)
    #[clap(long, default_value_t = 10)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct RequestArgs {
    /// Endpoint relative to the API base, e.g. `/me/player`
    pub endpoint: String,

    /// HTTP method
    #[clap(long, short = 'X', default_value = "GET", value_parser = cli::parse_method)]
    pub method: Method,

    /// JSON body sent with the request
    #[clap(long, value_parser = cli::parse_json)]
    pub body: Option<Value>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        cli::fail(e);
    }
    let client = match Config::from_env() {
        Ok(config) => match cli::build_client(config).await {
            Ok(client) => client,
            Err(e) => cli::fail(e),
        },
        Err(e) => cli::fail(e),
    };

    let result = match cli.command {
        Command::Login => cli::login(client).await,
        Command::Logout => cli::logout(&client).await,
        Command::Status => cli::status(&client).await,
        Command::Me => cli::me(&client).await,
        Command::Top(opt) => match opt.kind {
            TopKind::Tracks(args) => {
                cli::top_tracks(&client, args.time_range, args.limit).await
            }
            TopKind::Artists(args) => {
                cli::top_artists(&client, args.time_range, args.limit).await
            }
        },
        Command::Recent(opt) => cli::recent(&client, opt.limit).await,
        Command::NowPlaying => cli::now_playing(&client).await,
        Command::Search(opt) => cli::search(&client, &opt.query, &opt.kinds, opt.limit).await,
        Command::Stats => cli::stats(&client).await,
        Command::Evolution(opt) => cli::evolution(&client, opt.limit).await,
        Command::Request(args) => {
            cli::request(&client, &args.endpoint, args.method, args.body).await
        }
        Command::Completions(_) => Ok(()),
    };

    if let Err(e) = result {
        cli::fail(e);
    }
}
