use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use sporlapi::{
    cli::{self, SavedKind},
    config, error,
    spotify::{SearchType, SpotifyClient},
    warning,
};

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
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show a single track
    Track(TrackOptions),

    /// Show several tracks at once (up to 50)
    Tracks(TracksOptions),

    /// List the available playback devices
    Devices,

    /// Show what is currently playing
    Playing,

    /// List saved tracks or albums
    Saved(SavedOptions),

    /// List followed artists
    Following(FollowingOptions),

    /// Check whether you follow the given artists
    Follows(FollowsOptions),

    /// Search the catalog
    Search(SearchOptions),

    /// Show a playlist and its tracks
    Playlist(PlaylistOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TrackOptions {
    /// Track id, URI or link
    id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    /// Track ids, URIs or links; comma separated or repeated
    #[clap(required = true)]
    ids: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SavedOptions {
    #[clap(value_enum)]
    kind: SavedKind,

    /// Page size (1-50)
    #[clap(long, default_value_t = 20)]
    limit: u32,

    /// Index of the first item
    #[clap(long, default_value_t = 0)]
    offset: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct FollowingOptions {
    /// Page size (1-50)
    #[clap(long, default_value_t = 50)]
    limit: u32,

    /// Fetch every page
    #[clap(long)]
    all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct FollowsOptions {
    /// Artist ids, URIs or links
    #[clap(required = true)]
    ids: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    query: String,

    /// Item type(s) to search for; can be repeated
    #[clap(
        long = "type",
        value_parser = parse_search_type,
        action = ArgAction::Append,
        num_args = 1
    )]
    types: Vec<SearchType>,

    /// Results per type (1-50)
    #[clap(long, default_value_t = 10)]
    limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistOptions {
    /// Playlist id, URI or link
    id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn parse_search_type(value: &str) -> Result<SearchType, String> {
    value.parse().map_err(|e: sporlapi::ApiError| e.message)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sporlapi=warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration. Err: {}", e),
    };

    let cancel = CancellationToken::new();
    let client = match SpotifyClient::from_settings(&settings) {
        Ok(client) => client.with_cancellation(cancel.clone()),
        Err(e) => error!("Cannot create client. Err: {}", e),
    };

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    match cli.command {
        Command::Track(opt) => cli::track(&client, &opt.id).await,
        Command::Tracks(opt) => cli::tracks(&client, &opt.ids).await,
        Command::Devices => cli::devices(&client).await,
        Command::Playing => cli::playing(&client).await,
        Command::Saved(opt) => cli::saved(&client, opt.kind, opt.limit, opt.offset).await,
        Command::Following(opt) => cli::following(&client, opt.limit, opt.all).await,
        Command::Follows(opt) => cli::follows(&client, &opt.ids).await,
        Command::Search(opt) => cli::search(&client, &opt.query, &opt.types, opt.limit).await,
        Command::Playlist(opt) => cli::playlist(&client, &opt.id).await,
        Command::Completions(_) => {}
    }
}
