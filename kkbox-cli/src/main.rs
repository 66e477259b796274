use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use kkbox_api::{ClientConfig, KkboxClient, TicketPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kkbox", version, about = "KKBOX API client & KKDRM downloader")]
struct Cli {
    #[command(flatten)]
    auth: AuthArgs,
    /// Verbose logging (overridden by `RUST_LOG`)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct AuthArgs {
    /// Response envelope key (32 hex chars)
    #[arg(long, env = "KKBOX_KC1_KEY", hide_env_values = true)]
    kc1_key: String,
    /// Request signing key (32 hex chars)
    #[arg(long, env = "KKBOX_SECRET_KEY", hide_env_values = true)]
    secret_key: String,
    /// Account email
    #[arg(long, env = "KKBOX_EMAIL")]
    email: String,
    /// Account password
    #[arg(long, env = "KKBOX_PASSWORD", hide_env_values = true)]
    password: String,
    /// Device id (random if omitted)
    #[arg(long, env = "KKBOX_KKID")]
    kkid: Option<String>,
    /// Proxy URL for all requests
    #[arg(long, env = "KKBOX_PROXY")]
    proxy: Option<String>,
    /// Give up on a ticket after this many requests
    #[arg(long)]
    max_ticket_attempts: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and show the account's quality tiers
    Login,
    /// Show song metadata
    Song {
        /// Song ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Search the catalog
    Search {
        /// Search text
        query: String,
        /// Result types
        #[arg(short = 't', long, value_delimiter = ',', default_value = "song")]
        types: Vec<String>,
        /// Max results
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
    /// Print playback URIs for a song
    Ticket {
        /// Song id
        song_id: String,
        /// Play mode hint
        #[arg(long)]
        play_mode: Option<String>,
    },
    /// Download and decrypt a song
    Download {
        /// Song id
        song_id: String,
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = connect(&cli.auth)?;
    match cli.command {
        Command::Login => cmd_login(&client),
        Command::Song { ids } => cmd_song(&client, &ids),
        Command::Search {
            query,
            types,
            limit,
        } => cmd_search(&client, &query, &types, limit),
        Command::Ticket { song_id, play_mode } => {
            cmd_ticket(&client, &song_id, play_mode.as_deref())
        }
        Command::Download { song_id, output } => cmd_download(&client, &song_id, output),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn connect(auth: &AuthArgs) -> Result<KkboxClient> {
    let mut config = ClientConfig::new(auth.kc1_key.clone(), auth.secret_key.clone())
        .with_ticket_policy(TicketPolicy {
            max_attempts: auth.max_ticket_attempts,
            ..TicketPolicy::default()
        });
    if let Some(kkid) = &auth.kkid {
        config = config.with_kkid(kkid.clone());
    }
    if let Some(proxy) = &auth.proxy {
        config = config.with_proxy(proxy.clone());
    }

    let client = KkboxClient::new(&config).context("failed to build client")?;
    client
        .login(&auth.email, &auth.password)
        .context("login failed")?;
    Ok(client)
}

// ── login ──

fn cmd_login(client: &KkboxClient) -> Result<()> {
    let qualities: Vec<String> = client
        .available_qualities()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("Logged in (kkid={})", client.kkid());
    println!("Qualities: {}", qualities.join(", "));
    Ok(())
}

// ── song / search ──

fn cmd_song(client: &KkboxClient, ids: &[String]) -> Result<()> {
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    let songs = client.songs(&ids)?;
    println!("{}", serde_json::to_string_pretty(&songs)?);
    Ok(())
}

fn cmd_search(client: &KkboxClient, query: &str, types: &[String], limit: u32) -> Result<()> {
    let types: Vec<&str> = types.iter().map(String::as_str).collect();
    match client.search(query, &types, limit)? {
        Some(resp) => println!("{}", serde_json::to_string_pretty(&resp)?),
        None => println!("No results."),
    }
    Ok(())
}

// ── ticket / download ──

fn cmd_ticket(client: &KkboxClient, song_id: &str, play_mode: Option<&str>) -> Result<()> {
    let ticket = client.ticket(song_id, play_mode)?;
    for uri in &ticket.uris {
        println!("{uri}");
    }
    Ok(())
}

fn cmd_download(client: &KkboxClient, song_id: &str, output: Option<PathBuf>) -> Result<()> {
    let ticket = client.ticket(song_id, None)?;
    let Some(uri) = ticket.uris.first() else {
        bail!("ticket for {song_id} has no URIs");
    };

    let dest = output.unwrap_or_else(|| PathBuf::from(format!("{song_id}.bin")));
    let report = client
        .download(uri, &dest)
        .with_context(|| format!("download to {} failed", dest.display()))?;
    println!(
        "Downloaded {} ({} bytes)",
        dest.display(),
        report.bytes_written
    );
    Ok(())
}
