//! Rollerball arbiter: connects two engines over the link and referees a
//! game between them.
//!
//! `arbiter match` plays white against black and mirrors the front-end
//! state (connection flag plus per-side move lists) from the event stream.
//! `arbiter probe` checks that a single engine answers the handshake.

mod config;
mod runner;
mod scoreboard;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rollerball_link::{EngineLink, LinkEvent, SessionId, Side};
use tokio::sync::oneshot;
use tokio_stream::{Stream, StreamExt};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use runner::{run_match, MatchSettings};
use scoreboard::Scoreboard;

/// How long `probe` waits for the handshake.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "arbiter", about = "Referee games between rollerball engines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Write logs to a daily rolling file in this directory instead of stderr.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game between a white and a black engine.
    Match(MatchArgs),
    /// Connect to one engine, print its identity and disconnect.
    Probe {
        /// `host:port`, `tcp://host:port` or `exec:<program> [args...]`.
        endpoint: String,
    },
}

#[derive(Args)]
struct MatchArgs {
    /// White engine endpoint (default: $ROLLERBALL_WHITE_ENDPOINT or 127.0.0.1:8181).
    #[arg(long)]
    white: Option<String>,

    /// Black engine endpoint (default: $ROLLERBALL_BLACK_ENDPOINT or 127.0.0.1:8182).
    #[arg(long)]
    black: Option<String>,

    /// Thinking time per move in milliseconds.
    #[arg(long, default_value_t = config::DEFAULT_MOVETIME_MS)]
    movetime: u64,

    /// Stop the game after this many plies.
    #[arg(long, default_value_t = config::DEFAULT_MAX_PLIES)]
    max_plies: usize,

    /// Board variant announced with `ucinewgame`.
    #[arg(long)]
    variant: Option<String>,

    /// Total game time in milliseconds announced with `ucinewgame`.
    #[arg(long)]
    game_time: Option<u64>,

    /// Send the bare rollerball form `go <ms>` instead of `go movetime <ms>`.
    #[arg(long)]
    bare_go: bool,

    /// Print every link event and the final result as JSON lines.
    #[arg(long)]
    json: bool,
}

fn prepare_log_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))
}

/// Install the global subscriber. Returns the guard that flushes the file
/// writer; it must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            prepare_log_dir(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "rollerball-arbiter");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Match(args) => play(args).await,
        Commands::Probe { endpoint } => probe(&endpoint).await,
    }
}

async fn play(args: MatchArgs) -> anyhow::Result<()> {
    let white_endpoint = config::resolve_endpoint(Side::White, args.white.as_deref())
        .context("invalid white endpoint")?;
    let black_endpoint = config::resolve_endpoint(Side::Black, args.black.as_deref())
        .context("invalid black endpoint")?;

    let link = EngineLink::from_env();
    let events = link.events();

    let white = link
        .connect(white_endpoint.clone())
        .await
        .with_context(|| format!("connecting white engine at {}", white_endpoint))?;
    let black = link
        .connect(black_endpoint.clone())
        .await
        .with_context(|| format!("connecting black engine at {}", black_endpoint))?;

    let (stop_tx, stop_rx) = oneshot::channel();
    let mirror = tokio::spawn(mirror_events(
        events,
        Scoreboard::new(white, black),
        args.json,
        stop_rx,
    ));

    let settings = MatchSettings {
        movetime_ms: args.movetime,
        max_plies: args.max_plies,
        variant: args.variant,
        game_time_ms: args.game_time,
        bare_go: args.bare_go,
    };
    let outcome = run_match(&link, white, black, &settings).await;

    disconnect_all(&link, [white, black]).await;
    let _ = stop_tx.send(());
    let board = mirror.await.context("event mirror task failed")?;

    let outcome = outcome.context("match aborted")?;
    if args.json {
        println!(
            "{}",
            serde_json::json!({ "result": outcome.end, "scoreboard": board })
        );
    } else {
        println!("Result: {:?}", outcome.end);
        println!("Plies:  {}", outcome.history.len());
        let moves: Vec<&str> = outcome.history.plies().map(|m| m.as_str()).collect();
        println!("Moves:  {}", moves.join(" "));
    }
    Ok(())
}

async fn probe(endpoint: &str) -> anyhow::Result<()> {
    let endpoint = endpoint.parse().context("invalid endpoint")?;
    let link = EngineLink::from_env();
    let id = link.connect(endpoint).await?;

    let ready = tokio::time::timeout(PROBE_TIMEOUT, link.wait_ready(id)).await;
    let snapshot = link.snapshot(id).await;
    disconnect_all(&link, [id]).await;

    ready
        .context("engine did not answer the handshake")?
        .context("handshake failed")?;
    let identity = snapshot.context("session vanished after handshake")?.identity;
    println!(
        "name:   {}",
        identity.name.as_deref().unwrap_or("(not reported)")
    );
    println!(
        "author: {}",
        identity.author.as_deref().unwrap_or("(not reported)")
    );
    Ok(())
}

async fn disconnect_all<const N: usize>(link: &EngineLink, ids: [SessionId; N]) {
    for id in ids {
        if let Err(e) = link.disconnect(id).await {
            tracing::debug!("Session {} already gone: {}", id, e);
        }
    }
}

/// Feed link events into the scoreboard until told to stop. Events already
/// queued when the stop signal arrives are still applied.
async fn mirror_events(
    events: impl Stream<Item = LinkEvent>,
    mut board: Scoreboard,
    json: bool,
    mut stop: oneshot::Receiver<()>,
) -> Scoreboard {
    tokio::pin!(events);
    loop {
        tokio::select! {
            biased;

            event = events.next() => match event {
                Some(event) => {
                    if json {
                        match serde_json::to_string(&event) {
                            Ok(line) => println!("{}", line),
                            Err(e) => tracing::warn!("Failed to serialize event: {}", e),
                        }
                    }
                    board.apply(&event);
                }
                None => break,
            },

            _ = &mut stop => break,
        }
    }
    board
}
