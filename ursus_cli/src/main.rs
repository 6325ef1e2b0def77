//! Command-line client for Urbit-style channels.

mod poke;
mod ship;
mod subscribe;

use clap::Parser;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let token = CancellationToken::new();
    let hits = Arc::new(AtomicUsize::new(0));
    {
        let token = token.clone();
        let hits = hits.clone();
        tokio::spawn(async move {
            loop {
                if tokio::signal::ctrl_c().await.is_ok() {
                    match hits.fetch_add(1, Ordering::Relaxed) {
                        0 => {
                            eprintln!("Ctrl+C: closing channel (press again to force)");
                            token.cancel();
                        }
                        _ => {
                            eprintln!("Force exiting.");
                            std::process::exit(130);
                        }
                    }
                }
            }
        });
    }

    let args = Arguments::parse();

    match args.command {
        Command::Poke(poke_args) => poke::run(args.ship, poke_args, token).await,
        Command::Subscribe(sub_args) => subscribe::run(args.ship, sub_args, token).await,
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "CLI for Urbit-style channels")]
struct Arguments {
    #[command(flatten)]
    ship: ship::ShipArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Poke an app and wait for its result
    Poke(poke::PokeArgs),

    /// Subscribe to an app path and print every message
    Subscribe(subscribe::SubscribeArgs),
}
