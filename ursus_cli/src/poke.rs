//! One-shot poke.

use anyhow::{Context, Result, bail};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use ursus::PokeEvent;

use crate::ship::ShipArgs;

/// Arguments for the poke command.
#[derive(Debug, clap::Parser)]
pub(crate) struct PokeArgs {
    /// Ship to poke, without the leading ~
    #[arg(long)]
    pub(crate) ship: String,

    /// App to poke
    #[arg(long)]
    pub(crate) app: String,

    /// Mark of the payload
    #[arg(long)]
    pub(crate) mark: String,

    /// JSON payload
    #[arg(long, default_value = "null")]
    pub(crate) json: String,
}

/// Poke and wait for the result.
pub(crate) async fn run(ship: ShipArgs, args: PokeArgs, token: CancellationToken) -> Result<()> {
    let json: serde_json::Value =
        serde_json::from_str(&args.json).context("--json is not valid JSON")?;

    let channel = ship.login().await?;

    let (tx, rx) = oneshot::channel();
    let id = channel
        .poke(&args.ship, &args.app, &args.mark, &json, move |event| {
            let _ = tx.send(event);
        })
        .await?;

    tracing::info!("Poke {} sent, waiting for result", id);

    let event = tokio::select! {
        event = rx => event?,
        () = token.cancelled() => {
            channel.delete_channel().await?;
            bail!("cancelled before poke {id} completed");
        }
    };

    channel.delete_channel().await?;

    match event {
        PokeEvent::Success => {
            println!("ok");
            Ok(())
        }
        PokeEvent::Failure(e) => bail!("poke {id} failed: {e}"),
    }
}
