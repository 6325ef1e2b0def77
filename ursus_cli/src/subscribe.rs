//! Long-lived subscription printing each message as a JSON line.

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ursus::SubscribeEvent;

use crate::ship::ShipArgs;

/// Arguments for the subscribe command.
#[derive(Debug, clap::Parser)]
pub(crate) struct SubscribeArgs {
    /// Ship to subscribe on, without the leading ~
    #[arg(long)]
    pub(crate) ship: String,

    /// App to subscribe to
    #[arg(long)]
    pub(crate) app: String,

    /// Subscription path
    #[arg(long)]
    pub(crate) path: String,
}

/// Print messages until the subscription ends or the user cancels.
pub(crate) async fn run(
    ship: ShipArgs,
    args: SubscribeArgs,
    token: CancellationToken,
) -> Result<()> {
    let channel = ship.login().await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = channel
        .subscribe(&args.ship, &args.app, &args.path, move |event| {
            let _ = tx.send(event);
        })
        .await?;

    tracing::info!("Subscription {} opened on {}", id, args.path);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(SubscribeEvent::Success) => tracing::info!("Subscription {} acknowledged", id),
                Some(SubscribeEvent::Message(json)) => println!("{json}"),
                Some(SubscribeEvent::Quit) => {
                    tracing::info!("Subscription {} closed by ship", id);
                    break;
                }
                Some(SubscribeEvent::Failure(e)) => bail!("subscription {id} failed: {e}"),
                None => break,
            },
            () = token.cancelled() => {
                tracing::info!("Unsubscribing...");
                channel.unsubscribe(id).await?;
                break;
            }
        }
    }

    channel.delete_channel().await?;
    Ok(())
}
