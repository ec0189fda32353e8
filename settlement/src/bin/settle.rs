//! Settle the epochs of an epoch file and print one JSON report per epoch

use anyhow::{bail, Context};
use ledger_core::Ed25519Verifier;
use settlement::{spawn_settlement_actor, Config, EpochFile, Metrics, TxHandler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::var("SETTLEMENT_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => Config::from_env()?,
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => bail!("usage: settle <epoch-file.json>"),
    };

    tracing::info!(service = %config.service_name, version = %config.service_version, "Starting settlement");

    let document = EpochFile::from_path(&path).with_context(|| format!("reading {}", path))?;
    tracing::info!(
        pool_size = document.pool.len(),
        epochs = document.epochs.len(),
        "Epoch file loaded"
    );

    let mut handler = TxHandler::new(&document.pool, Ed25519Verifier);
    let metrics = if config.metrics.enabled {
        let metrics = Metrics::new()?;
        handler = handler.with_metrics(metrics.clone());
        Some(metrics)
    } else {
        None
    };

    let (handle, join) = spawn_settlement_actor(handler, config.actor.mailbox_capacity);

    for candidates in document.epochs {
        let report = handle.settle_epoch(candidates).await?;
        println!("{}", serde_json::to_string(&report)?);
    }

    handle.shutdown().await?;
    let handler = join.await?;
    tracing::info!(
        epochs = handler.epoch(),
        pool_size = handler.pool().len(),
        "Settlement finished"
    );

    if let Some(metrics) = metrics {
        tracing::debug!("Final metrics:\n{}", metrics.gather());
    }

    Ok(())
}
