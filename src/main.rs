//! Replays a file of raw transactions through the engine and prints the
//! resulting snapshot as JSON.
//!
//! ```text
//! entitlement-engine transactions.json [config.toml]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use entitlement_engine::adapters::{
    ChannelTransactionFeed, MockPurchaseProvider, StaticCatalogSource, SystemClock,
};
use entitlement_engine::application::{EngineCollaborators, SubscriptionEngine};
use entitlement_engine::config::AppConfig;
use entitlement_engine::domain::entitlement::RawTransaction;
use entitlement_engine::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args_os().skip(1);
    let Some(transactions_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: entitlement-engine <transactions.json> [config-file]");
        return ExitCode::from(2);
    };
    let config_path = args.next().map(PathBuf::from);

    match run(transactions_path, config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Replay failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    transactions_path: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load()?,
    };
    config.validate()?;
    telemetry::init(&config.telemetry);

    let contents = std::fs::read_to_string(&transactions_path)?;
    let records: Vec<RawTransaction> = serde_json::from_str(&contents)?;
    tracing::info!(
        path = %transactions_path.display(),
        records = records.len(),
        signed = config.verification.is_signed(),
        "Replaying transactions"
    );

    let feed = ChannelTransactionFeed::new();
    feed.set_current_entitlements(records);

    let engine = SubscriptionEngine::new(
        EngineCollaborators {
            verifier: config.verification.build_verifier(),
            catalog_source: Arc::new(StaticCatalogSource::new(config.catalog.products()?)),
            feed: Arc::new(feed),
            purchase_provider: Arc::new(MockPurchaseProvider::new()),
            clock: Arc::new(SystemClock),
        },
        config.engine_settings()?,
    );

    engine.start().await?;

    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    Ok(())
}
