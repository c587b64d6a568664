//! patron-daemon: the contribution engine daemon.
//!
//! Single OS process running a Tokio async runtime. Opens the database,
//! wires up the engine's collaborators and runs the scheduler until
//! shutdown.

mod config;

use std::sync::Arc;

use tracing::info;

use patron_db::Db;
use patron_engine::{Collaborators, ContributionEngine};
use patron_jobs::{OsRandomizer, SystemClock};
use patron_payments::{EnvironmentConfig, HttpFetcher, UrlFetcher};
use patron_wallet::ExternalWalletManager;

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("patron={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Patron daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let db = Db::open(&data_dir.join("patron.db"))?;

    let options = config.engine_options();
    let environment_config = EnvironmentConfig::for_environment(options.environment);
    let fetcher: Arc<dyn UrlFetcher> = Arc::new(HttpFetcher::new());
    let wallet = Arc::new(ExternalWalletManager::new(
        fetcher.clone(),
        environment_config,
    ));

    let engine = ContributionEngine::new(Collaborators {
        db,
        options,
        fetcher,
        wallet,
        randomizer: Arc::new(OsRandomizer),
        clock: Arc::new(SystemClock),
    });

    engine.initialize();
    info!("Contribution engine initialized");

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");

    // In-flight jobs are abandoned; their persisted state resumes on the
    // next launch.
    info!("Daemon stopped");
    Ok(())
}
