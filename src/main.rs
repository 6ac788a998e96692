use std::{fs::OpenOptions, sync::Mutex};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt};

use crypto_etl::{
    cli::Cli,
    configuration::{get_configuration, AppState, State},
    error::Error,
    handler::crypto_prices,
    provider::{DatabasePool, HTTP},
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let result = app_main().await;

    if let Err(err) = &result {
        error!("etl run failed: {}", err);
    }

    result
}

async fn app_main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    info!("etl run started");

    let config = get_configuration()?;
    let database = DatabasePool::new(&config).await?;
    let http = HTTP::new(config.clone())?;

    let state = State::new(config, database, http).await?;
    let app_state = AppState::new(state);

    let summary = crypto_prices::fetch_insert(app_state).await?;
    info!(
        "etl run finished: fetched {}, loaded {}, skipped {}, dropped {}",
        summary.fetched, summary.loaded, summary.skipped, summary.dropped
    );

    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<(), Error> {
    match &cli.log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let subscriber = tracing_subscriber::registry()
                .with(LevelFilter::INFO)
                .with(fmt::layer().compact())
                .with(
                    fmt::layer()
                        .compact()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                );
            tracing::subscriber::set_global_default(subscriber)?;
        },
        None => {
            let subscriber = tracing_subscriber::registry()
                .with(LevelFilter::INFO)
                .with(fmt::layer().compact());
            tracing::subscriber::set_global_default(subscriber)?;
        },
    }

    Ok(())
}
