mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};

use retracker_core::{
    load_optional_config, validate_config, LoopDriver, QBittorrentClient, RunError,
    SanitizedConfig, TrackerRewriter, EXIT_RUN_ERROR, EXIT_SUCCESS,
};

use cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let code = match run(args).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            e.downcast_ref::<RunError>()
                .map_or(EXIT_RUN_ERROR, RunError::exit_code)
        }
    };
    std::process::exit(code);
}

async fn run(args: Args) -> Result<()> {
    let file_config = load_optional_config(args.config.as_deref());

    // Initialize logging before reporting any config problem
    let file_verbose = file_config.as_ref().is_ok_and(|c| c.verbose);
    logging::init(args.verbose || file_verbose, args.log_json);

    let mut config = file_config.map_err(RunError::from)?;
    args.apply(&mut config);

    debug!(
        "Effective configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    validate_config(&config).map_err(RunError::from)?;
    let client_config = config.client_config().map_err(RunError::from)?;

    info!("Connecting to qBittorrent at {}", client_config.url);
    let client = QBittorrentClient::new(client_config).context("Failed to create HTTP client")?;
    let rewriter =
        TrackerRewriter::from_config(&config, Arc::new(client)).map_err(RunError::from)?;

    if rewriter.is_preview() {
        info!("Preview mode: no tracker will be edited");
    }

    if config.schedule.enabled {
        LoopDriver::new(rewriter, config.schedule.interval())
            .run_forever()
            .await;
        return Ok(());
    }

    let summary = rewriter.run_once().await?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
        );
    }

    Ok(())
}
