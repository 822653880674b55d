use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};

use vibe_migrate::cli::Args;
use vibe_migrate::config::Config;
use vibe_migrate::coordinator::MigrationCoordinator;
use vibe_migrate::phase::RunStatus;
use vibe_migrate::{logging, provider, ux};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    logging::init_logger(args.debug);

    let mut cfg = Config::load(args.config.as_deref())?;
    cfg.apply_args(&args);

    let prov = provider::make_provider(&cfg.model)?;
    let mut team = MigrationCoordinator::from_config(&cfg, prov).await?;

    let outcome = team.run().await;
    let status = match &outcome {
        Ok(s) => *s,
        Err(e) => {
            error!(error = %e, "migration aborted");
            RunStatus::Aborted
        }
    };

    ux::print_run_dashboard(team.results(), Some(status));

    if cfg.dry_run {
        info!("dry run: results not written");
    } else {
        match team.save() {
            Ok(saved) => info!(dir = %saved.dir.display(), "results available"),
            Err(e) => warn!(error = %format!("{e:#}"), "could not save results"),
        }
    }

    Ok(ExitCode::from(status.exit_code() as u8))
}
