//! Goals CLI - track personal goals from the command line

use anyhow::Context;
use clap::Parser;
use goals_cli::{execute, logging::init_logging, Cli};
use goals_core::{ConfigLoader, GoalStore, GoalsConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let _log_guard = init_logging(&config, cli.verbose).context("Failed to initialize logging")?;

    let store = GoalStore::from_config(&config);
    let mut stdout = std::io::stdout().lock();
    execute(cli.command, &store, &mut stdout).await?;

    Ok(())
}

/// Defaults, config files and environment, then command-line flags on top
fn resolve_config(cli: &Cli) -> anyhow::Result<GoalsConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
        loader = loader.add_config_path(path);
    }

    let mut config = loader.load().context("Invalid configuration")?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir.clone_from(data_dir);
    }
    if cli.json_logs {
        config.json_logs = true;
    }
    Ok(config)
}
