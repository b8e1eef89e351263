use anyhow::{Context, Result};
use clap::Parser;
use parley::cli::{self, Cli, Command};
use parley::config::ParleyConfig;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ParleyConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    // eframe wants the main thread, so only the terminal commands run inside the runtime
    match cli.command.unwrap_or(Command::Ui) {
        Command::Debate(args) => {
            info!("Starting terminal debate");
            let runtime = Runtime::new().context("Failed to start tokio runtime")?;
            let transcript = runtime.block_on(cli::run_debate(config, args))?;
            info!("Debate finished with {} turns", transcript.len());
        }

        Command::Assistant(args) => {
            info!("Starting assistant");
            let runtime = Runtime::new().context("Failed to start tokio runtime")?;
            runtime.block_on(cli::run_assistant(config, args))?;
        }

        Command::Ui => {
            info!("Starting Parley UI");
            parley::ui::run(config).map_err(|e| anyhow::anyhow!("UI error: {}", e))?;
        }
    }

    Ok(())
}
