use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedsky::app::AppContext;
use feedsky::cli::{commands, Cli, Commands};
use feedsky::config::Config;
use feedsky::domain::Credentials;
use feedsky::publisher::PublishOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Publish(args) => {
            let options = PublishOptions::from(&args);
            // A dry run never authenticates.
            let credentials = if options.dry_run {
                Credentials::default()
            } else {
                Credentials::from_env()?
            };
            commands::publish(&ctx, credentials, &options).await?;
        }
        Commands::Profile => {
            commands::profile(&ctx, Credentials::from_env()?).await?;
        }
    }

    Ok(())
}
