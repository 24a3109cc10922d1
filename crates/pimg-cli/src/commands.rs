use colored::Colorize;
use pimg_server::{ImageServer, ServerConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConfigArgs};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Config(args) => cmd_config(args),
    }
}

async fn cmd_serve(args: ConfigArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;
    init_logging(&config)?;
    println!(
        "{} product images on {} (store: {})",
        "▶".green().bold(),
        config.bind_addr.to_string().bold(),
        config.base_path.display()
    );
    ImageServer::new(config).serve().await?;
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// `RUST_LOG` wins over the configured level when it is set.
fn init_logging(config: &ServerConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    tracing::debug!(level = %config.log_level, "logging initialised");
    Ok(())
}
