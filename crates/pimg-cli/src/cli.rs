use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pimg_server::{ServerConfig, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_FILE_SIZE};

#[derive(Parser)]
#[command(
    name = "product-images",
    about = "Product images service: image uploads, retrieval, and the product catalog",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ConfigArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

/// Server settings. Every flag falls back to an environment variable.
#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    /// TOML file with the full configuration; other flags are ignored when set
    #[arg(long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Bind address for the server
    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:9091")]
    pub bind_address: SocketAddr,

    /// Log output level [trace, debug, info, warn, error]
    #[arg(long, env = "LOG_LEVEL", default_value = "debug")]
    pub log_level: String,

    /// Base path to save images
    #[arg(long, env = "BASE_PATH", default_value = "./imagestore")]
    pub base_path: PathBuf,

    /// Maximum size of one stored image in bytes
    #[arg(long, env = "MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Maximum size of a whole request body in bytes
    #[arg(long, env = "MAX_BODY_SIZE", default_value_t = DEFAULT_MAX_BODY_SIZE)]
    pub max_body_size: u64,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout: u64,

    /// CORS origin allowed to call the API; empty disables CORS
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = "http://localhost:3000")]
    pub allowed_origin: String,
}

impl ConfigArgs {
    /// Build the server configuration from the config file or from flags.
    pub fn resolve(&self) -> anyhow::Result<ServerConfig> {
        if let Some(path) = &self.config {
            return Ok(ServerConfig::load(path)?);
        }
        let config = ServerConfig {
            bind_addr: self.bind_address,
            log_level: self.log_level.clone(),
            base_path: self.base_path.clone(),
            max_file_size: self.max_file_size,
            max_body_size: self.max_body_size,
            request_timeout_secs: self.request_timeout,
            allowed_origin: Some(self.allowed_origin.trim())
                .filter(|o| !o.is_empty())
                .map(str::to_string),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cli: Cli) -> ConfigArgs {
        match cli.command {
            Command::Serve(args) | Command::Config(args) => args,
        }
    }

    #[test]
    fn parse_serve_defaults() {
        let cli = Cli::try_parse_from(["product-images", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve(_)));
        let config = args(cli).resolve().unwrap();
        assert_eq!(config.max_file_size, 5_120_000);
        assert_eq!(config.base_path, PathBuf::from("./imagestore"));
    }

    #[test]
    fn parse_serve_flags() {
        let cli = Cli::try_parse_from([
            "product-images",
            "serve",
            "--bind-address",
            "0.0.0.0:8080",
            "--base-path",
            "/data/images",
            "--max-file-size",
            "1024",
            "--allowed-origin",
            "",
        ])
        .unwrap();
        let config = args(cli).resolve().unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.base_path, PathBuf::from("/data/images"));
        assert_eq!(config.max_file_size, 1024);
        assert!(config.allowed_origin.is_none());
    }

    #[test]
    fn parse_config_command() {
        let cli = Cli::try_parse_from(["product-images", "config"]).unwrap();
        assert!(matches!(cli.command, Command::Config(_)));
    }

    #[test]
    fn invalid_limits_rejected() {
        let cli = Cli::try_parse_from([
            "product-images",
            "serve",
            "--max-file-size",
            "2048",
            "--max-body-size",
            "1024",
        ])
        .unwrap();
        assert!(args(cli).resolve().is_err());
    }

    #[test]
    fn bad_bind_address_rejected() {
        assert!(Cli::try_parse_from(["product-images", "serve", "--bind-address", "nowhere"]).is_err());
    }
}
