//! Mockable - CLI Entry Point

use anyhow::Result;
use clap::Parser;
use mockable::server::MockServer;
use mockable::{MockInterceptor, MockableConfig, Registry};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "mockable",
    about = "Serve default-valued mocks for declared controller actions",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mockable.yaml")]
    config: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let default_config = include_str!("../demos/default-config.yaml");
        println!("{}", default_config);
        return Ok(());
    }

    let config = if args.config.exists() {
        info!(path = ?args.config, "Loading configuration");
        MockableConfig::from_file(&args.config)?
    } else if args.validate {
        anyhow::bail!("Configuration file not found: {:?}", args.config);
    } else {
        info!("Using default configuration (no routes)");
        MockableConfig::default()
    };

    // Materializes every mock; a shape without a parameterless constructor
    // stops startup here.
    let registry = Registry::from_config(&config)?;

    if args.validate {
        println!(
            "Configuration is valid ({} routes registered)",
            registry.len()
        );
        return Ok(());
    }

    let interceptor = MockInterceptor::new(Arc::new(registry), config.settings.clone());
    MockServer::new(args.listen, Arc::new(interceptor), config.default_response)
        .run()
        .await
}
