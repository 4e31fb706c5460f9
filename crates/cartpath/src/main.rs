//! cartpath: plans, watchlist and deal selection from the terminal

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use cartpath::{execute_command, App, Commands, Config};

#[derive(Parser)]
#[command(name = "cartpath")]
#[command(about = "Shopping plans, watchlist and deal selection for Cartpath")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "cartpath.toml")]
    config: String,

    /// Data directory for the local mirror
    #[arg(short, long, env = "CARTPATH_DATA_DIR")]
    data_dir: Option<String>,

    /// Backend base URL (overrides config file)
    #[arg(long, env = "CARTPATH_API_URL")]
    api_url: Option<String>,

    /// Signed-in user (overrides config file)
    #[arg(long, env = "CARTPATH_USER_ID")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cartpath=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Config file: {}", cli.config);

    let mut config = Config::load(std::path::Path::new(&cli.config))?;

    // Apply CLI overrides
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = PathBuf::from(data_dir);
    }
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    if let Some(user) = cli.user {
        config.session.user_id = Some(user);
    }

    info!("Backend: {}", config.api.base_url);
    info!("Data dir: {}", config.storage.data_dir.display());

    let app = App::open(&config)?;

    match execute_command(&app, cli.command).await {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
