use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront::config::Config;
use storefront::server::{AppState, create_router};
use storefront::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Storefront catalog and code verification server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// TOML configuration file
    #[arg(long, short, env = "STOREFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply the schema
    Init {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Start the server
    Serve {
        #[command(flatten)]
        common: CommonArgs,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,
    },
}

fn load_config(common: &CommonArgs) -> anyhow::Result<Config> {
    let mut config = Config::load(common.config.as_deref())?;
    if let Some(database) = &common.database {
        config.store.path = database.clone();
    }
    Ok(config)
}

fn run_init(config: &Config) -> anyhow::Result<()> {
    let path = &config.store.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::new(path)?;
    store.initialize()?;

    println!("Database ready at {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("storefront=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { common } => {
            let config = load_config(&common)?;
            run_init(&config)?;
        }
        Commands::Serve { common, host, port } => {
            let mut config = load_config(&common)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let state = Arc::new(AppState::from_config(&config)?);
            info!("Database at {}", config.store.path.display());

            let app = create_router(state);
            let addr = config.server.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
