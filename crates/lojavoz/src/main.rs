mod record;
mod stores;
mod upload;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lojavoz_common::{logger, AppConfig};
use std::path::PathBuf;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        // Fallback to default dotenv behavior
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "lojavoz")]
#[command(about = "Lojavoz - voice memos from the store floor to the shared ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the upload-transcribe-append server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to bind to
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Record a voice memo and submit it
    Record {
        /// Store id from the registry (interactive selection when omitted)
        #[arg(long)]
        store: Option<String>,

        /// Pipeline endpoint base URL
        #[arg(long, default_value = "http://localhost:3000")]
        endpoint: String,
    },

    /// List the store registry
    Stores,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env at project root
    load_dotenv_from_project_root();

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            // Override with CLI arguments
            std::env::set_var("SERVER_HOST", &host);
            std::env::set_var("PORT", port.to_string());

            let config = AppConfig::from_env()?;
            config.validate()?;

            logger::setup_logging(&config.log_dir, &config.log_level)?;

            tracing::info!("Lojavoz starting...");
            tracing::info!("  Host: {}", host);
            tracing::info!("  Port: {}", port);
            tracing::info!("  Upload dir: {}", config.upload_dir.display());

            println!("Servidor rodando na porta {}", port);

            lojavoz_server::start_server(config).await?;
        }
        Some(Commands::Record { store, endpoint }) => {
            logger::setup_console_logging("warn")?;
            record::run(store, endpoint).await?;
        }
        Some(Commands::Stores) => {
            for store in stores::list() {
                println!("{}  {} - {}", store.id, store.name, store.location);
            }
        }
        None => {
            // Default: start server with env-driven config
            let config = AppConfig::from_env()?;
            config.validate()?;
            logger::setup_logging(&config.log_dir, &config.log_level)?;

            let bind_addr = config.server_bind_address();
            println!("Servidor rodando na porta {}", config.server_port);
            tracing::info!("Lojavoz starting with default configuration on {}", bind_addr);

            lojavoz_server::start_server(config).await?;
        }
    }

    Ok(())
}
