#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the chipping backend.
//!
//! Creates the database schema, seeds the default accounts and optional
//! demo data, and runs the HTTP server. Configuration comes from the
//! same environment variables the server reads; flags override them.

mod seed;

use std::path::PathBuf;

use chipping_database::db;
use chipping_database::store::SqlStore;
use chipping_server::ServerConfig;
use clap::{Parser, Subcommand};

/// Manage and serve the chipping backend.
#[derive(Parser)]
#[command(name = "chipping_cli")]
#[command(about = "Manage and serve the chipping backend")]
struct Cli {
    /// Path to the `SQLite` database (defaults to `DATABASE_PATH` or
    /// `data/chipping.db`).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create the database schema.
    Init,

    /// Create the default admin, chipper, and user accounts.
    SeedAccounts,

    /// Insert a demo area and animal movements for March 2023.
    SeedDemo,

    /// Run the HTTP server.
    Serve {
        /// Listen address (overrides `BIND_ADDR`).
        #[arg(long)]
        bind_addr: Option<String>,

        /// Listen port (overrides `PORT`).
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env();
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }

    match cli.command {
        Commands::Init => {
            db::open_db(&config.db_path).await?;
            println!("Schema ready at {}", config.db_path.display());
        }
        Commands::SeedAccounts => {
            let store = SqlStore::new(db::open_db(&config.db_path).await?);
            let inserted = seed::seed_accounts(&store, &config.password_salt).await?;
            println!("Seeded {inserted} account(s)");
        }
        Commands::SeedDemo => {
            let store = SqlStore::new(db::open_db(&config.db_path).await?);
            seed::seed_demo(&store).await?;
            println!("Seeded demo data");
        }
        Commands::Serve { bind_addr, port } => {
            if let Some(bind_addr) = bind_addr {
                config.bind_addr = bind_addr;
            }
            if let Some(port) = port {
                config.port = port;
            }

            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(chipping_server::run_server(config))
            })
            .await??;
        }
    }

    Ok(())
}
