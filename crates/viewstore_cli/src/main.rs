//! ViewStore CLI
//!
//! Command-line front end for a ViewStore media-view store.
//!
//! # Commands
//!
//! - `import` - Merge one or more delimited files into the store
//! - `query` - Select, filter and order stored records
//! - `dropdata` - Delete the store file

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use viewstore_core::{Datastore, Schema};

/// ViewStore media-view store tools.
#[derive(Parser)]
#[command(name = "viewstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, long, default_value = "data/datastore.psv")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import pipe-delimited files into the store
    Import {
        /// Files to import, comma separated
        #[arg(short = 'p', long = "path", value_delimiter = ',', required = true)]
        paths: Vec<PathBuf>,
    },

    /// Query the store
    Query {
        /// Fields to print, comma separated
        #[arg(short = 's', long = "select", value_delimiter = ',')]
        select: Vec<String>,

        /// Sort keys as field[:asc|desc], comma separated (at most two)
        #[arg(short = 'o', long = "order", value_delimiter = ',')]
        order: Vec<String>,

        /// Filters as field=value; quoted values may span several words
        #[arg(short = 'f', long = "filter", num_args = 1..)]
        filter: Vec<String>,
    },

    /// Delete all stored data
    Dropdata,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = Datastore::new(cli.store, Schema::media_views());

    match cli.command {
        Commands::Import { paths } => {
            commands::import::run(&store, &paths).await?;
        }
        Commands::Query {
            select,
            order,
            filter,
        } => {
            commands::query::run(&store, &select, &order, &filter).await?;
        }
        Commands::Dropdata => {
            commands::dropdata::run(&store).await?;
        }
        Commands::Version => {
            println!("ViewStore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("ViewStore Core v{}", viewstore_core::VERSION);
        }
    }

    Ok(())
}
