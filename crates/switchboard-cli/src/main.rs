//! Switchboard CLI
//!
//! Inspect, resolve and export provider catalogs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Switchboard - provider catalog tooling
#[derive(Parser)]
#[command(name = "switchboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Catalog project directory or switchboard.yaml (defaults to the embedded catalog)
    #[arg(short, long, env = "SWITCHBOARD_CATALOG")]
    catalog: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List provider ids
    List,

    /// Resolve a provider and print it as JSON
    Show {
        /// Provider id
        provider: String,

        /// Print only this module of the resolved provider
        #[arg(short, long)]
        module: Option<String>,

        /// Workspace substituted for {{.workspace}}
        #[arg(short, long)]
        workspace: Option<String>,

        /// Extra substitution, repeatable
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = commands::parse_var)]
        vars: Vec<(String, String)>,

        /// Print the registered template without resolving it
        #[arg(long)]
        raw: bool,
    },

    /// Export the catalog as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate every provider in the catalog
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let catalog = cli.catalog.as_deref();
    match cli.command {
        Commands::List => {
            commands::list::run(catalog).await?;
        }
        Commands::Show {
            provider,
            module,
            workspace,
            vars,
            raw,
        } => {
            let options = commands::show::ShowOptions {
                module,
                workspace,
                vars,
                raw,
            };
            commands::show::run(catalog, &provider, &options).await?;
        }
        Commands::Export { output } => {
            commands::export::run(catalog, output.as_deref()).await?;
        }
        Commands::Validate => {
            commands::validate::run(catalog).await?;
        }
    }

    Ok(())
}
