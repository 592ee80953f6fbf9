//! bandprep CLI — timed IELTS practice tests in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bandprep", version, about = "IELTS practice-test harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a practice test
    Take {
        /// Path to a .toml test catalog
        #[arg(long)]
        catalog: PathBuf,

        /// Use canned offline explanations; no config or network needed
        #[arg(long)]
        offline: bool,

        /// Override the catalog's time limit, in seconds
        #[arg(long)]
        duration_secs: Option<u32>,

        /// Output directory for the session report
        #[arg(long, default_value = "./bandprep-results")]
        output: PathBuf,

        /// Output format: json, html, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate test catalog TOML files
    Validate {
        /// Path to a catalog file or directory
        #[arg(long)]
        catalog: PathBuf,
    },

    /// List available test catalogs
    List {
        /// Catalog directory (defaults to the configured one)
        #[arg(long)]
        catalog_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show a saved session report
    Review {
        /// Path to a report JSON file
        #[arg(long)]
        report: PathBuf,

        /// Also print the per-question explanations
        #[arg(long)]
        explanations: bool,
    },

    /// Manage the signed-in account
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and example catalog
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bandprep=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            catalog,
            offline,
            duration_secs,
            output,
            format,
            config,
        } => commands::take::execute(catalog, offline, duration_secs, output, format, config).await,
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::List { catalog_dir, config } => commands::list::execute(catalog_dir, config),
        Commands::Review { report, explanations } => {
            commands::review::execute(report, explanations)
        }
        Commands::Account { action, config } => commands::account::execute(action, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
