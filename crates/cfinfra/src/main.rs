mod commands;
mod parser;
mod project;

use clap::{Parser, Subcommand};
use project::Project;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cfinfra")]
#[command(about = "Declarative Cloud Foundry orgs, domains and isolation segments", long_about = None)]
struct Cli {
    /// Definition file (defaults to infra.kdl discovery in --dir)
    #[arg(short, long, global = true, env = "CFINFRA_FILE")]
    file: Option<PathBuf>,

    /// Project directory holding definitions and .cfinfra/state.json
    #[arg(short = 'C', long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the changes needed to match the definitions
    Plan,
    /// Apply the changes needed to match the definitions
    Apply {
        /// Apply without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete managed objects (all of them without an address)
    Destroy {
        /// Resource address, e.g. cloudfoundry_org.org1
        address: Option<String>,
        /// Destroy without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// List resources recorded in the state file
    State,
    /// Check the cf CLI credentials against the Cloud Controller
    Auth,
    /// Check the definitions without contacting the Cloud Controller
    Validate,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match cli.command {
        Commands::Version => {
            println!("cfinfra {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Auth => commands::auth::handle().await,
        Commands::State => commands::state::handle(&cli.dir).await,
        Commands::Validate => {
            let project = Project::load(&cli.dir, cli.file.as_deref())?;
            commands::validate::handle(&project)
        }
        Commands::Plan => {
            let project = Project::load(&cli.dir, cli.file.as_deref())?;
            commands::plan::handle(&project).await
        }
        Commands::Apply { yes } => {
            let project = Project::load(&cli.dir, cli.file.as_deref())?;
            commands::apply::handle(&project, yes).await
        }
        Commands::Destroy { address, yes } => {
            let project = Project::load(&cli.dir, cli.file.as_deref())?;
            commands::destroy::handle(&project, address, yes).await
        }
    }
}
