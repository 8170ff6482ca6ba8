mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use msibind_lib::config::BindConfig;

/// msibind - bind-time engine for installer packages
#[derive(Parser)]
#[command(name = "msibind")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Bind configuration file (TOML)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Probe files, generate component GUIDs, assign media and sequence a product
  Media {
    /// Linked product or module (JSON)
    file: PathBuf,

    /// Write the bound output here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Split a transform or patch into target and updated snapshots
  Transform {
    /// Transform or patch document (JSON)
    file: PathBuf,

    /// Directory receiving target.json and updated.json
    #[arg(long)]
    out_dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Order a bundle chain and assign rollback boundaries
  Chain {
    /// Chain document (JSON)
    file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Print the stable identifier of an input string
  Guid {
    input: String,

    /// Namespace UUID (default: the component GUID namespace)
    #[arg(long)]
    namespace: Option<String>,
  },

  /// Show the tables of an output document
  Inspect {
    /// Output document (JSON)
    file: PathBuf,

    /// Print the rows of this table
    #[arg(short, long)]
    table: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let load_config = || BindConfig::load_or_default(cli.config.as_deref());

  match cli.command {
    Commands::Media { file, output, json } => cmd::cmd_media(&file, output.as_deref(), &load_config()?, json),
    Commands::Transform { file, out_dir, json } => cmd::cmd_transform(&file, &out_dir, &load_config()?, json),
    Commands::Chain { file, json } => cmd::cmd_chain(&file, &load_config()?, json),
    Commands::Guid { input, namespace } => cmd::cmd_guid(&input, namespace.as_deref()),
    Commands::Inspect { file, table, json } => cmd::cmd_inspect(&file, table.as_deref(), json),
  }
}
