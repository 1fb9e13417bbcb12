mod cmd;
mod output;
mod prompts;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::*;

/// levain - recipe-driven developer environment installer
#[derive(Parser)]
#[command(name = "levain")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Levain home directory (default: $LEVAIN_HOME or ~/.levain)
  #[arg(long, global = true, value_name = "DIR")]
  levain_home: Option<PathBuf>,

  /// Extra local recipes directory (overrides LEVAIN_RECIPES_DIR and the config)
  #[arg(long, global = true, value_name = "DIR")]
  recipes_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List available recipes
  List {
    /// Only list installed recipes
    #[arg(long)]
    installed: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show details of a recipe
  Info {
    name: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show the installation order for recipes without installing
  Plan {
    #[arg(required = true)]
    names: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Print the dependency tree of a recipe
  Tree { name: String },

  /// Install recipes and their dependencies
  Install {
    #[arg(required = true)]
    names: Vec<String>,

    /// Reinstall the named recipes even if already installed
    #[arg(short, long)]
    force: bool,

    /// Show what would be installed without running anything
    #[arg(long)]
    dry_run: bool,
  },

  /// Remove recipes from the registry
  Remove {
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    names: Vec<String>,

    /// Remove every installed recipe
    #[arg(long)]
    all: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
  },

  /// Manage configured recipe repositories
  Repo {
    #[command(subcommand)]
    command: RepoCommands,
  },
}

#[derive(Subcommand)]
enum RepoCommands {
  /// List repositories in precedence order
  List {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Add a repository (directory, git URL, zip archive or HTTP URL)
  Add {
    uri: String,

    /// Display name for the repository
    #[arg(long)]
    name: Option<String>,
  },

  /// Remove a repository by URI or name
  Remove { uri_or_name: String },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let session = Session::load(cli.levain_home, cli.recipes_dir)?;

  match cli.command {
    Commands::List { installed, json } => cmd_list(&session, installed, json),
    Commands::Info { name, json } => cmd_info(&session, &name, json),
    Commands::Plan { names, json } => cmd_plan(&session, &names, json),
    Commands::Tree { name } => cmd_tree(&session, &name),
    Commands::Install { names, force, dry_run } => cmd_install(&session, &names, force, dry_run),
    Commands::Remove { names, all, yes } => cmd_remove(&session, &names, all, yes),
    Commands::Repo { command } => match command {
      RepoCommands::List { json } => cmd_repo_list(&session, json),
      RepoCommands::Add { uri, name } => cmd_repo_add(&session, &uri, name),
      RepoCommands::Remove { uri_or_name } => cmd_repo_remove(&session, &uri_or_name),
    },
  }
}
