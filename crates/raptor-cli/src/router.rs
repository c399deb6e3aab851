// Command routing and dispatch

use crate::commands::*;
use crate::error::CliResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// raptor - model scaffolding with rollback
#[derive(Parser, Debug)]
#[command(name = "raptor")]
#[command(bin_name = "raptor")]
#[command(about = "Scaffold models for a raptor project and roll changes back")]
#[command(
    long_about = "raptor: model scaffolding for SQLite-backed projects.\n\nEvery change to a model is recorded so it can be rolled back.\n\nQuick Start:\n  • raptor add-model users   Create src/models/users.js\n  • raptor migrate           Create tables for new models\n  • raptor history           Show what can be rolled back\n  • raptor rollback          Undo a recorded change"
)]
#[command(version)]
#[command(author = "raptor contributors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project root (default: current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Add a model definition file
    #[command(alias = "addModel")]
    #[command(about = "Create src/models/<NAME> from the model template")]
    AddModel {
        /// Model name
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Rename a model file and its table
    #[command(alias = "renameModel")]
    #[command(about = "Rename a model file and its table")]
    RenameModel {
        /// Current model name
        #[arg(value_name = "OLD")]
        old_name: String,

        /// New model name
        #[arg(value_name = "NEW")]
        new_name: String,
    },

    /// Delete a model file and drop its table
    #[command(alias = "deleteModel")]
    #[command(about = "Delete a model file and drop its table, keeping its rows for rollback")]
    DeleteModel {
        /// Model name
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Create tables for models that have none
    #[command(about = "Create tables for every model that has no table yet")]
    Migrate,

    /// Show the rollback log
    #[command(about = "List recorded changes, newest first")]
    History {
        /// Remove every recorded change
        #[arg(long)]
        clear: bool,
    },

    /// Undo a recorded change
    #[command(about = "Choose a recorded change and undo it")]
    Rollback,
}

/// Route and execute commands
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to appropriate handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();

        // Initialize logging based on CLI flags
        crate::logging::init_logging(cli.verbose, cli.quiet);

        Self::execute(&cli).await
    }

    /// Execute a command
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        let root = cli.project.clone();
        match &cli.command {
            Commands::AddModel { name } => AddModelCommand::new(root, name.clone()).execute().await,
            Commands::RenameModel { old_name, new_name } => {
                RenameModelCommand::new(root, old_name.clone(), new_name.clone())
                    .execute()
                    .await
            }
            Commands::DeleteModel { name } => DeleteModelCommand::new(root, name.clone()).execute().await,
            Commands::Migrate => MigrateCommand::new(root).execute().await,
            Commands::History { clear } => HistoryCommand::new(root, *clear).execute().await,
            Commands::Rollback => RollbackCommand::new(root).execute().await,
        }
    }
}
