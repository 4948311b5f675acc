mod commands;
mod config;
mod file_remote;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    init, mkdir, move_nodes, rename, rm, show, InitArgs, MkdirArgs, MoveArgs, RenameArgs, RmArgs,
    ShowArgs,
};
use config::Config;
use tracing_subscriber::EnvFilter;

/// Casebundle CLI - arrange the documents of a case bundle
#[derive(Parser, Debug)]
#[command(name = "casebundle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new bundle in the current directory
    Init(InitArgs),

    /// Print the bundle tree
    Show(ShowArgs),

    /// Move or reorder nodes
    Move(MoveArgs),

    /// Create a folder
    Mkdir(MkdirArgs),

    /// Rename a file or folder
    Rename(RenameArgs),

    /// Delete files or folders
    Rm(RmArgs),
}

fn init_logging(cwd: &str) {
    let level = Config::load(cwd)
        .map(|config| config.log_level)
        .unwrap_or_else(|_| "warn".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    init_logging(&cwd);

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd).await,
        Command::Show(args) => show(args, &cwd).await,
        Command::Move(args) => move_nodes(args, &cwd).await,
        Command::Mkdir(args) => mkdir(args, &cwd).await,
        Command::Rename(args) => rename(args, &cwd).await,
        Command::Rm(args) => rm(args, &cwd).await,
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
