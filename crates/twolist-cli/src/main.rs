//! twolist - Work and Travel to-do lists from the command line
//!
//! Reads and writes the same store as the terminal UI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "twolist")]
#[command(about = "Work and Travel to-do lists")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the stored lists
    #[arg(long, global = true, env = "TWOLIST_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file to use
    #[arg(long, global = true, env = "TWOLIST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add an item
    Add {
        /// Item text
        #[arg(required = true)]
        text: Vec<String>,

        /// List to add to (work, travel); defaults to the selected one
        #[arg(short, long)]
        mode: Option<String>,
    },

    /// List items
    List {
        /// List to show (work, travel); defaults to the selected one
        #[arg(short, long)]
        mode: Option<String>,

        /// Show both lists
        #[arg(short, long)]
        all: bool,
    },

    /// Show item details
    Show {
        /// Item ID
        id: String,
    },

    /// Toggle an item's done state
    Done {
        /// Item ID
        id: String,
    },

    /// Rename an item
    Edit {
        /// Item ID
        id: String,

        /// New text
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Delete an item
    Rm {
        /// Item ID
        id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show or switch the selected list
    Mode {
        /// work or travel
        mode: Option<String>,
    },

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print config file and data directory locations
    Path,
    /// Reset to default configuration
    Reset,
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let ctx = commands::Context::load(cli.config, cli.data_dir)?;

    match cli.command {
        Commands::Add { text, mode } => commands::add(&ctx, &text.join(" "), mode, cli.json),
        Commands::List { mode, all } => commands::list(&ctx, mode, all, cli.json),
        Commands::Show { id } => commands::show(&ctx, &id, cli.json),
        Commands::Done { id } => commands::done(&ctx, &id, cli.json),
        Commands::Edit { id, text } => commands::edit(&ctx, &id, &text.join(" "), cli.json),
        Commands::Rm { id, yes } => commands::rm(&ctx, &id, yes, cli.json),
        Commands::Mode { mode } => commands::mode(&ctx, mode, cli.json),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(&ctx, cli.json),
            Some(ConfigCommands::Path) => commands::config_path(&ctx, cli.json),
            Some(ConfigCommands::Reset) => commands::config_reset(&ctx),
        },
    }
}
