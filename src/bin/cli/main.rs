mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cardpacks-cli", about = "Practice flashcards and manage card packs", version)]
struct Cli {
    /// Use a specific data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Show pack sizes and deleted cards
    Packs,

    /// List the cards in a pack
    Show {
        /// Pack name (favorite, fuzzy, mastered)
        pack: String,
    },

    /// Practice a deck interactively
    Practice {
        /// Deck JSON file: {"topic": "...", "cards": [...]}
        deck: PathBuf,
        /// Session id (defaults to the deck file name)
        #[arg(long)]
        session: Option<String>,
    },

    /// Preview a round drawn from a pack
    Draw {
        /// Pack name (favorite, fuzzy, mastered)
        pack: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.data_dir)?;

    match cli.command {
        Command::Packs => {
            commands::packs::run(&app, &cli.format)?;
        }
        Command::Show { pack } => {
            commands::show::run(&app, &pack, &cli.format, use_color)?;
        }
        Command::Practice { deck, session } => {
            commands::practice::run(&app, &deck, session.as_deref(), &cli.format, use_color)?;
        }
        Command::Draw { pack } => {
            commands::draw::run(&app, &pack, &cli.format, use_color)?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}
