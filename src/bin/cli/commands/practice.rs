use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};

use cardpacks_lib::practice::{PackKind, PackSelection, Quality, SessionView};
use cardpacks_lib::storage::PersistOutcome;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

const HELP: &str = "\
1 / 2 / 3   don't know / fuzzy / known
v           reveal the answer
f           toggle favorite
d           delete card permanently
r           restart round
s           save round to packs
p <pack>    practice from a pack (favorite, fuzzy, mastered)
q           quit";

/// One line of user input
#[derive(Debug, PartialEq)]
enum Input {
    Mark(Quality),
    Reveal,
    Favorite,
    Delete,
    Restart,
    Save,
    Pack(PackKind),
    Help,
    Quit,
}

fn parse_input(line: &str) -> std::result::Result<Input, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Err("Type h for help".to_string());
    };

    match cmd {
        "1" | "2" | "3" => {
            let value: u8 = cmd.parse().map_err(|_| format!("Unknown command '{}'", cmd))?;
            Ok(Input::Mark(Quality::try_from(value)?))
        }
        "v" => Ok(Input::Reveal),
        "f" => Ok(Input::Favorite),
        "d" => Ok(Input::Delete),
        "r" => Ok(Input::Restart),
        "s" => Ok(Input::Save),
        "p" => {
            let name = parts.next().ok_or("Usage: p <favorite|fuzzy|mastered>")?;
            Ok(Input::Pack(name.parse()?))
        }
        "h" | "?" => Ok(Input::Help),
        "q" => Ok(Input::Quit),
        other => Err(format!("Unknown command '{}'. Type h for help", other)),
    }
}

pub fn run(
    app: &App,
    deck_path: &Path,
    session: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = App::load_deck(deck_path)?;
    let session_id = match session {
        Some(id) => id.to_string(),
        None => deck_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("Deck path has no file name; pass --session")?,
    };

    let mut registry = app.registry()?;
    let mut view = registry.open(&session_id, &deck);
    let mut reveal = false;
    print_view(&view, reveal, format, use_color)?;

    let stdin = io::stdin();
    loop {
        if let Some(text) = prompt(format) {
            print!("{}", text);
            io::stdout().flush()?;
        }

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(message) => {
                notice(format, &message);
                continue;
            }
        };

        let mut persisted = None;
        match input {
            Input::Quit => break,
            Input::Help => {
                notice(format, HELP);
                continue;
            }
            Input::Reveal => {
                reveal = true;
            }
            Input::Mark(quality) => {
                let outcome = registry.mark_quality(&session_id, quality)?;
                view = outcome.view;
                reveal = false;
            }
            Input::Favorite => {
                let outcome = registry.toggle_favorite(&session_id)?;
                view = outcome.view;
                persisted = outcome.persisted;
            }
            Input::Delete => {
                let outcome = registry.delete_card(&session_id)?;
                if let Some(id) = &outcome.result {
                    notice(format, &format!("Deleted {}", id));
                }
                view = outcome.view;
                persisted = outcome.persisted;
                reveal = false;
            }
            Input::Restart => {
                let outcome = registry.restart(&session_id)?;
                if !outcome.result {
                    notice(format, "Nothing to restart.");
                }
                view = outcome.view;
                reveal = false;
            }
            Input::Save => {
                let outcome = registry.save_round_to_packs(&session_id)?;
                let filed = &outcome.result;
                notice(
                    format,
                    &format!("Filed {} fuzzy and {} mastered cards.", filed.fuzzy, filed.mastered),
                );
                view = outcome.view;
                persisted = outcome.persisted;
            }
            Input::Pack(pack) => {
                let outcome = registry.select_pack(&session_id, pack)?;
                let message = match outcome.result {
                    PackSelection::Locked => {
                        "Finish or restart the round before switching packs.".to_string()
                    }
                    PackSelection::Empty => format!("The {} pack is empty.", pack),
                    PackSelection::Drawn(n) => format!("Drew {} cards from {}.", n, pack.label()),
                };
                notice(format, &message);
                view = outcome.view;
                reveal = false;
            }
        }

        if let Some(PersistOutcome::Failed { error }) = &persisted {
            eprintln!("warning: changes kept for this run but not saved: {}", error);
        }
        print_view(&view, reveal, format, use_color)?;
    }

    Ok(())
}

fn prompt(format: &OutputFormat) -> Option<&'static str> {
    match format {
        OutputFormat::Plain => Some("> "),
        OutputFormat::Json => None,
    }
}

/// Status text; goes to stderr in JSON mode so stdout carries only views
fn notice(format: &OutputFormat, message: &str) {
    match format {
        OutputFormat::Plain => println!("{}", message),
        OutputFormat::Json => eprintln!("{}", message),
    }
}

fn print_view(
    view: &SessionView,
    reveal: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(view)?),
        OutputFormat::Plain => println!("\n{}\n", terminal::render_view(view, reveal, use_color)),
    }
    Ok(())
}
