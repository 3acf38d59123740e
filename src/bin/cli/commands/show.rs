use anyhow::Result;
use chrono::{DateTime, Local, Utc};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(app: &App, pack_name: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let pack = App::parse_pack(pack_name)?;
    let store = app.load_pack_store()?;
    let entries = store.entries(pack);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(entries)?);
        }
        OutputFormat::Plain => {
            if entries.is_empty() {
                println!("The {} pack is empty.", pack);
                return Ok(());
            }

            let front_width = entries
                .iter()
                .map(|e| e.card.front.chars().count())
                .max()
                .unwrap_or(5)
                .clamp(5, 50);
            let type_width = 10;

            if use_color {
                println!("{}{}{}", Color::BOLD, pack.label(), Color::RESET);
            } else {
                println!("{}", pack.label());
            }
            println!(
                "{:<fw$} {:<tw$} {}",
                "Front",
                "Type",
                "Added",
                fw = front_width,
                tw = type_width
            );
            println!(
                "{} {} {}",
                "\u{2500}".repeat(front_width),
                "\u{2500}".repeat(type_width),
                "\u{2500}".repeat(16)
            );

            for entry in entries {
                let front = if entry.card.front.chars().count() > front_width {
                    let cut: String = entry.card.front.chars().take(front_width - 3).collect();
                    format!("{}...", cut)
                } else {
                    entry.card.front.clone()
                };

                let added = DateTime::<Utc>::from_timestamp_millis(entry.added_at)
                    .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());

                println!(
                    "{:<fw$} {:<tw$} {}",
                    front,
                    terminal::card_type_label(entry.card.card_type),
                    added,
                    fw = front_width,
                    tw = type_width
                );
            }

            println!("\n{} cards total", entries.len());
        }
    }

    Ok(())
}
