use anyhow::Result;

use cardpacks_lib::practice::{draw_cards, now_millis};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

/// Print a round drawn from a pack without touching any session
pub fn run(app: &App, pack_name: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let pack = App::parse_pack(pack_name)?;
    let store = app.load_pack_store()?;
    let mut rng = rand::thread_rng();
    let cards = draw_cards(store.entries(pack), app.config.draw_size, now_millis(), &mut rng);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("Nothing to draw: the {} pack is empty.", pack);
                return Ok(());
            }
            for (i, card) in cards.iter().enumerate() {
                let rendered = terminal::render_card(card, true, use_color);
                println!("{:>2}. {}", i + 1, rendered.replace('\n', "\n    "));
            }
        }
    }

    Ok(())
}
