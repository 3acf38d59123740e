use cardpacks_lib::practice::{Card, CardType, PackKind, SessionView};

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn card_type_label(card_type: CardType) -> &'static str {
    match card_type {
        CardType::Qa => "Q&A",
        CardType::Cloze => "cloze",
        CardType::Tf => "true/false",
    }
}

/// Render one side of a card
pub fn render_card(card: &Card, reveal: bool, use_color: bool) -> String {
    let mut lines = vec![
        paint(&format!("[{}]", card_type_label(card.card_type)), Color::GRAY, use_color),
        paint(&card.front, Color::BOLD, use_color),
    ];
    if reveal {
        lines.push(paint(&format!("  -> {}", card.back), Color::CYAN, use_color));
    }
    lines.join("\n")
}

/// Render the session view shown after every action
pub fn render_view(view: &SessionView, reveal: bool, use_color: bool) -> String {
    let mut lines = Vec::new();

    lines.push(paint(&view.title, Color::BOLD, use_color));
    lines.push(format!(
        "{} left  |  {}  |  {} {}",
        view.remaining,
        render_tally(view, use_color),
        paint("source:", Color::DIM, use_color),
        render_pack_bar(view)
    ));

    if let Some(card) = &view.current_card {
        lines.push(String::new());
        let favorite = if view.favorited { " *" } else { "" };
        lines.push(format!("{}{}", render_card(card, reveal, use_color), favorite));
    } else if view.show_archived_hint {
        lines.push(String::new());
        lines.push(
            "Round saved to packs. Pick a pack with `p <pack>` to keep practicing.".to_string(),
        );
    } else if view.show_done_overlay {
        lines.push(String::new());
        lines.push("No more cards. `r` to restart, `s` to save to packs.".to_string());
    }

    lines.join("\n")
}

fn render_tally(view: &SessionView, use_color: bool) -> String {
    format!(
        "{} {} {}",
        paint(&format!("x{}", view.counts.red), Color::RED, use_color),
        paint(&format!("~{}", view.counts.yellow), Color::YELLOW, use_color),
        paint(&format!("+{}", view.counts.green), Color::GREEN, use_color)
    )
}

fn render_pack_bar(view: &SessionView) -> String {
    let packs: Vec<String> = PackKind::ALL
        .iter()
        .map(|&pack| {
            let marker = if pack == view.selected_pack { ">" } else { "" };
            format!("{}{}({})", marker, pack, view.pack_counts.get(pack))
        })
        .collect();

    let lock = if view.pack_switch_disabled { " [locked]" } else { "" };
    format!("{}{}", packs.join(" "), lock)
}
